//! Configuration management for mkchain

use crate::error::{MkchainError, Result};
use crate::values::ContainerImages;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_TEZOS_IMAGE: &str = "tezos/tezos:v7-release";
pub const DEFAULT_FLEXTESA_IMAGE: &str = "registry.gitlab.com/tezos/flextesa:01e3f596-run";

/// Where bootstrap account keys come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeygenBackend {
    /// Run the node client inside the tezos image
    Docker,
    /// Generate Ed25519 keys in-process
    Local,
}

/// A `line`/`field` coordinate in colon-delimited client output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldPosition {
    pub line: usize,
    pub field: usize,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Container runtime binary, looked up on PATH
    pub container_runtime: String,

    /// Key provisioner backend
    pub keygen: KeygenBackend,

    /// Directory the values files are written to (None = next to the binary)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    pub images: ImagesConfig,

    pub keygen_client: KeygenClientConfig,

    pub genesis: GenesisConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Node image, used for key generation and written into the values
    pub tezos: String,

    /// Image providing the vanity chain id search
    pub flextesa: String,

    /// Override for the zerotier image (None = derived from our version)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zerotier: Option<String>,

    /// Override for the rpc-auth image (None = derived from our version)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_auth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeygenClientConfig {
    /// Client path inside the tezos image
    pub client: String,

    /// Protocol hash passed with --protocol
    pub protocol: String,

    /// Alias the throwaway key is stored under
    pub alias: String,

    /// Where the public key sits in `show address -S` output
    pub public_key: FieldPosition,

    /// Where the secret key sits in `show address -S` output
    pub secret_key: FieldPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenesisConfig {
    /// Length of the random seed handed to the vanity search
    pub seed_length: usize,

    /// Chain id prefix to search for (empty = first hit)
    pub vanity_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            container_runtime: "docker".into(),
            keygen: KeygenBackend::Docker,
            output_dir: None,
            images: ImagesConfig::default(),
            keygen_client: KeygenClientConfig::default(),
            genesis: GenesisConfig::default(),
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        ImagesConfig {
            tezos: DEFAULT_TEZOS_IMAGE.into(),
            flextesa: DEFAULT_FLEXTESA_IMAGE.into(),
            zerotier: None,
            rpc_auth: None,
        }
    }
}

impl Default for KeygenClientConfig {
    fn default() -> Self {
        KeygenClientConfig {
            client: "/usr/local/bin/tezos-client".into(),
            protocol: "PsDELPH1Kxsx".into(),
            alias: "mykey".into(),
            public_key: FieldPosition { line: 1, field: 1 },
            secret_key: FieldPosition { line: 2, field: 2 },
        }
    }
}

impl Default for GenesisConfig {
    fn default() -> Self {
        GenesisConfig {
            seed_length: 16,
            vanity_prefix: String::new(),
        }
    }
}

impl ImagesConfig {
    /// Resolve the images written into the values files.
    ///
    /// Pre-release and build-metadata versions (and anything that is not
    /// semver) point at locally built `:dev` images.
    pub fn resolve(&self, version: &str) -> ContainerImages {
        let released = semver::Version::parse(version)
            .map(|v| v.pre.is_empty() && v.build.is_empty())
            .unwrap_or(false);

        let tagged = |local: &str, published: &str| {
            if released {
                format!("{}:{}", published, version)
            } else {
                format!("{}:dev", local)
            }
        };

        ContainerImages {
            zerotier_docker_image: self
                .zerotier
                .clone()
                .unwrap_or_else(|| tagged("tezos-zerotier", "tqtezos/tezos-k8s-zerotier")),
            rpc_auth_image: self
                .rpc_auth
                .clone()
                .unwrap_or_else(|| tagged("tezos-rpc-auth", "tqtezos/tezos-k8s-rpc-auth")),
            tezos_docker_image: self.tezos.clone(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("mkchain").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("mkchain.toml"))
    }

    /// Get the default output directory
    pub fn default_output_dir() -> PathBuf {
        // generated-values/ sits beside the directory holding the binary
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                return exe_dir.join("..").join("generated-values");
            }
        }

        PathBuf::from("generated-values")
    }

    /// Load configuration from file, falling back to defaults.
    ///
    /// An explicitly requested file must exist; the default location is optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match config_path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_config_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(MkchainError::Config(format!(
                    "Configuration file {:?} does not exist",
                    path
                )));
            }
            debug!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        info!("Loading configuration from {:?}", path);
        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.genesis.seed_length == 0 {
            return Err(MkchainError::Config(
                "genesis.seed_length must be at least 1".into(),
            ));
        }
        if self.container_runtime.trim().is_empty() {
            return Err(MkchainError::Config("container_runtime is empty".into()));
        }
        Ok(())
    }

    /// Output directory, honouring the config file before the default
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(Self::default_output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.container_runtime, "docker");
        assert_eq!(config.keygen, KeygenBackend::Docker);
        assert_eq!(config.images.tezos, "tezos/tezos:v7-release");
        assert_eq!(config.keygen_client.public_key, FieldPosition { line: 1, field: 1 });
        assert_eq!(config.keygen_client.secret_key, FieldPosition { line: 2, field: 2 });
        assert_eq!(config.genesis.seed_length, 16);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
keygen = "local"

[images]
tezos = "tezos/tezos:v9-release"

[keygen_client]
secret_key = {{ line = 3, field = 1 }}
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.keygen, KeygenBackend::Local);
        assert_eq!(config.images.tezos, "tezos/tezos:v9-release");
        assert_eq!(config.images.flextesa, DEFAULT_FLEXTESA_IMAGE);
        assert_eq!(config.keygen_client.secret_key, FieldPosition { line: 3, field: 1 });
        assert_eq!(config.keygen_client.protocol, "PsDELPH1Kxsx");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "no_such_setting = true").unwrap();

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, MkchainError::TomlDe(_)));
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, MkchainError::Config(_)));
    }

    #[test]
    fn test_zero_seed_length_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[genesis]\nseed_length = 0").unwrap();

        assert!(matches!(
            Config::load(Some(file.path())),
            Err(MkchainError::Config(_))
        ));
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let mut config = Config::default();
        config.output_dir = Some(PathBuf::from("/tmp/values"));
        config.images.rpc_auth = Some("registry.local/rpc-auth:1".into());

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_release_images() {
        let images = ImagesConfig::default().resolve("1.2.3");
        assert_eq!(images.zerotier_docker_image, "tqtezos/tezos-k8s-zerotier:1.2.3");
        assert_eq!(images.rpc_auth_image, "tqtezos/tezos-k8s-rpc-auth:1.2.3");
        assert_eq!(images.tezos_docker_image, DEFAULT_TEZOS_IMAGE);
    }

    #[test]
    fn test_dev_images() {
        for version in ["1.2.3-rc.1", "1.2.3+g1234abc", "not-a-version"] {
            let images = ImagesConfig::default().resolve(version);
            assert_eq!(images.zerotier_docker_image, "tezos-zerotier:dev");
            assert_eq!(images.rpc_auth_image, "tezos-rpc-auth:dev");
        }
    }

    #[test]
    fn test_image_overrides() {
        let images = ImagesConfig {
            zerotier: Some("mirror/zerotier:x".into()),
            ..ImagesConfig::default()
        }
        .resolve("1.0.0");
        assert_eq!(images.zerotier_docker_image, "mirror/zerotier:x");
        assert_eq!(images.rpc_auth_image, "tqtezos/tezos-k8s-rpc-auth:1.0.0");
    }
}
