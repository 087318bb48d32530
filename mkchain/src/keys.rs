//! Bootstrap account key provisioning
//!
//! Keys are carried as base64 of the client's textual key encoding
//! (`edpk...` / `edsk...`), which is what the chart consumes.

use crate::config::{FieldPosition, KeygenClientConfig};
use crate::container::ContainerRunner;
use crate::error::{MkchainError, Result};
use base64::{engine::general_purpose, Engine as _};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Base58check prefix of an Ed25519 public key (`edpk`)
const EDPK_PREFIX: [u8; 4] = [13, 15, 37, 217];

/// Base58check prefix of an Ed25519 seed (`edsk`, 32-byte form)
const EDSK_PREFIX: [u8; 4] = [13, 15, 58, 7];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// base64 of the public key text
    pub public_key: String,
    /// base64 of the secret key text
    pub secret_key: String,
}

impl KeyPair {
    pub fn from_text(public_key: &str, secret_key: &str) -> Self {
        Self {
            public_key: general_purpose::STANDARD.encode(public_key.as_bytes()),
            secret_key: general_purpose::STANDARD.encode(secret_key.as_bytes()),
        }
    }
}

/// Source of fresh keypairs, one per bootstrap account
pub trait KeyProvisioner {
    fn generate(&self) -> Result<KeyPair>;
}

/// Generates keys with the node client inside the tezos image.
pub struct ContainerKeyProvisioner<'a> {
    runner: &'a dyn ContainerRunner,
    image: String,
    client: KeygenClientConfig,
}

impl<'a> ContainerKeyProvisioner<'a> {
    pub fn new(runner: &'a dyn ContainerRunner, image: impl Into<String>, client: KeygenClientConfig) -> Self {
        Self {
            runner,
            image: image.into(),
            client,
        }
    }

    fn script(&self) -> String {
        let c = &self.client;
        format!(
            "{client} --protocol {proto} gen keys {alias} && {client} --protocol {proto} show address {alias} -S",
            client = c.client,
            proto = c.protocol,
            alias = c.alias,
        )
    }
}

impl KeyProvisioner for ContainerKeyProvisioner<'_> {
    fn generate(&self) -> Result<KeyPair> {
        let output = self
            .runner
            .run(&self.image, "sh", &["-c".to_string(), self.script()])?;

        parse_show_address(&output, self.client.public_key, self.client.secret_key)
    }
}

/// Pull the two keys out of `show address -S` output.
///
/// With the client's layout:
///
/// ```text
/// Hash: tz1...
/// Public Key: edpk...
/// Secret Key: unencrypted:edsk...
/// ```
///
/// the defaults (1,1) and (2,2) select `edpk...` and `edsk...`.
pub fn parse_show_address(
    output: &str,
    public_key: FieldPosition,
    secret_key: FieldPosition,
) -> Result<KeyPair> {
    let lines: Vec<&str> = output.split('\n').collect();

    let public = extract_field(&lines, public_key, "public key")?;
    let secret = extract_field(&lines, secret_key, "secret key")?;

    Ok(KeyPair::from_text(public, secret))
}

fn extract_field<'o>(lines: &[&'o str], at: FieldPosition, what: &str) -> Result<&'o str> {
    let line = lines.get(at.line).ok_or_else(|| {
        MkchainError::output_format(
            "key generation",
            format!(
                "{} expected on line {} but output has {} lines",
                what,
                at.line,
                lines.len()
            ),
        )
    })?;

    let field = line.split(':').nth(at.field).map(str::trim).ok_or_else(|| {
        MkchainError::output_format(
            "key generation",
            format!("{} expected in field {} of {:?}", what, at.field, line),
        )
    })?;

    if field.is_empty() {
        return Err(MkchainError::output_format(
            "key generation",
            format!("{} field {} of {:?} is empty", what, at.field, line),
        ));
    }

    Ok(field)
}

/// Generates Ed25519 keys in-process and renders them as the client would.
#[derive(Debug, Default)]
pub struct LocalKeyProvisioner;

impl KeyProvisioner for LocalKeyProvisioner {
    fn generate(&self) -> Result<KeyPair> {
        let signing_key = SigningKey::generate(&mut OsRng);
        Ok(encode_ed25519(&signing_key))
    }
}

fn encode_ed25519(signing_key: &SigningKey) -> KeyPair {
    let public = b58check(&EDPK_PREFIX, signing_key.verifying_key().as_bytes());
    let secret = b58check(&EDSK_PREFIX, &signing_key.to_bytes());
    debug!("Generated local key {}", public);
    KeyPair::from_text(&public, &secret)
}

fn b58check(prefix: &[u8], payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(prefix.len() + payload.len() + 4);
    data.extend_from_slice(prefix);
    data.extend_from_slice(payload);

    let checksum = Sha256::digest(Sha256::digest(&data));
    data.extend_from_slice(&checksum[..4]);

    bs58::encode(data).into_string()
}
