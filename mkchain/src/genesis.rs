//! Genesis chain id derivation

use crate::container::ContainerRunner;
use crate::error::{MkchainError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::info;

const SEED_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Genesis section of the values files
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Genesis {
    pub genesis_chain_id: String,
    pub bootstrap_timestamp: String,
}

impl Genesis {
    pub fn new(chain_id: impl Into<String>, bootstrapped_at: DateTime<Utc>) -> Self {
        Self {
            genesis_chain_id: chain_id.into(),
            bootstrap_timestamp: bootstrapped_at.to_rfc3339_opts(SecondsFormat::Micros, false),
        }
    }
}

/// Produces the genesis chain id
pub trait ChainIdSource {
    fn chain_id(&self) -> Result<String>;
}

/// A chain id supplied up front
pub struct FixedChainId(pub String);

impl ChainIdSource for FixedChainId {
    fn chain_id(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Vanity search with `flextesa vani`
pub struct FlextesaVanity<'a> {
    runner: &'a dyn ContainerRunner,
    image: String,
    prefix: String,
    seed_length: usize,
}

impl<'a> FlextesaVanity<'a> {
    pub fn new(
        runner: &'a dyn ContainerRunner,
        image: impl Into<String>,
        prefix: impl Into<String>,
        seed_length: usize,
    ) -> Self {
        Self {
            runner,
            image: image.into(),
            prefix: prefix.into(),
            seed_length,
        }
    }

    fn search(&self, seed: &str) -> Result<String> {
        let args = [
            "vani",
            self.prefix.as_str(),
            "--seed",
            seed,
            "--first",
            "--machine-readable",
            "csv",
        ]
        .map(String::from);

        let output = self.runner.run(&self.image, "flextesa", &args)?;
        parse_vanity_csv(&output)
    }
}

impl ChainIdSource for FlextesaVanity<'_> {
    fn chain_id(&self) -> Result<String> {
        let seed = random_seed(&mut rand::thread_rng(), self.seed_length);
        info!("Searching for a vanity chain id (seed {})", seed);
        self.search(&seed)
    }
}

/// Uppercase letters and digits
pub fn random_seed<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| SEED_ALPHABET[rng.gen_range(0..SEED_ALPHABET.len())] as char)
        .collect()
}

/// Second column of the machine-readable search result
pub fn parse_vanity_csv(output: &str) -> Result<String> {
    let chain_id = output
        .split(',')
        .nth(1)
        .map(str::trim)
        .ok_or_else(|| {
            MkchainError::output_format(
                "vanity chain id search",
                format!("expected comma-separated output, got {:?}", output.trim()),
            )
        })?;

    if chain_id.is_empty() {
        return Err(MkchainError::output_format(
            "vanity chain id search",
            "chain id column is empty",
        ));
    }

    Ok(chain_id.to_string())
}
