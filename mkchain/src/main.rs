//! mkchain - Helm values for bootstrapping a Tezos test network
//!
//! Derives a vanity genesis chain id, provisions the bootstrap account keys
//! and writes two values files: one with secret keys for the chain's
//! originator and one with public keys only, for inviting peers.

mod bootstrap;
mod config;
mod container;
mod error;
mod genesis;
mod keys;
mod values;
mod writer;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

use crate::bootstrap::Bootstrap;
use crate::config::{Config, KeygenBackend};
use crate::container::LazyRunner;
use crate::error::Result;
use crate::genesis::{ChainIdSource, FixedChainId, FlextesaVanity};
use crate::keys::{ContainerKeyProvisioner, KeyProvisioner, LocalKeyProvisioner};
use crate::values::ChainSettings;
use crate::writer::ValuesWriter;

/// Version written into the zerotier and rpc-auth image tags
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "mkchain")]
#[command(author, version, about = "Generate helm values for use with the tezos-chain helm chart", long_about = None)]
struct Cli {
    /// Name of your chain
    chain_name: String,

    /// Number of peers in the cluster
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    number_of_nodes: i64,

    /// Zerotier network id for external chain access
    #[arg(long)]
    zerotier_network: Option<String>,

    /// Zerotier token for external chain access
    #[arg(long)]
    zerotier_token: Option<String>,

    /// Peer ip to join
    #[arg(long)]
    bootstrap_peer: Option<String>,

    /// Version of the Tezos docker image [default: tezos/tezos:v7-release]
    #[arg(long)]
    docker_image: Option<String>,

    /// Should spin up an RPC authentication server
    #[arg(long)]
    rpc_auth: bool,

    /// Where bootstrap account keys come from
    #[arg(long, value_enum)]
    keygen: Option<KeygenBackend>,

    /// Use this genesis chain id instead of running a vanity search
    #[arg(long, value_name = "CHAIN_ID")]
    chain_id: Option<String>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for the generated values files
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Validate before touching config, containers or the filesystem
    let settings = ChainSettings::new(
        cli.chain_name,
        cli.number_of_nodes,
        cli.zerotier_network,
        cli.zerotier_token,
        cli.bootstrap_peer,
        cli.rpc_auth,
    )?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(image) = cli.docker_image {
        config.images.tezos = image;
    }
    let keygen = cli.keygen.unwrap_or(config.keygen);
    let output_dir = cli.output_dir.unwrap_or_else(|| config.output_dir());

    info!("mkchain v{} - chain {}", VERSION, settings.chain_name);
    debug!("Configuration: {:?}", config);

    let images = config.images.resolve(VERSION);
    let runner = LazyRunner::new(config.container_runtime.clone());

    let chain_ids: Box<dyn ChainIdSource + '_> = match cli.chain_id {
        Some(id) => Box::new(FixedChainId(id)),
        None => Box::new(FlextesaVanity::new(
            &runner,
            config.images.flextesa.clone(),
            config.genesis.vanity_prefix.clone(),
            config.genesis.seed_length,
        )),
    };

    let keys: Box<dyn KeyProvisioner + '_> = match keygen {
        KeygenBackend::Docker => Box::new(ContainerKeyProvisioner::new(
            &runner,
            config.images.tezos.clone(),
            config.keygen_client.clone(),
        )),
        KeygenBackend::Local => Box::new(LocalKeyProvisioner),
    };

    let bootstrap = Bootstrap {
        chain_ids: chain_ids.as_ref(),
        keys: keys.as_ref(),
        progress: spinner(),
    };
    let documents = bootstrap.generate(&settings, &images)?;

    let written = ValuesWriter::new(&output_dir).write(&settings.chain_name, &documents)?;
    info!("Creation values: {}", written.creation.display());
    info!("Invitation values: {}", written.invitation.display());

    Ok(())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
