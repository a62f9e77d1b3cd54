//! Definitions of CLI arguments and commands for deploy scripts

use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use chains::registry::Network;
use clap::{Args, Parser, Subcommand};
use ethers::providers::Middleware;

use crate::{
    commands::{deploy, deploy_raw, upgrade},
    constants::{DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_PATH},
    errors::ScriptError,
    types::StarContract,
};

/// Deploy and upgrade the Star proxy contracts
#[derive(Parser)]
pub struct Cli {
    /// Name of the network to run against
    #[arg(short, long, value_parser = Network::from_str)]
    pub network: Network,

    /// Directory containing the compiled contract artifacts
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    /// Path to the deployments record file
    #[arg(long, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments_path: String,

    /// The action to run
    #[command(subcommand)]
    pub command: Command,
}

/// The lifecycle operations the scripts support, one per process run
#[derive(Subcommand)]
pub enum Command {
    /// Deploy a contract behind a fresh upgradeable proxy and initialize it
    Deploy(DeployArgs),
    /// Deploy a contract directly, with no proxy and no initializer
    DeployRaw(DeployRawArgs),
    /// Deploy a new implementation and repoint an existing proxy at it
    Upgrade(UpgradeArgs),
}

/// Deploy a contract behind a fresh ERC-1967 proxy.
///
/// The implementation is deployed first, then the proxy, then the one-time
/// initializer is invoked through the proxy with the given arguments.
#[derive(Args)]
pub struct DeployArgs {
    /// The contract to deploy
    #[arg(short, long)]
    pub contract: StarContract,

    /// Initializer arguments, repeated, in ABI order
    #[arg(short = 'i', long = "init-arg")]
    pub init_args: Vec<String>,
}

/// Deploy a contract with no proxy in front of it
#[derive(Args)]
pub struct DeployRawArgs {
    /// The contract to deploy
    #[arg(short, long)]
    pub contract: StarContract,
}

/// Upgrade the implementation behind an existing proxy.
///
/// The proxy address stays stable; only the implementation it delegates to
/// changes. No initializer is invoked.
#[derive(Args)]
pub struct UpgradeArgs {
    /// The contract to deploy the new implementation of
    #[arg(short, long)]
    pub contract: StarContract,

    /// Address of the existing proxy, in hex
    #[arg(short, long)]
    pub proxy: String,
}

impl Command {
    /// Dispatch the selected command
    pub async fn run(
        self,
        client: Arc<impl Middleware>,
        artifacts_dir: &Path,
        deployments_path: &str,
    ) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => deploy(args, client, artifacts_dir, deployments_path).await,
            Command::DeployRaw(args) => {
                deploy_raw(args, client, artifacts_dir, deployments_path).await
            }
            Command::Upgrade(args) => upgrade(args, client, artifacts_dir, deployments_path).await,
        }
    }
}
