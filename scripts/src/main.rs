use chains::{env::EnvConfig, registry};
use clap::Parser;
use scripts::{cli::Cli, errors::ScriptError, utils::setup_client};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let Cli {
        network,
        artifacts,
        deployments_path,
        command,
    } = Cli::parse();

    tracing_subscriber::fmt().pretty().init();

    let env_config = EnvConfig::from_env();
    let descriptor = registry::resolve(network, &env_config)?;
    let client = setup_client(&descriptor)?;

    command.run(client, &artifacts, &deployments_path).await
}
