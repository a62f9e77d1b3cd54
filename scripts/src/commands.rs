//! Implementations of the various deploy scripts

use std::{path::Path, str::FromStr, sync::Arc};

use ethers::{providers::Middleware, types::Address};

use crate::{
    artifacts::Artifact,
    cli::{DeployArgs, DeployRawArgs, UpgradeArgs},
    constants::PROXY_ARTIFACT_NAME,
    deployer::{Deployer, EthersClient},
    errors::ScriptError,
    utils::{initializer_calldata, write_deployment_record, write_raw_deployment},
};

/// Deploy a contract behind a fresh ERC-1967 proxy and run its initializer
pub async fn deploy(
    args: DeployArgs,
    client: Arc<impl Middleware>,
    artifacts_dir: &Path,
    deployments_path: &str,
) -> Result<(), ScriptError> {
    let implementation = Artifact::load(artifacts_dir, &args.contract.to_string())?;
    let proxy = Artifact::load(artifacts_dir, PROXY_ARTIFACT_NAME)?;
    let init_calldata = initializer_calldata(&implementation.abi, &args.init_args)?;

    let deployer = Deployer::new(EthersClient::new(client));
    let record = deployer
        .deploy_new(args.contract, &implementation, &proxy, init_calldata)
        .await?;

    println!("Logic Proxy Contract deployed to : {:#x}", record.proxy_address);
    println!(
        "Logic Contract implementation address is : {:#x}",
        record.implementation_address
    );

    write_deployment_record(deployments_path, &record)
}

/// Deploy a contract directly, with no proxy in front of it
pub async fn deploy_raw(
    args: DeployRawArgs,
    client: Arc<impl Middleware>,
    artifacts_dir: &Path,
    deployments_path: &str,
) -> Result<(), ScriptError> {
    let artifact = Artifact::load(artifacts_dir, &args.contract.to_string())?;

    let deployer = Deployer::new(EthersClient::new(client));
    let address = deployer.deploy_raw(args.contract, &artifact).await?;

    println!("Contract deployed to : {:#x}", address);

    write_raw_deployment(deployments_path, &args.contract.to_string(), address)
}

/// Deploy a new implementation and repoint an existing proxy at it
pub async fn upgrade(
    args: UpgradeArgs,
    client: Arc<impl Middleware>,
    artifacts_dir: &Path,
    deployments_path: &str,
) -> Result<(), ScriptError> {
    let proxy_address = Address::from_str(&args.proxy)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
    let implementation = Artifact::load(artifacts_dir, &args.contract.to_string())?;

    let deployer = Deployer::new(EthersClient::new(client));
    let record = deployer
        .upgrade_existing(args.contract, proxy_address, &implementation)
        .await?;

    println!("Logic Proxy Contract deployed to : {:#x}", record.proxy_address);
    println!(
        "Logic Contract implementation address is : {:#x}",
        record.implementation_address
    );

    write_deployment_record(deployments_path, &record)
}
