//! Utilities for the deploy scripts.

use std::{fs, path::PathBuf, str::FromStr, sync::Arc};

use chains::types::NetworkDescriptor;
use ethers::{
    abi::{
        token::{LenientTokenizer, Tokenizer},
        Abi, Token,
    },
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::Address,
};
use json::JsonValue;

use crate::{
    constants::{DEPLOYMENTS_KEY, IMPLEMENTATION_KEY, INITIALIZER_FN_NAME, PROXY_KEY},
    errors::ScriptError,
    types::DeploymentRecord,
};

/// Connect a signer to the resolved network
///
/// Rejects a descriptor with no signing keys before any network traffic.
/// The wallet is bound to the descriptor's declared chain id, so a
/// transaction signed here is invalid on any chain other than the one the
/// registry declares (EIP-155).
pub fn setup_client(
    descriptor: &NetworkDescriptor,
) -> Result<Arc<impl Middleware>, ScriptError> {
    let key = descriptor
        .signing_keys
        .first()
        .ok_or(ScriptError::NoSigningCredentials)?;

    let provider = Provider::<Http>::try_from(descriptor.rpc_url.as_str())
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    let wallet = LocalWallet::from_str(key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    Ok(Arc::new(SignerMiddleware::new(
        provider,
        wallet.with_chain_id(descriptor.chain_id),
    )))
}

/// Prepare calldata for a contract's one-time `initialize` method from
/// string-form arguments, in ABI order
pub fn initializer_calldata(abi: &Abi, args: &[String]) -> Result<Vec<u8>, ScriptError> {
    let initializer = abi.function(INITIALIZER_FN_NAME).map_err(|e| {
        ScriptError::CalldataConstruction(format!("contract has no initializer: {}", e))
    })?;

    if initializer.inputs.len() != args.len() {
        return Err(ScriptError::CalldataConstruction(format!(
            "initializer takes {} arguments, {} provided",
            initializer.inputs.len(),
            args.len()
        )));
    }

    let tokens = initializer
        .inputs
        .iter()
        .zip(args.iter())
        .map(|(param, value)| LenientTokenizer::tokenize(&param.kind, value))
        .collect::<Result<Vec<Token>, _>>()
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;

    initializer
        .encode_input(&tokens)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// Read and parse a JSON file
pub fn get_json_from_file(file_path: &str) -> Result<JsonValue, ScriptError> {
    let contents =
        fs::read_to_string(file_path).map_err(|e| ScriptError::ReadFile(e.to_string()))?;

    json::parse(&contents).map_err(|e| ScriptError::ReadFile(e.to_string()))
}

/// Record a proxied deployment or upgrade in the deployments file
pub fn write_deployment_record(
    file_path: &str,
    record: &DeploymentRecord,
) -> Result<(), ScriptError> {
    let contract_key = record.contract.to_string();

    update_deployments_file(file_path, |deployments| {
        deployments[contract_key.as_str()][PROXY_KEY] =
            JsonValue::String(format!("{:#x}", record.proxy_address));
        deployments[contract_key.as_str()][IMPLEMENTATION_KEY] =
            JsonValue::String(format!("{:#x}", record.implementation_address));
    })
}

/// Record a plain, unproxied deployment in the deployments file
pub fn write_raw_deployment(
    file_path: &str,
    contract_key: &str,
    address: Address,
) -> Result<(), ScriptError> {
    update_deployments_file(file_path, |deployments| {
        deployments[contract_key][IMPLEMENTATION_KEY] =
            JsonValue::String(format!("{:#x}", address));
    })
}

/// Apply an edit to the deployments section of the deployments file,
/// creating the file if it does not exist yet
fn update_deployments_file(
    file_path: &str,
    edit: impl FnOnce(&mut JsonValue),
) -> Result<(), ScriptError> {
    // If the file doesn't exist, create it
    if !PathBuf::from(file_path).exists() {
        fs::write(file_path, "{}").map_err(|e| ScriptError::WriteFile(e.to_string()))?;
    }

    let mut parsed_json = get_json_from_file(file_path)?;
    edit(&mut parsed_json[DEPLOYMENTS_KEY]);

    fs::write(file_path, json::stringify_pretty(parsed_json, 4))
        .map_err(|e| ScriptError::WriteFile(e.to_string()))
}
