//! Definitions of errors that can occur during deployment of the contracts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use chains::errors::ChainError;
use ethers::types::Address;

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug)]
pub enum ScriptError {
    /// The requested network name is not in the registry
    UnknownNetwork(String),
    /// No RPC endpoint could be resolved for the requested network
    MissingEndpoint(String),
    /// No signing key is available; nothing state-changing is attempted
    NoSigningCredentials,
    /// Error parsing a compiled contract artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// The one-time initializer reverted after the proxy was deployed,
    /// leaving the proxy unusable; both addresses are reported for manual
    /// recovery
    InitializationFailed {
        /// The proxy whose initializer reverted
        proxy: Address,
        /// The implementation the proxy points at
        implementation: Address,
        /// The underlying revert reason
        reason: String,
    },
    /// The upgrade could not be completed; the new implementation address
    /// is reported when it was already deployed
    UpgradeFailed {
        /// The new implementation, if its deployment had already succeeded
        implementation: Option<Address>,
        /// The underlying failure reason
        reason: String,
    },
    /// The caller lacks upgrade authority over the proxy
    Unauthorized(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// Error reading a local file
    ReadFile(String),
    /// Error writing a local file
    WriteFile(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::UnknownNetwork(name) => write!(f, "unknown network: {}", name),
            ScriptError::MissingEndpoint(s) => write!(f, "no RPC endpoint resolved: {}", s),
            ScriptError::NoSigningCredentials => {
                write!(f, "no signing key available, set PRIVATE_KEY")
            }
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ClientInitialization(s) => {
                write!(f, "error initializing client: {}", s)
            }
            ScriptError::CalldataConstruction(s) => {
                write!(f, "error constructing calldata: {}", s)
            }
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::InitializationFailed {
                proxy,
                implementation,
                reason,
            } => write!(
                f,
                "initializer reverted on proxy {:#x} (implementation {:#x}): {}",
                proxy, implementation, reason
            ),
            ScriptError::UpgradeFailed {
                implementation: Some(implementation),
                reason,
            } => write!(
                f,
                "upgrade failed (new implementation deployed at {:#x}): {}",
                implementation, reason
            ),
            ScriptError::UpgradeFailed {
                implementation: None,
                reason,
            } => write!(f, "upgrade failed: {}", reason),
            ScriptError::Unauthorized(s) => {
                write!(f, "caller lacks upgrade authority: {}", s)
            }
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::ReadFile(s) => write!(f, "error reading file: {}", s),
            ScriptError::WriteFile(s) => write!(f, "error writing file: {}", s),
        }
    }
}

impl Error for ScriptError {}

impl From<ChainError> for ScriptError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::UnknownNetwork(name) => ScriptError::UnknownNetwork(name),
            ChainError::MissingEndpoint(_) => ScriptError::MissingEndpoint(err.to_string()),
        }
    }
}
