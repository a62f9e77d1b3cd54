//! Definitions of errors that can occur while resolving network configuration

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use crate::registry::Network;

/// Errors that can occur while resolving a network into a usable endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The given name is not in the network registry
    UnknownNetwork(String),
    /// Neither an override URL nor the generic templated endpoint can
    /// produce a usable RPC URL for the network
    MissingEndpoint(Network),
}

impl Display for ChainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::UnknownNetwork(name) => {
                write!(f, "unknown network: {}", name)
            }
            ChainError::MissingEndpoint(network) => match network.override_var() {
                Some(var) => write!(
                    f,
                    "no RPC endpoint configured for {}: set {} or provide an API key",
                    network, var
                ),
                None => write!(
                    f,
                    "no RPC endpoint configured for {}: provide an API key",
                    network
                ),
            },
        }
    }
}

impl Error for ChainError {}
