//! The environment boundary for network configuration
//!
//! All process-environment reads happen in [`EnvConfig::from_env`], once per
//! invocation. Everything downstream works off the resulting snapshot, so
//! endpoint resolution stays a pure function.

use std::{collections::HashMap, env};

use crate::registry::Network;

/// The environment variable holding the deployer's signing key
const PRIVATE_KEY_VAR: &str = "PRIVATE_KEY";

/// The environment variable holding the API key for the generic templated
/// endpoint
const API_KEY_VAR: &str = "INFURA_API_KEY";

/// A snapshot of the deployment-relevant process environment
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    /// API key for the generic templated endpoint, if supplied
    pub api_key: Option<String>,
    /// The deployer's signing key, if supplied
    pub private_key: Option<String>,
    /// Per-network RPC URL overrides, keyed by network
    pub overrides: HashMap<Network, String>,
}

impl EnvConfig {
    /// Read the environment once, dropping empty values so a blank variable
    /// fails loudly later instead of silently connecting nowhere
    pub fn from_env() -> Self {
        let mut overrides = HashMap::new();
        for network in Network::ALL {
            if let Some(var) = network.override_var() {
                if let Some(url) = non_empty_var(var) {
                    overrides.insert(network, url);
                }
            }
        }

        Self {
            api_key: non_empty_var(API_KEY_VAR),
            private_key: non_empty_var(PRIVATE_KEY_VAR),
            overrides,
        }
    }
}

/// Read an environment variable, treating unset and empty identically
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}
