//! Type definitions shared with the deployment scripts

use crate::registry::Network;

/// A fully-resolved deployment target
///
/// Built once per invocation by [`crate::registry::resolve`] and read-only
/// afterwards. The `rpc_url` is non-empty by construction; an empty
/// `signing_keys` list means no signer is available and must block any
/// state-changing call downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    /// The symbolic network this descriptor was resolved for
    pub network: Network,
    /// The chain id declared for the network in the registry
    pub chain_id: u64,
    /// The RPC endpoint to connect to
    pub rpc_url: String,
    /// Signing keys for the deployer, in priority order
    pub signing_keys: Vec<String>,
}
