//! The static network registry and endpoint resolution
//!
//! The chain id table is the single source of truth for which networks the
//! scripts can target. Chain ids are embedded in every signed transaction
//! (EIP-155), so a descriptor built from this table cannot have its
//! transactions replayed onto, or accepted by, a chain other than the one
//! declared here.

use std::{fmt, str::FromStr};

use tracing::info;

use crate::{env::EnvConfig, errors::ChainError, types::NetworkDescriptor};

/// The networks the scripts can deploy to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// Ethereum mainnet
    Mainnet,
    /// Goerli, Ethereum testnet
    Goerli,
    /// Avalanche C-Chain
    Avalanche,
    /// Fuji, Avalanche testnet
    Fuji,
    /// BNB Smart Chain
    Bsc,
    /// BNB Smart Chain testnet
    Tbsc,
    /// TomoChain
    Tomo,
    /// TomoChain testnet
    Tomot,
    /// Polygon PoS
    Polygon,
    /// Mumbai, Polygon testnet
    Mumbai,
    /// The Wraptag chain
    Wraptag,
}

impl Network {
    /// Every registered network, in registry order
    pub const ALL: [Network; 11] = [
        Network::Mainnet,
        Network::Goerli,
        Network::Avalanche,
        Network::Fuji,
        Network::Bsc,
        Network::Tbsc,
        Network::Tomo,
        Network::Tomot,
        Network::Polygon,
        Network::Mumbai,
        Network::Wraptag,
    ];

    /// The chain id the network identifies itself with
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Goerli => 5,
            Network::Avalanche => 43114,
            Network::Fuji => 43113,
            Network::Bsc => 56,
            Network::Tbsc => 97,
            Network::Tomo => 88,
            Network::Tomot => 89,
            Network::Polygon => 137,
            Network::Mumbai => 80001,
            Network::Wraptag => 24052022,
        }
    }

    /// The environment variable holding a dedicated RPC URL for the
    /// network, for networks that need a non-standard provider
    pub fn override_var(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => None,
            Network::Goerli => Some("GOERLI_URL"),
            Network::Avalanche => Some("AVAX_URL"),
            Network::Fuji => Some("FUJI_URL"),
            Network::Bsc => Some("BSC_URL"),
            Network::Tbsc => Some("BSCT_URL"),
            Network::Tomo => Some("TOMO_URL"),
            Network::Tomot => Some("TOMOT_URL"),
            Network::Polygon => Some("POLYGON"),
            Network::Mumbai => Some("MUMBAI"),
            Network::Wraptag => Some("WRAPTAG_URL"),
        }
    }

    /// Whether the generic templated endpoint serves this network
    ///
    /// Only the Ethereum networks are reachable through the shared provider;
    /// every other chain needs its override variable set.
    fn template_hosted(&self) -> bool {
        matches!(self, Network::Mainnet | Network::Goerli)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Goerli => write!(f, "goerli"),
            Network::Avalanche => write!(f, "avalanche"),
            Network::Fuji => write!(f, "fuji"),
            Network::Bsc => write!(f, "bsc"),
            Network::Tbsc => write!(f, "tbsc"),
            Network::Tomo => write!(f, "tomo"),
            Network::Tomot => write!(f, "tomot"),
            Network::Polygon => write!(f, "polygon"),
            Network::Mumbai => write!(f, "mumbai"),
            Network::Wraptag => write!(f, "wraptag"),
        }
    }
}

impl FromStr for Network {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "goerli" => Ok(Network::Goerli),
            "avalanche" => Ok(Network::Avalanche),
            "fuji" => Ok(Network::Fuji),
            "bsc" => Ok(Network::Bsc),
            "tbsc" => Ok(Network::Tbsc),
            "tomo" => Ok(Network::Tomo),
            "tomot" => Ok(Network::Tomot),
            "polygon" => Ok(Network::Polygon),
            "mumbai" => Ok(Network::Mumbai),
            "wraptag" => Ok(Network::Wraptag),
            other => Err(ChainError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Build the [`NetworkDescriptor`] for the given network from an environment
/// snapshot
///
/// Pure in the snapshot: no environment access happens here. An absent
/// signing key yields an empty credential list, which deployment rejects
/// before submitting anything.
pub fn resolve(network: Network, env: &EnvConfig) -> Result<NetworkDescriptor, ChainError> {
    let rpc_url = endpoint_url(network, env)?;
    info!(network = %network, chain_id = network.chain_id(), "resolved network endpoint");

    Ok(NetworkDescriptor {
        network,
        chain_id: network.chain_id(),
        rpc_url,
        signing_keys: env.private_key.iter().cloned().collect(),
    })
}

/// Select the RPC URL for a network: a per-network override when one was
/// supplied, otherwise the generic templated endpoint for networks the
/// shared provider hosts
///
/// Never returns an empty URL.
fn endpoint_url(network: Network, env: &EnvConfig) -> Result<String, ChainError> {
    if let Some(url) = env.overrides.get(&network) {
        return Ok(url.clone());
    }

    if network.template_hosted() {
        if let Some(key) = env.api_key.as_deref() {
            return Ok(format!("https://{}.infura.io/v3/{}", network, key));
        }
    }

    Err(ChainError::MissingEndpoint(network))
}
