//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use clap::ValueEnum;
use ethers::types::Address;

/// The Star contracts the scripts can deploy or upgrade
///
/// The display form is the Solidity contract name, which doubles as the
/// artifact file name and the key in the deployments file.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum StarContract {
    /// The Star NFT collection contract
    StarNft,
    /// The claim contract for Star rewards
    StarClaim,
    /// The Star exchange contract
    StarExchange,
    /// The store NFT contract
    StoreNft,
    /// The S token contract (plain, not proxied)
    SToken,
    /// A single reward splitter instance (plain, not proxied)
    RewardSplitter,
    /// The factory producing reward splitters
    RewardSplitterFactory,
}

impl Display for StarContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StarContract::StarNft => write!(f, "StarNFT"),
            StarContract::StarClaim => write!(f, "StarClaim"),
            StarContract::StarExchange => write!(f, "StarExchange"),
            StarContract::StoreNft => write!(f, "StoreNFT"),
            StarContract::SToken => write!(f, "SToken"),
            StarContract::RewardSplitter => write!(f, "RewardSplitter"),
            StarContract::RewardSplitterFactory => write!(f, "RewardSplitterFactory"),
        }
    }
}

/// The outcome of a proxied deployment or an upgrade
///
/// `proxy_address` is the stable address external callers hold on to; it
/// never changes across upgrades. `implementation_address` is the logic
/// contract currently behind the proxy and changes on every upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentRecord {
    /// Which contract was deployed or upgraded
    pub contract: StarContract,
    /// The stable, externally-referenced proxy address
    pub proxy_address: Address,
    /// The logic contract currently behind the proxy
    pub implementation_address: Address,
}
