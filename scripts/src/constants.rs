//! Constants used in the deploy scripts

/// The storage slot containing the implementation contract address in an
/// ERC-1967 proxy.
///
/// This is specified in EIP-1967: <https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address>
pub const IMPLEMENTATION_STORAGE_SLOT: &str =
    "0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc";

/// The number of confirmations to wait for deployment and upgrade
/// transactions
pub const NUM_DEPLOY_CONFIRMATIONS: usize = 0;

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The artifact name of the ERC-1967 proxy contract the deploy scripts put
/// in front of every upgradeable implementation
pub const PROXY_ARTIFACT_NAME: &str = "ERC1967Proxy";

/// The name of the one-time initializer entry point on the proxied
/// contracts
pub const INITIALIZER_FN_NAME: &str = "initialize";

/// The top-level key under which deployed addresses are recorded in the
/// deployments file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// The key under which a proxy address is recorded for a contract
pub const PROXY_KEY: &str = "proxy";

/// The key under which an implementation address is recorded for a contract
pub const IMPLEMENTATION_KEY: &str = "implementation";

/// The default path of the deployments record file
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The default directory containing compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
