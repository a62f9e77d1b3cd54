//! The proxy deployment and upgrade state machines
//!
//! Both lifecycle operations are driven against the [`ChainClient`] seam so
//! the sequencing rules can be exercised without a live chain. The rules
//! themselves are structural: each phase carries the addresses the next
//! step is allowed to use, so a proxy can never be created before its
//! implementation exists, and no upgrade path can reach an initializer.

use std::{fmt, str::FromStr, sync::Arc};

use ethers::{
    abi::Token,
    contract::ContractFactory,
    providers::Middleware,
    types::{Address, TransactionRequest, H256, U64},
};
use tracing::info;

use crate::{
    artifacts::Artifact,
    constants::{
        IMPLEMENTATION_STORAGE_SLOT, NUM_BYTES_ADDRESS, NUM_BYTES_STORAGE_SLOT,
        NUM_DEPLOY_CONFIRMATIONS,
    },
    errors::ScriptError,
    solidity::upgrade_calldata,
    types::{DeploymentRecord, StarContract},
};

/// The on-chain operations the state machines need
///
/// Implementations submit each operation and wait for inclusion before
/// returning; the machines never run two operations concurrently.
#[allow(async_fn_in_trait)]
pub trait ChainClient {
    /// Deploy a contract from its artifact, returning the deployed address
    async fn deploy_contract(
        &self,
        artifact: &Artifact,
        constructor_args: Vec<Token>,
    ) -> Result<Address, ScriptError>;

    /// Send a transaction carrying `calldata` to `to` and wait for it to be
    /// mined, failing on revert
    async fn send_transaction(&self, to: Address, calldata: Vec<u8>) -> Result<(), ScriptError>;

    /// Read a raw storage slot of an account
    async fn get_storage(&self, address: Address, slot: H256) -> Result<H256, ScriptError>;
}

/// The phases of a fresh proxied deployment, in the only order they may
/// occur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployPhase {
    /// Nothing exists on chain yet
    Nonexistent,
    /// The implementation contract holds code
    ImplementationDeployed {
        /// The implementation address
        implementation: Address,
    },
    /// The proxy exists and points at the implementation, but has not been
    /// initialized
    ProxyDeployed {
        /// The implementation address
        implementation: Address,
        /// The proxy address
        proxy: Address,
    },
    /// Terminal: the proxy is initialized and ready
    Initialized {
        /// The implementation address
        implementation: Address,
        /// The proxy address
        proxy: Address,
    },
}

impl fmt::Display for DeployPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployPhase::Nonexistent => write!(f, "nonexistent"),
            DeployPhase::ImplementationDeployed { .. } => write!(f, "implementation-deployed"),
            DeployPhase::ProxyDeployed { .. } => write!(f, "proxy-deployed"),
            DeployPhase::Initialized { .. } => write!(f, "initialized"),
        }
    }
}

/// The phases of an upgrade of an existing proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradePhase {
    /// The proxy was verified to be an initialized ERC-1967 proxy
    Ready {
        /// The proxy address
        proxy: Address,
    },
    /// The new implementation holds code; the proxy still points at the old
    /// one
    NewImplementationDeployed {
        /// The proxy address
        proxy: Address,
        /// The new implementation address
        implementation: Address,
    },
    /// Terminal: the proxy points at the new implementation
    Repointed {
        /// The proxy address
        proxy: Address,
        /// The new implementation address
        implementation: Address,
    },
}

impl fmt::Display for UpgradePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpgradePhase::Ready { .. } => write!(f, "ready"),
            UpgradePhase::NewImplementationDeployed { .. } => {
                write!(f, "new-implementation-deployed")
            }
            UpgradePhase::Repointed { .. } => write!(f, "repointed"),
        }
    }
}

/// Drives proxied deployments and upgrades against a [`ChainClient`]
pub struct Deployer<C> {
    /// The chain client effects are submitted through
    client: C,
}

impl<C: ChainClient> Deployer<C> {
    /// Wrap a chain client
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Deploy `contract` behind a fresh ERC-1967 proxy and run its one-time
    /// initializer
    ///
    /// The implementation is deployed first, then the proxy, then the
    /// initializer call; a proxy must never reference an address that does
    /// not yet hold code. On an initializer revert both addresses are
    /// surfaced so the operator can recover manually; nothing is retried.
    pub async fn deploy_new(
        &self,
        contract: StarContract,
        implementation_artifact: &Artifact,
        proxy_artifact: &Artifact,
        init_calldata: Vec<u8>,
    ) -> Result<DeploymentRecord, ScriptError> {
        let phase = DeployPhase::Nonexistent;
        info!(contract = %contract, phase = %phase, "deploying implementation contract");

        let implementation = self
            .client
            .deploy_contract(implementation_artifact, vec![])
            .await?;
        let phase = DeployPhase::ImplementationDeployed { implementation };
        info!(contract = %contract, phase = %phase, implementation = %format!("{implementation:#x}"), "deploying proxy");

        // The proxy constructor takes the implementation address and an
        // optional delegatecall payload; the initializer is sent as its own
        // transaction below so that a revert leaves the proxy address known.
        let proxy = self
            .client
            .deploy_contract(
                proxy_artifact,
                vec![Token::Address(implementation), Token::Bytes(vec![])],
            )
            .await
            .map_err(|e| {
                ScriptError::ContractDeployment(format!(
                    "proxy deployment failed, implementation left at {:#x}: {}",
                    implementation, e
                ))
            })?;
        let phase = DeployPhase::ProxyDeployed {
            implementation,
            proxy,
        };
        info!(contract = %contract, phase = %phase, proxy = %format!("{proxy:#x}"), "running initializer");

        self.client
            .send_transaction(proxy, init_calldata)
            .await
            .map_err(|e| ScriptError::InitializationFailed {
                proxy,
                implementation,
                reason: e.to_string(),
            })?;
        let phase = DeployPhase::Initialized {
            implementation,
            proxy,
        };
        info!(contract = %contract, phase = %phase, "deployment complete");

        Ok(DeploymentRecord {
            contract,
            proxy_address: proxy,
            implementation_address: implementation,
        })
    }

    /// Deploy `contract` directly, with no proxy and no initializer
    pub async fn deploy_raw(
        &self,
        contract: StarContract,
        artifact: &Artifact,
    ) -> Result<Address, ScriptError> {
        info!(contract = %contract, "deploying contract without proxy");
        self.client.deploy_contract(artifact, vec![]).await
    }

    /// Deploy a new implementation of `contract` and repoint the proxy at
    /// `proxy_address` to it
    ///
    /// The initializer is never invoked on this path: the proxy's storage
    /// already holds initialized state. The target is checked to be an
    /// ERC-1967 proxy before anything is deployed.
    pub async fn upgrade_existing(
        &self,
        contract: StarContract,
        proxy_address: Address,
        implementation_artifact: &Artifact,
    ) -> Result<DeploymentRecord, ScriptError> {
        let current = self
            .client
            .get_storage(proxy_address, implementation_slot())
            .await?;
        if current == H256::zero() {
            return Err(ScriptError::UpgradeFailed {
                implementation: None,
                reason: format!(
                    "{:#x} has no implementation slot set and is not an ERC-1967 proxy",
                    proxy_address
                ),
            });
        }
        let phase = UpgradePhase::Ready {
            proxy: proxy_address,
        };
        info!(contract = %contract, phase = %phase, "deploying new implementation");

        let implementation = self
            .client
            .deploy_contract(implementation_artifact, vec![])
            .await?;
        let phase = UpgradePhase::NewImplementationDeployed {
            proxy: proxy_address,
            implementation,
        };
        info!(contract = %contract, phase = %phase, implementation = %format!("{implementation:#x}"), "repointing proxy");

        self.client
            .send_transaction(proxy_address, upgrade_calldata(implementation))
            .await
            .map_err(|e| {
                let reason = e.to_string();
                if is_authorization_revert(&reason) {
                    ScriptError::Unauthorized(reason)
                } else {
                    ScriptError::UpgradeFailed {
                        implementation: Some(implementation),
                        reason,
                    }
                }
            })?;
        let phase = UpgradePhase::Repointed {
            proxy: proxy_address,
            implementation,
        };
        info!(contract = %contract, phase = %phase, "upgrade complete");

        // Report the implementation the proxy actually records, not the one
        // we expect it to record
        let slot_value = self
            .client
            .get_storage(proxy_address, implementation_slot())
            .await?;
        let implementation_address = Address::from_slice(
            &slot_value.as_bytes()[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..],
        );

        Ok(DeploymentRecord {
            contract,
            proxy_address,
            implementation_address,
        })
    }
}

/// The EIP-1967 implementation slot as an `H256`
fn implementation_slot() -> H256 {
    // Can `unwrap` here since we know the storage slot constitutes a valid H256
    H256::from_str(IMPLEMENTATION_STORAGE_SLOT).unwrap()
}

/// Whether a revert reason reads as an access-control rejection rather than
/// a mechanical upgrade failure
fn is_authorization_revert(reason: &str) -> bool {
    let reason = reason.to_lowercase();
    reason.contains("caller is not the owner")
        || reason.contains("unauthorized")
        || reason.contains("missing role")
}

/// A [`ChainClient`] backed by an ethers middleware stack
pub struct EthersClient<M> {
    /// The signer-equipped middleware transactions go through
    client: Arc<M>,
}

impl<M> EthersClient<M> {
    /// Wrap a middleware stack
    pub fn new(client: Arc<M>) -> Self {
        Self { client }
    }
}

impl<M: Middleware> ChainClient for EthersClient<M> {
    async fn deploy_contract(
        &self,
        artifact: &Artifact,
        constructor_args: Vec<Token>,
    ) -> Result<Address, ScriptError> {
        let factory = ContractFactory::new(
            artifact.abi.clone(),
            artifact.bytecode.clone(),
            self.client.clone(),
        );

        let contract = factory
            .deploy_tokens(constructor_args)
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?
            .confirmations(NUM_DEPLOY_CONFIRMATIONS)
            .send()
            .await
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

        Ok(contract.address())
    }

    async fn send_transaction(&self, to: Address, calldata: Vec<u8>) -> Result<(), ScriptError> {
        let tx = TransactionRequest::new().to(to).data(calldata);

        let receipt = self
            .client
            .send_transaction(tx, None /* block */)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
            .confirmations(NUM_DEPLOY_CONFIRMATIONS)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        match receipt {
            Some(receipt) if receipt.status == Some(U64::one()) => Ok(()),
            Some(receipt) => Err(ScriptError::ContractInteraction(format!(
                "transaction {:#x} reverted",
                receipt.transaction_hash
            ))),
            None => Err(ScriptError::ContractInteraction(
                "transaction dropped from the mempool".to_string(),
            )),
        }
    }

    async fn get_storage(&self, address: Address, slot: H256) -> Result<H256, ScriptError> {
        self.client
            .get_storage_at(address, slot, None /* block */)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::missing_docs_in_private_items)]

    use std::{
        cell::{Cell, RefCell},
        collections::HashMap,
    };

    use ethers::abi::Abi;

    use super::*;
    use crate::{
        solidity::{decode_upgrade_calldata, upgrade_selector},
        utils::initializer_calldata,
    };

    /// Widen an address to the right-aligned slot value an ERC-1967 proxy
    /// stores it as
    fn slot_value(address: Address) -> H256 {
        let mut bytes = [0u8; NUM_BYTES_STORAGE_SLOT];
        bytes[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..].copy_from_slice(address.as_bytes());
        H256::from(bytes)
    }

    /// A minimal ABI carrying an `initialize(address)` entry point
    const INIT_ABI: &str = r#"[
        {
            "type": "function",
            "name": "initialize",
            "stateMutability": "nonpayable",
            "inputs": [{ "name": "owner", "type": "address" }],
            "outputs": []
        }
    ]"#;

    /// What the mock observed, in submission order
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum ChainOp {
        Deploy(String),
        Transact { to: Address, calldata: Vec<u8> },
    }

    /// Which operation the mock should fail on
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum FailPoint {
        None,
        Transact,
    }

    /// A recording chain that hands out sequential addresses
    struct MockChain {
        ops: RefCell<Vec<ChainOp>>,
        storage: RefCell<HashMap<(Address, H256), H256>>,
        next_address: Cell<u64>,
        fail_on: FailPoint,
        revert_reason: &'static str,
    }

    impl MockChain {
        fn new() -> Self {
            Self {
                ops: RefCell::new(vec![]),
                storage: RefCell::new(HashMap::new()),
                next_address: Cell::new(0x1000),
                fail_on: FailPoint::None,
                revert_reason: "execution reverted",
            }
        }

        fn failing_transactions(reason: &'static str) -> Self {
            Self {
                fail_on: FailPoint::Transact,
                revert_reason: reason,
                ..Self::new()
            }
        }

        /// Mark an address as an initialized ERC-1967 proxy
        fn seed_proxy(&self, proxy: Address, implementation: Address) {
            self.storage
                .borrow_mut()
                .insert((proxy, implementation_slot()), slot_value(implementation));
        }

        fn ops(&self) -> Vec<ChainOp> {
            self.ops.borrow().clone()
        }

        fn initializer_transactions(&self, selector: [u8; 4]) -> usize {
            self.ops()
                .iter()
                .filter(|op| {
                    matches!(op, ChainOp::Transact { calldata, .. } if calldata.starts_with(&selector))
                })
                .count()
        }
    }

    impl ChainClient for MockChain {
        async fn deploy_contract(
            &self,
            artifact: &Artifact,
            _constructor_args: Vec<Token>,
        ) -> Result<Address, ScriptError> {
            self.ops
                .borrow_mut()
                .push(ChainOp::Deploy(artifact.name.clone()));
            let address = Address::from_low_u64_be(self.next_address.get());
            self.next_address.set(self.next_address.get() + 1);
            Ok(address)
        }

        async fn send_transaction(
            &self,
            to: Address,
            calldata: Vec<u8>,
        ) -> Result<(), ScriptError> {
            self.ops.borrow_mut().push(ChainOp::Transact {
                to,
                calldata: calldata.clone(),
            });

            if self.fail_on == FailPoint::Transact {
                return Err(ScriptError::ContractInteraction(
                    self.revert_reason.to_string(),
                ));
            }

            // Honor upgrade transactions so the repointed slot can be read
            // back afterwards
            if let Some(implementation) = decode_upgrade_calldata(&calldata) {
                self.storage
                    .borrow_mut()
                    .insert((to, implementation_slot()), slot_value(implementation));
            }
            Ok(())
        }

        async fn get_storage(&self, address: Address, slot: H256) -> Result<H256, ScriptError> {
            Ok(self
                .storage
                .borrow()
                .get(&(address, slot))
                .copied()
                .unwrap_or_else(H256::zero))
        }
    }

    fn test_artifact(name: &str) -> Artifact {
        Artifact {
            name: name.to_string(),
            abi: serde_json::from_str::<Abi>(INIT_ABI).unwrap(),
            bytecode: vec![0x60, 0x80].into(),
        }
    }

    fn init_selector(artifact: &Artifact) -> [u8; 4] {
        artifact.abi.function("initialize").unwrap().short_signature()
    }

    fn owner_arg() -> Vec<String> {
        vec!["0x06dD375c70A2BAa3Ce9bB36ceAb33B734F913585".to_string()]
    }

    #[tokio::test]
    async fn implementation_is_deployed_before_the_proxy() {
        let chain = MockChain::new();
        let implementation = test_artifact("StarNFT");
        let proxy = test_artifact("ERC1967Proxy");
        let calldata = initializer_calldata(&implementation.abi, &owner_arg()).unwrap();

        let deployer = Deployer::new(chain);
        let record = deployer
            .deploy_new(StarContract::StarNft, &implementation, &proxy, calldata)
            .await
            .unwrap();

        let ops = deployer.client.ops();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0], ChainOp::Deploy("StarNFT".to_string()));
        assert_eq!(ops[1], ChainOp::Deploy("ERC1967Proxy".to_string()));
        assert!(matches!(&ops[2], ChainOp::Transact { to, .. } if *to == record.proxy_address));

        assert_ne!(record.proxy_address, record.implementation_address);
        assert_ne!(record.proxy_address, Address::zero());
        assert_ne!(record.implementation_address, Address::zero());
    }

    #[tokio::test]
    async fn initializer_runs_exactly_once_per_deploy() {
        let chain = MockChain::new();
        let implementation = test_artifact("RewardSplitterFactory");
        let proxy = test_artifact("ERC1967Proxy");
        let selector = init_selector(&implementation);
        let calldata = initializer_calldata(&implementation.abi, &owner_arg()).unwrap();

        let deployer = Deployer::new(chain);
        deployer
            .deploy_new(
                StarContract::RewardSplitterFactory,
                &implementation,
                &proxy,
                calldata,
            )
            .await
            .unwrap();

        assert_eq!(deployer.client.initializer_transactions(selector), 1);
    }

    #[tokio::test]
    async fn repeated_deploys_produce_independent_proxies() {
        let chain = MockChain::new();
        let implementation = test_artifact("RewardSplitterFactory");
        let proxy = test_artifact("ERC1967Proxy");
        let calldata = initializer_calldata(&implementation.abi, &owner_arg()).unwrap();

        let deployer = Deployer::new(chain);
        let first = deployer
            .deploy_new(
                StarContract::RewardSplitterFactory,
                &implementation,
                &proxy,
                calldata.clone(),
            )
            .await
            .unwrap();
        let second = deployer
            .deploy_new(
                StarContract::RewardSplitterFactory,
                &implementation,
                &proxy,
                calldata,
            )
            .await
            .unwrap();

        assert_ne!(first.proxy_address, second.proxy_address);
        assert_ne!(first.implementation_address, second.implementation_address);
    }

    #[tokio::test]
    async fn initializer_revert_surfaces_both_addresses() {
        let chain = MockChain::failing_transactions("execution reverted: bad owner");
        let implementation = test_artifact("StarClaim");
        let proxy = test_artifact("ERC1967Proxy");
        let calldata = initializer_calldata(&implementation.abi, &owner_arg()).unwrap();

        let deployer = Deployer::new(chain);
        let err = deployer
            .deploy_new(StarContract::StarClaim, &implementation, &proxy, calldata)
            .await
            .unwrap_err();

        match err {
            ScriptError::InitializationFailed {
                proxy,
                implementation,
                reason,
            } => {
                assert_ne!(proxy, Address::zero());
                assert_ne!(implementation, Address::zero());
                assert_ne!(proxy, implementation);
                assert!(reason.contains("bad owner"));
            }
            other => panic!("expected InitializationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn upgrade_never_touches_an_initializer() {
        let chain = MockChain::new();
        let proxy_address = Address::from_low_u64_be(0xaaaa);
        chain.seed_proxy(proxy_address, Address::from_low_u64_be(0xbbbb));
        let implementation = test_artifact("StarNFT");
        let selector = init_selector(&implementation);

        let deployer = Deployer::new(chain);
        let record = deployer
            .upgrade_existing(StarContract::StarNft, proxy_address, &implementation)
            .await
            .unwrap();

        assert_eq!(deployer.client.initializer_transactions(selector), 0);
        let ops = deployer.client.ops();
        assert!(ops.iter().any(|op| {
            matches!(op, ChainOp::Transact { to, calldata }
                if *to == proxy_address && calldata.starts_with(&upgrade_selector()))
        }));

        // The stable address survives; the implementation behind it moved
        assert_eq!(record.proxy_address, proxy_address);
        assert_eq!(
            record.implementation_address,
            Address::from_low_u64_be(0x1000)
        );
    }

    #[tokio::test]
    async fn upgrade_rejects_a_target_without_an_implementation_slot() {
        let chain = MockChain::new();
        let not_a_proxy = Address::from_low_u64_be(0xcccc);
        let implementation = test_artifact("StarNFT");

        let deployer = Deployer::new(chain);
        let err = deployer
            .upgrade_existing(StarContract::StarNft, not_a_proxy, &implementation)
            .await
            .unwrap_err();

        match err {
            ScriptError::UpgradeFailed {
                implementation,
                reason,
            } => {
                assert!(implementation.is_none());
                assert!(reason.contains("not an ERC-1967 proxy"));
            }
            other => panic!("expected UpgradeFailed, got {other:?}"),
        }

        // Nothing was deployed for a target that can never be upgraded
        assert!(deployer.client.ops().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_upgrade_is_classified() {
        let chain =
            MockChain::failing_transactions("execution reverted: Ownable: caller is not the owner");
        let proxy_address = Address::from_low_u64_be(0xaaaa);
        chain.seed_proxy(proxy_address, Address::from_low_u64_be(0xbbbb));
        let implementation = test_artifact("StarExchange");

        let deployer = Deployer::new(chain);
        let err = deployer
            .upgrade_existing(StarContract::StarExchange, proxy_address, &implementation)
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn raw_deploys_submit_no_transactions() {
        let chain = MockChain::new();
        let artifact = test_artifact("SToken");

        let deployer = Deployer::new(chain);
        let address = deployer
            .deploy_raw(StarContract::SToken, &artifact)
            .await
            .unwrap();

        assert_ne!(address, Address::zero());
        assert_eq!(
            deployer.client.ops(),
            vec![ChainOp::Deploy("SToken".to_string())]
        );
    }
}
