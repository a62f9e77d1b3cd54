//! Definitions of Solidity functions called during deployment

use alloy_primitives::Address as AlloyAddress;
use alloy_sol_types::{sol, SolCall};
use ethers::types::Address;

sol! {
    function upgradeTo(address newImplementation) external;
}

/// Prepare calldata for a UUPS proxy's `upgradeTo` method
pub fn upgrade_calldata(new_implementation: Address) -> Vec<u8> {
    let new_implementation = AlloyAddress::from_slice(new_implementation.as_bytes());
    upgradeToCall::new((new_implementation,)).abi_encode()
}

/// The 4-byte selector of `upgradeTo(address)`
#[cfg(test)]
pub fn upgrade_selector() -> [u8; 4] {
    upgradeToCall::SELECTOR
}

/// Decode the new implementation address out of `upgradeTo` calldata
#[cfg(test)]
pub fn decode_upgrade_calldata(calldata: &[u8]) -> Option<Address> {
    upgradeToCall::abi_decode(calldata, true)
        .ok()
        .map(|call| Address::from_slice(call.newImplementation.as_slice()))
}
