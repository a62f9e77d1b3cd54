//! Per-network deployment configuration for the Star contracts.
//!
//! Maps a symbolic network name to its chain id and a fully-formed RPC
//! endpoint, and collects signing credentials from the environment. All
//! environment access happens in [`env::EnvConfig::from_env`]; endpoint
//! resolution itself is a pure function of that snapshot.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod env;
pub mod errors;
pub mod registry;
pub mod types;
