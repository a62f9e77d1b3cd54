//! Loading of compiled contract artifacts
//!
//! The scripts consume artifacts, they never compile Solidity themselves.
//! An artifact is the standard Hardhat output for one contract: a JSON
//! object carrying at least the ABI and the creation bytecode.

use std::{fs, path::Path};

use ethers::{abi::Abi, types::Bytes};
use serde::Deserialize;

use crate::errors::ScriptError;

/// The fields of a Hardhat artifact file the scripts care about
#[derive(Deserialize)]
struct RawArtifact {
    /// The contract's ABI
    abi: Abi,
    /// The contract's creation bytecode, hex-encoded
    bytecode: Bytes,
}

/// A compiled contract, ready to hand to a factory
#[derive(Debug, Clone)]
pub struct Artifact {
    /// The contract name the artifact was loaded for
    pub name: String,
    /// The contract's ABI
    pub abi: Abi,
    /// The contract's creation bytecode
    pub bytecode: Bytes,
}

impl Artifact {
    /// Load the artifact for `name` from `<dir>/<name>.json`
    pub fn load(dir: &Path, name: &str) -> Result<Self, ScriptError> {
        let path = dir.join(format!("{name}.json"));
        let contents = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ReadFile(format!("{}: {}", path.display(), e)))?;

        let raw: RawArtifact = serde_json::from_str(&contents)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            name: name.to_string(),
            abi: raw.abi,
            bytecode: raw.bytecode,
        })
    }
}
