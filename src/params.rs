//! Protocol parameters: chain-wide tunables (§3 glossary, §6 "Environment").
//!
//! Mirrors the teacher's `configuration::Config` pattern: a `serde`-derived
//! struct with a sensible `Default` and a `load_from_file`/`validate` pair.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Coin;

/// Fee coefficients, deposits, size limits, and epoch bounds that
/// parameterize the `UTXO`/`UTXOW`/`DELEGS` rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Linear fee coefficient (`a` in `minfee = a*size + b`).
    pub min_fee_a: u64,
    /// Constant fee coefficient (`b`).
    pub min_fee_b: u64,
    /// Deposit charged for registering a stake credential.
    pub key_deposit: Coin,
    /// Deposit charged for registering a genuinely new stake pool.
    pub pool_deposit: Coin,
    /// Minimum base-asset amount any output may carry.
    pub min_utxo_value: Coin,
    /// Minimum declared cost for a stake pool.
    pub min_pool_cost: Coin,
    /// Maximum number of epochs in the future a pool retirement may target.
    pub e_max: u64,
    /// Maximum serialized transaction size in bytes.
    pub max_tx_size: usize,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        ProtocolParams {
            min_fee_a: 1,
            min_fee_b: 1,
            key_deposit: 100,
            pool_deposit: 250,
            min_utxo_value: 100,
            min_pool_cost: 100,
            e_max: 18,
            max_tx_size: 16_384,
        }
    }
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("failed to read protocol parameters file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse protocol parameters: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("protocol parameters failed validation")]
    Invalid,
}

impl ProtocolParams {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParamsError> {
        let content = fs::read_to_string(path)?;
        let params: ProtocolParams = serde_json::from_str(&content)?;
        if !params.validate() {
            return Err(ParamsError::Invalid);
        }
        Ok(params)
    }

    /// `minfee = a*size + b` (§4.F item 4).
    pub fn min_fee(&self, tx_size: usize) -> Coin {
        self.min_fee_a * tx_size as u64 + self.min_fee_b
    }

    pub fn validate(&self) -> bool {
        self.max_tx_size > 0 && self.e_max > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_validate() {
        assert!(ProtocolParams::default().validate());
    }

    #[test]
    fn min_fee_is_affine() {
        let params = ProtocolParams {
            min_fee_a: 1,
            min_fee_b: 1,
            ..ProtocolParams::default()
        };
        assert_eq!(params.min_fee(200), 201);
    }

    #[test]
    fn load_from_file_round_trips() {
        let dir = std::env::temp_dir().join(format!("pparams-test-{:?}", std::thread::current().id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("params.json");
        std::fs::write(&path, serde_json::to_string(&ProtocolParams::default()).unwrap()).unwrap();
        let loaded = ProtocolParams::load_from_file(&path).unwrap();
        assert_eq!(loaded, ProtocolParams::default());
    }
}
