//! Credential and address model (§4.B, §3).
//!
//! A [`Credential`] is the atomic authorization token the ledger reasons
//! about: either a verification-key hash or a script hash. [`Address`]
//! combines a payment credential with an optional staking reference, tagged
//! with the network the address belongs to (§4.B, §3).

use serde::{Deserialize, Serialize};

/// 28-byte BLAKE2b-224 hash of a verification key or script, matching the
/// digest width the real Cardano ledger uses for credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash28(pub [u8; 28]);

/// Authorization token: either a key hash or a script hash. Which variant a
/// given credential is determines whether it is discharged by a witnessing
/// signature (§4.D) or a script (§4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Credential {
    KeyHash(Hash28),
    ScriptHash(Hash28),
}

impl Credential {
    pub fn key_hash(&self) -> Option<Hash28> {
        match self {
            Credential::KeyHash(h) => Some(*h),
            Credential::ScriptHash(_) => None,
        }
    }

    pub fn script_hash(&self) -> Option<Hash28> {
        match self {
            Credential::ScriptHash(h) => Some(*h),
            Credential::KeyHash(_) => None,
        }
    }
}

/// Staking reference carried by an address: a base credential, a pointer
/// into chain history (slot, tx index, cert index), or none (bootstrap /
/// enterprise addresses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StakeReference {
    Base(Credential),
    Pointer {
        slot: u64,
        tx_index: u32,
        cert_index: u32,
    },
    None,
}

/// Network discriminant carried by every address (§4.F precondition 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
}

/// A Shelley-style address: network tag, payment credential, staking
/// reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub network: Network,
    pub payment: Credential,
    pub staking: StakeReference,
}

impl Address {
    pub fn new(network: Network, payment: Credential, staking: StakeReference) -> Self {
        Address {
            network,
            payment,
            staking,
        }
    }

    /// The staking credential used for certificate/withdrawal bookkeeping,
    /// if this address carries one directly (base addresses only; pointer
    /// and none addresses have no usable staking credential here).
    pub fn staking_credential(&self) -> Option<Credential> {
        match self.staking {
            StakeReference::Base(c) => Some(c),
            _ => None,
        }
    }
}

/// A reward account: a network tag plus the staking credential that controls
/// it. Distinct from `Address` because reward accounts never carry payment
/// credentials or appear as UTxO entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RewardAccount {
    pub network: Network,
    pub credential: Credential,
}
