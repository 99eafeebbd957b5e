//! Transaction body, canonical identity, and witness set (§3, §4.C, §4.D).
//!
//! `TxId` is the hash of the transaction body's canonical binary encoding.
//! Canonicity falls out of the type definitions rather than a hand-rolled
//! codec: field order is fixed by the struct's declaration order, map keys
//! are ordered by `BTreeMap`, and sets are ordered by `BTreeSet` — so any two
//! bodies with equal semantic content serialize to identical bytes (§6,
//! §9 "Canonical encoding").

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::credential::{Credential, Hash28, RewardAccount};
use crate::crypto::{Digest32, Hasher, KeyWitness, Sig, VKey, Witness};
use crate::utxo::TxIn;
use crate::value::{Coin, Value};

/// Transaction identity: the hash of a body's canonical encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxId(pub Digest32);

/// A stake-pool registration certificate (§4.H).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolRegistration {
    pub pool_id: Hash28,
    pub cold_key: Hash28,
    pub owners: BTreeSet<Hash28>,
    pub pledge: Coin,
    pub cost: Coin,
    /// Margin as a rational in `[0, 1]`, represented as (numerator,
    /// denominator) to avoid floating-point equality issues in a
    /// consensus-critical type.
    pub margin_numerator: u64,
    pub margin_denominator: u64,
    pub reward_account: RewardAccount,
}

impl PoolRegistration {
    pub fn margin(&self) -> f64 {
        if self.margin_denominator == 0 {
            return 1.0;
        }
        self.margin_numerator as f64 / self.margin_denominator as f64
    }
}

/// A stake-pool retirement certificate (§4.H).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRetirement {
    pub pool_id: Hash28,
    pub retirement_epoch: u64,
}

/// On-chain delegation state commands (§3 glossary: Certificate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Certificate {
    StakeRegistration(Credential),
    StakeDeregistration(Credential),
    StakeDelegation {
        delegator: Credential,
        pool_id: Hash28,
    },
    PoolRegistration(PoolRegistration),
    PoolRetirement(PoolRetirement),
}

impl Certificate {
    /// Whether this certificate kind requires a vkey witness from its
    /// credential (§4.D item 3). Pool registration/retirement always
    /// require vkey witnesses (cold key and owners); stake delegation
    /// certificates require one only when their credential is a key hash —
    /// script-credential delegation/deregistration are witnessed by scripts
    /// instead (§4.E item 3).
    pub fn requires_vkey_witness(&self) -> bool {
        match self {
            Certificate::StakeRegistration(_) => false,
            Certificate::StakeDeregistration(c) | Certificate::StakeDelegation { delegator: c, .. } => {
                matches!(c, Credential::KeyHash(_))
            }
            Certificate::PoolRegistration(_) | Certificate::PoolRetirement(_) => true,
        }
    }
}

/// A protocol-parameter update proposal, keyed by the genesis delegate whose
/// vote it represents (§4.D item 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolParamUpdate {
    #[serde(with = "crate::serde_util")]
    pub proposals: BTreeMap<Hash28, ParamUpdateBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamUpdateBody {
    pub min_fee_a: Option<u64>,
    pub min_fee_b: Option<u64>,
    pub min_utxo_value: Option<Coin>,
}

/// A transaction output (§3). `address` and `value` are retained in full
/// precision here; the UTxO map stores the compacted form via
/// [`crate::utxo::UTxOOut`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxOut {
    pub address: crate::credential::Address,
    pub value: Value,
}

/// The canonical, serializable transaction body (§3). Its encoding is the
/// sole input to [`TxId`] — see [`TxBody::id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxBody {
    pub inputs: BTreeSet<TxIn>,
    pub outputs: Vec<TxOut>,
    pub certificates: Vec<Certificate>,
    pub forge: Value,
    #[serde(with = "crate::serde_util")]
    pub withdrawals: BTreeMap<RewardAccount, Coin>,
    pub fee: Coin,
    pub ttl: u64,
    pub update: Option<ProtocolParamUpdate>,
    pub metadata_hash: Option<Digest32>,
}

impl TxBody {
    /// Canonical encoding of this body: the sole input to [`TxBody::id`].
    /// `bincode`'s standard configuration encodes `BTreeMap`/`BTreeSet` in
    /// key order and struct fields in declaration order, which is exactly
    /// the canonical form §6 requires; there is no additional codec to
    /// hand-write.
    pub fn canonical_encode(&self) -> Vec<u8> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .expect("TxBody encoding is infallible for well-formed values")
    }

    pub fn canonical_decode(bytes: &[u8]) -> Option<TxBody> {
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map(|(body, _)| body)
            .ok()
    }

    /// `txid(body) = hash(canonical_encode(body))` (§4.C).
    pub fn id<H: Hasher>(&self) -> TxId {
        TxId(H::hash_32(&self.canonical_encode()))
    }

    /// Approximate on-wire transaction size in bytes, used by the fee
    /// formula and the max-size precondition (§4.F items 4, 8). Derived
    /// directly from the canonical encoding rather than a separate estimate,
    /// so fee and size checks always agree with what was actually hashed.
    pub fn size(&self) -> usize {
        self.canonical_encode().len()
    }
}

/// A transaction: body plus witness set plus optional protocol-parameter
/// update vote body (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub body: TxBody,
    pub witnesses: WitnessSet,
}

/// A Byron-era extended-key witness redeeming a bootstrap (pre-Shelley)
/// address (§3). Carried structurally so a `WitnessSet` can hold a
/// transaction migrating Byron-address funds; this crate does not itself
/// verify the chain-code/attribute-derived address redemption, matching
/// the other capability-abstraction boundaries drawn in §6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapWitness {
    pub public_key: VKey<Witness>,
    pub signature: Sig,
    pub chain_code: [u8; 32],
    pub attributes: Vec<u8>,
}

/// The set of witnesses accompanying a transaction (§3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WitnessSet {
    pub vkey_witnesses: Vec<KeyWitness>,
    #[serde(with = "crate::serde_util")]
    pub scripts: BTreeMap<Hash28, crate::scripts::Script>,
    pub metadata: Option<Vec<u8>>,
    pub bootstrap_witnesses: Option<Vec<BootstrapWitness>>,
}

impl Transaction {
    pub fn id<H: Hasher>(&self) -> TxId {
        self.body.id::<H>()
    }

    /// `txouts(tx)` — the UTxO entries this transaction would add if
    /// applied, keyed by `(txid(tx.body), i)` (§4.C).
    pub fn txouts<H: Hasher>(&self) -> BTreeMap<TxIn, TxOut> {
        let id = self.id::<H>();
        self.body
            .outputs
            .iter()
            .enumerate()
            .map(|(i, out)| {
                (
                    TxIn {
                        tx_id: id,
                        index: i as u32,
                    },
                    out.clone(),
                )
            })
            .collect()
    }
}
