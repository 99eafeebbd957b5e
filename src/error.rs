//! Structured failure taxonomy (§7).
//!
//! Every rule either succeeds atomically or reports one or more structured
//! failure values; it never panics and never partially mutates state.
//! Outer rules wrap inner failures rather than flattening them, so a
//! `UTXOW` failure caused by a bad conservation equation still carries the
//! full `UtxoFailure` payload.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::credential::Hash28;
use crate::utxo::TxIn;
use crate::value::{Coin, Value};

/// Failures of the `UTXO` rule (§4.F, §7).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UtxoFailure {
    #[error("transaction has no inputs")]
    InputSetEmptyUTxO,
    #[error("transaction ttl {ttl} has expired at slot {slot}")]
    ExpiredUTxO { ttl: u64, slot: u64 },
    #[error("transaction references inputs not in the UTxO: {0:?}")]
    BadInputsUTxO(BTreeSet<TxIn>),
    #[error("fee too small: required {required}, actual {actual}")]
    FeeTooSmallUTxO { required: Coin, actual: Coin },
    #[error("value not conserved: consumed {consumed:?}, produced {produced:?}")]
    ValueNotConservedUTxO { consumed: Value, produced: Value },
    #[error("outputs below minimum UTxO value: {0:?}")]
    OutputTooSmallUTxO(Vec<Value>),
    #[error("transaction exceeds maximum size")]
    MaxTxSizeUTxO { actual: usize, max: usize },
    #[error("address or withdrawal account on the wrong network")]
    WrongNetwork,
    #[error("withdrawal reward account on the wrong network")]
    WrongNetworkWithdrawal,
    #[error("transaction forges or burns the base asset")]
    ForgeOfBaseAssetUTxO,
}

/// Failures of the `UTXOW` rule (§4.G, §7), wrapping `UTXO` failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UtxowFailure {
    #[error("invalid witnesses: {0:?}")]
    InvalidWitnessesUTXOW(Vec<Hash28>),
    #[error("missing required vkey witnesses: {0:?}")]
    MissingVKeyWitnessesUTXOW(BTreeSet<Hash28>),
    #[error("missing transaction metadata")]
    MissingTxMetadata,
    #[error("body declares a metadata hash but no metadata was supplied")]
    MissingTxBodyMetadataHash,
    #[error("metadata hash does not match body's declared hash")]
    ConflictingMetadataHash,
    #[error("missing required script witnesses: {0:?}")]
    MissingScriptWitnessesUTXOW(BTreeSet<Hash28>),
    #[error("extraneous script witnesses provided: {0:?}")]
    ExtraneousScriptWitnessesUTXOW(BTreeSet<Hash28>),
    #[error("a provided script did not validate")]
    ScriptWitnessNotValidatingUTXOW(Vec<Hash28>),
    #[error(transparent)]
    UtxoFailure(#[from] UtxoFailure),
}

/// Failures applying a single delegation/pool certificate (`DELPL`, `DELEG`,
/// `POOL`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DelplFailure {
    #[error("stake credential already registered")]
    StakeKeyAlreadyRegisteredDELEG,
    #[error("stake credential not registered")]
    StakeKeyNotRegisteredDELEG,
    #[error("cannot delegate: credential or pool not registered")]
    StakeDelegationImpossibleDELEG,
    #[error("wrong certificate type for this credential")]
    WrongCertificateTypeDELEG,
    #[error("reward account balance is non-zero; must be withdrawn before deregistration")]
    RewardAccountNotEmptyDELEG,
    #[error("pool cost {cost} below minimum {min}")]
    StakePoolCostTooLowPOOL { cost: Coin, min: Coin },
    #[error("pool margin {margin} outside [0,1]")]
    PoolMarginOutOfRangePOOL { margin: f64 },
    #[error("pool retirement epoch {epoch} outside (currentEpoch, currentEpoch + eMax]")]
    PoolRetirementEpochOutOfRangePOOL { epoch: u64, current_epoch: u64, e_max: u64 },
    #[error("pool {0} not found")]
    PoolNotFoundPOOL(String),
}

/// Failures of the `DELEGS` rule: either a wrapped `DELPL` failure or a
/// withdrawal mismatch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DelegsFailure {
    #[error(transparent)]
    DelplFailure(#[from] DelplFailure),
    #[error("withdrawals do not match reward balances: {0:?}")]
    WithdrawalsNotInRewardsDELEGS(std::collections::BTreeMap<Hash28, i128>),
}

/// Top-level failure of the `LEDGER` composite rule: either a wrapped
/// `UTXOW` failure or a wrapped `DELEGS` failure (§4.J).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerFailure {
    #[error(transparent)]
    UtxowFailure(#[from] UtxowFailure),
    #[error(transparent)]
    DelegsFailure(#[from] DelegsFailure),
}
