//! # shelley-ledger-core
//!
//! A standalone implementation of the Shelley-era UTxO ledger rules: the
//! `Value` algebra, the `Credential`/`Address` model, the UTxO map and its
//! relation algebra, canonical transaction identity, the witness engine, and
//! the `UTXO`/`UTXOW`/`DELEGS`/`DELPL`/`POOL`/`LEDGER` rule family.
//!
//! This crate is a ledger library, not a node: it has no networking,
//! consensus, mempool, or chain database. Given a ledger environment, a
//! pre-state, and a transaction, [`rules::ledger::apply_ledger`] computes the
//! post-state or a structured list of failures (§7: rules never panic and
//! never partially mutate state).
//!
//! ## Modules
//! - [`value`]: the multi-asset `Value` commutative monoid.
//! - [`credential`]: `Credential`, `Address`, `Network`, `RewardAccount`.
//! - [`crypto`]: hash (`Hasher`) and signature capabilities, phantom-tagged
//!   verification keys.
//! - [`tx`]: `TxBody`, `TxId`, `Transaction`, `WitnessSet`, certificates.
//! - [`utxo`]: the UTxO map and its relation-algebra operations.
//! - [`witness`]: computing the set of witnesses a transaction requires.
//! - [`scripts`]: the script-hash requirement and a multisig/hash-lock
//!   script evaluator.
//! - [`params`]: `ProtocolParams`, the ambient protocol-parameter config.
//! - [`state`]: `UTxOState`, `DelegationState`, `LedgerEnv`.
//! - [`error`]: the structured failure taxonomy.
//! - [`rules`]: `UTXO`, `UTXOW`, `DELEGS`/`DELPL`/`DELEG`/`POOL`, `LEDGER`.
//!
//! ## Testing
//! ```sh
//! cargo test
//! ```

pub mod credential;
pub mod crypto;
pub mod error;
pub mod params;
pub mod rules;
pub mod scripts;
mod serde_util;
pub mod state;
pub mod tx;
pub mod utxo;
pub mod value;
pub mod witness;
