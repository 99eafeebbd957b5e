//! The `UTXOW` rule (§4.G): wraps `UTXO` with witness and script checks.

use std::collections::BTreeSet;

use crate::crypto::{Blake2bHasher, Digest32, Hasher, verify_witness};
use crate::error::UtxowFailure;
use crate::scripts::scripts_authorized;
use crate::state::{DelegationState, LedgerEnv, UTxOState};
use crate::tx::Transaction;
use tracing::{debug, trace, warn};

use super::utxo::apply_utxo;

/// Apply the `UTXOW` rule. Witness checks run first, in the order given by
/// §4.G; independent failures accumulate. On success, delegates to `UTXO`
/// and wraps any resulting failure as `UtxowFailure::UtxoFailure`.
pub fn apply_utxow<H: Hasher>(
    env: &LedgerEnv,
    state: &UTxOState,
    deleg_state: &DelegationState,
    tx: &Transaction,
) -> Result<UTxOState, Vec<UtxowFailure>> {
    trace!(
        slot = env.slot,
        witnesses = tx.witnesses.vkey_witnesses.len(),
        "entering apply_utxow"
    );

    let mut failures = Vec::new();
    let body_hash = Digest32(H::hash_32(&tx.body.canonical_encode()).0);

    // 1. Signatures valid.
    let mut invalid = Vec::new();
    for witness in &tx.witnesses.vkey_witnesses {
        if !verify_witness(body_hash, witness) {
            invalid.push(witness.vkey.hash::<H>());
        }
    }
    if !invalid.is_empty() {
        failures.push(UtxowFailure::InvalidWitnessesUTXOW(invalid));
    }

    // 2. Required vkey witnesses present.
    let witnessing_keys: BTreeSet<_> = tx
        .witnesses
        .vkey_witnesses
        .iter()
        .map(|w| w.vkey.hash::<H>())
        .collect();
    let required = crate::witness::required_witnesses(tx, &state.utxo, deleg_state);
    let missing: BTreeSet<_> = required.difference(&witnessing_keys).copied().collect();
    if !missing.is_empty() {
        failures.push(UtxowFailure::MissingVKeyWitnessesUTXOW(missing));
    }

    // 3. Metadata hash consistency.
    match (&tx.body.metadata_hash, &tx.witnesses.metadata) {
        (Some(declared), Some(bytes)) => {
            let actual = H::hash_32(bytes);
            if Digest32(actual.0) != *declared {
                failures.push(UtxowFailure::ConflictingMetadataHash);
            }
        }
        (Some(_), None) => failures.push(UtxowFailure::MissingTxMetadata),
        (None, Some(_)) => failures.push(UtxowFailure::MissingTxBodyMetadataHash),
        (None, None) => {}
    }

    // 4. Script witness sufficiency (equality, not subset).
    let needed = crate::scripts::scripts_needed(tx, &state.utxo);
    let provided: BTreeSet<_> = tx.witnesses.scripts.keys().copied().collect();
    let missing_scripts: BTreeSet<_> = needed.difference(&provided).copied().collect();
    let extra_scripts: BTreeSet<_> = provided.difference(&needed).copied().collect();
    let scripts_balanced = missing_scripts.is_empty() && extra_scripts.is_empty();
    if !missing_scripts.is_empty() {
        failures.push(UtxowFailure::MissingScriptWitnessesUTXOW(missing_scripts));
    }
    if !extra_scripts.is_empty() {
        failures.push(UtxowFailure::ExtraneousScriptWitnessesUTXOW(extra_scripts));
    }

    // 5. Scripts validate.
    if scripts_balanced
        && !scripts_authorized::<H>(tx, &state.utxo, &witnessing_keys, &[])
    {
        let failing: Vec<_> = needed.into_iter().collect();
        failures.push(UtxowFailure::ScriptWitnessNotValidatingUTXOW(failing));
    }

    if !failures.is_empty() {
        warn!(slot = env.slot, failures = failures.len(), "apply_utxow rejected transaction");
        return Err(failures);
    }

    let result = apply_utxo::<H>(env, state, tx).map_err(|errs| errs.into_iter().map(UtxowFailure::from).collect());
    if result.is_ok() {
        debug!(slot = env.slot, "apply_utxow accepted transaction");
    }
    result
}

/// Convenience wrapper defaulting to the crate's concrete `Blake2bHasher`.
pub fn apply_utxow_default(
    env: &LedgerEnv,
    state: &UTxOState,
    deleg_state: &DelegationState,
    tx: &Transaction,
) -> Result<UTxOState, Vec<UtxowFailure>> {
    apply_utxow::<Blake2bHasher>(env, state, deleg_state, tx)
}
