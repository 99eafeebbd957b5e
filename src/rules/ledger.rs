//! The `LEDGER` composite rule (§4.J): sequentially applies `UTXOW` then
//! `DELEGS`, threading state. A failure from either sub-rule aborts the
//! whole transition and leaves the pre-state untouched (§7, §8 property 6).

use crate::crypto::Hasher;
use crate::error::LedgerFailure;
use crate::state::{DelegationState, LedgerEnv, UTxOState};
use crate::tx::Transaction;
use tracing::{debug, trace, warn};

use super::delegation::apply_delegs;
use super::utxow::apply_utxow;

/// `applyLEDGER(env, (utxoState, delegState), tx) -> Result<(utxoState,
/// delegState), [failure]>` (§6).
pub fn apply_ledger<H: Hasher>(
    env: &LedgerEnv,
    utxo_state: &UTxOState,
    deleg_state: &DelegationState,
    tx: &Transaction,
) -> Result<(UTxOState, DelegationState), Vec<LedgerFailure>> {
    trace!(slot = env.slot, tx_index = env.tx_index, "entering apply_ledger");

    let utxo_state_prime = apply_utxow::<H>(env, utxo_state, deleg_state, tx).map_err(|errs| {
        warn!(slot = env.slot, "apply_ledger rejected transaction in UTXOW");
        errs.into_iter().map(LedgerFailure::from).collect::<Vec<_>>()
    })?;

    let deleg_state_prime = apply_delegs(
        env.pparams,
        env.current_epoch,
        deleg_state,
        &tx.body.certificates,
        &tx.body.withdrawals,
    )
    .map_err(|errs| {
        warn!(slot = env.slot, "apply_ledger rejected transaction in DELEGS");
        errs.into_iter().map(LedgerFailure::from).collect::<Vec<_>>()
    })?;

    debug!(slot = env.slot, tx_index = env.tx_index, "apply_ledger accepted transaction");
    Ok((utxo_state_prime, deleg_state_prime))
}
