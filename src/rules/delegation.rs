//! Delegation and pool certificate rules (§4.H): `DELEGS` iterates
//! certificates, dispatching each to `DELPL`, which in turn dispatches
//! delegation certificates to `DELEG` and pool certificates to `POOL`.

use std::collections::BTreeMap;

use crate::credential::{Credential, RewardAccount};
use crate::error::{DelegsFailure, DelplFailure};
use crate::params::ProtocolParams;
use crate::state::{DelegationState, StakePool};
use crate::tx::{Certificate, PoolRegistration, PoolRetirement};
use tracing::{debug, trace, warn};

/// Apply a single certificate (`DELPL`, dispatching to `DELEG`/`POOL`).
fn apply_delpl(
    pparams: &ProtocolParams,
    current_epoch: u64,
    state: &DelegationState,
    cert: &Certificate,
) -> Result<DelegationState, DelplFailure> {
    match cert {
        Certificate::StakeRegistration(credential) => apply_registration(state, *credential),
        Certificate::StakeDeregistration(credential) => apply_deregistration(state, *credential),
        Certificate::StakeDelegation { delegator, pool_id } => apply_delegation(state, *delegator, *pool_id),
        Certificate::PoolRegistration(reg) => apply_pool_registration(pparams, state, reg),
        Certificate::PoolRetirement(ret) => apply_pool_retirement(current_epoch, pparams.e_max, state, ret),
    }
}

/// **Registration** (§4.H): the credential must not already be registered;
/// registers it. (The corresponding `keyDeposit` charge is accounted for by
/// `UTXO`'s conservation equation, §4.F item 5 — `DELEGS` only updates the
/// logical registration set here.)
fn apply_registration(state: &DelegationState, credential: Credential) -> Result<DelegationState, DelplFailure> {
    if state.registered_stake_credentials.contains(&credential) {
        return Err(DelplFailure::StakeKeyAlreadyRegisteredDELEG);
    }
    let mut next = state.clone();
    next.registered_stake_credentials.insert(credential);
    Ok(next)
}

/// **Deregistration** (§4.H): credential must be registered *and* have zero
/// reward balance; refunds the deposit (accounted for by `UTXO`).
fn apply_deregistration(state: &DelegationState, credential: Credential) -> Result<DelegationState, DelplFailure> {
    if !state.registered_stake_credentials.contains(&credential) {
        return Err(DelplFailure::StakeKeyNotRegisteredDELEG);
    }
    let has_balance = state
        .reward_accounts
        .iter()
        .any(|(acct, coin)| acct.credential == credential && *coin != 0);
    if has_balance {
        return Err(DelplFailure::RewardAccountNotEmptyDELEG);
    }
    let mut next = state.clone();
    next.registered_stake_credentials.remove(&credential);
    next.delegations.remove(&credential);
    next.reward_accounts.retain(|acct, _| acct.credential != credential);
    Ok(next)
}

/// **Delegation** (§4.H): credential and target pool must both be
/// registered.
fn apply_delegation(
    state: &DelegationState,
    delegator: Credential,
    pool_id: crate::credential::Hash28,
) -> Result<DelegationState, DelplFailure> {
    if !state.registered_stake_credentials.contains(&delegator) {
        return Err(DelplFailure::StakeDelegationImpossibleDELEG);
    }
    if !state.stake_pools.contains_key(&pool_id) {
        return Err(DelplFailure::StakeDelegationImpossibleDELEG);
    }
    let mut next = state.clone();
    next.delegations.insert(delegator, pool_id);
    Ok(next)
}

/// **Pool registration** (§4.H): cost must be `>= minPoolCost`; margin in
/// `[0,1]`; new pools deduct a deposit (accounted for by `UTXO`),
/// re-registrations update parameters without a fresh deposit.
fn apply_pool_registration(
    pparams: &ProtocolParams,
    state: &DelegationState,
    reg: &PoolRegistration,
) -> Result<DelegationState, DelplFailure> {
    if reg.cost < pparams.min_pool_cost {
        return Err(DelplFailure::StakePoolCostTooLowPOOL {
            cost: reg.cost,
            min: pparams.min_pool_cost,
        });
    }
    let margin = reg.margin();
    if !(0.0..=1.0).contains(&margin) {
        return Err(DelplFailure::PoolMarginOutOfRangePOOL { margin });
    }
    let mut next = state.clone();
    next.stake_pools.insert(
        reg.pool_id,
        StakePool {
            registration: reg.clone(),
            retiring_at: None,
        },
    );
    next.retiring.remove(&reg.pool_id);
    Ok(next)
}

/// **Pool retirement** (§4.H): retirement epoch must be in
/// `(currentEpoch, currentEpoch + eMax]`.
fn apply_pool_retirement(
    current_epoch: u64,
    e_max: u64,
    state: &DelegationState,
    ret: &PoolRetirement,
) -> Result<DelegationState, DelplFailure> {
    if !state.stake_pools.contains_key(&ret.pool_id) {
        return Err(DelplFailure::PoolNotFoundPOOL(format!("{:?}", ret.pool_id)));
    }
    let upper = current_epoch + e_max;
    if !(ret.retirement_epoch > current_epoch && ret.retirement_epoch <= upper) {
        return Err(DelplFailure::PoolRetirementEpochOutOfRangePOOL {
            epoch: ret.retirement_epoch,
            current_epoch,
            e_max,
        });
    }
    let mut next = state.clone();
    if let Some(pool) = next.stake_pools.get_mut(&ret.pool_id) {
        pool.retiring_at = Some(ret.retirement_epoch);
    }
    next.retiring.insert(ret.pool_id);
    Ok(next)
}

/// **Withdrawals** (§4.H): the withdrawal map must exactly match the
/// current reward balances for every listed account.
fn check_withdrawals(
    state: &DelegationState,
    withdrawals: &BTreeMap<RewardAccount, u64>,
) -> Result<(), DelegsFailure> {
    let mut diff = BTreeMap::new();
    for (account, amount) in withdrawals {
        let actual = state.reward_accounts.get(account).copied().unwrap_or(0);
        if actual != *amount {
            diff.insert(account.credential_hash(), actual as i128 - *amount as i128);
        }
    }
    if diff.is_empty() {
        Ok(())
    } else {
        Err(DelegsFailure::WithdrawalsNotInRewardsDELEGS(diff))
    }
}

/// Apply the `DELEGS` rule: check withdrawals, then iterate certificates in
/// order, applying `DELPL` to each and accumulating reward-account effects.
pub fn apply_delegs(
    pparams: &ProtocolParams,
    current_epoch: u64,
    state: &DelegationState,
    certificates: &[Certificate],
    withdrawals: &BTreeMap<RewardAccount, u64>,
) -> Result<DelegationState, Vec<DelegsFailure>> {
    trace!(current_epoch, certificates = certificates.len(), "entering apply_delegs");

    let mut failures = Vec::new();
    if let Err(e) = check_withdrawals(state, withdrawals) {
        failures.push(e);
    }

    let mut current = state.clone();
    for (index, cert) in certificates.iter().enumerate() {
        trace!(index, "applying certificate");
        match apply_delpl(pparams, current_epoch, &current, cert) {
            Ok(next) => current = next,
            Err(e) => {
                debug!(index, error = %e, "certificate application failed");
                failures.push(DelegsFailure::DelplFailure(e));
            }
        }
    }

    if !failures.is_empty() {
        warn!(current_epoch, failures = failures.len(), "apply_delegs rejected transaction");
        return Err(failures);
    }

    // Zero out withdrawn reward accounts and credit deposits/refunds
    // accounted for by UTXO as logical registration-set changes only;
    // reward balances move here since DELEGS, not UTXO, owns them.
    for account in withdrawals.keys() {
        current.reward_accounts.insert(*account, 0);
    }
    debug!(current_epoch, "apply_delegs accepted transaction");
    Ok(current)
}

impl RewardAccount {
    fn credential_hash(&self) -> crate::credential::Hash28 {
        match self.credential {
            Credential::KeyHash(h) | Credential::ScriptHash(h) => h,
        }
    }
}
