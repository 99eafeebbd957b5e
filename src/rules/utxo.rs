//! The `UTXO` rule (§4.F): the core state transition over `(UTxO, deposits,
//! fees, pparams update)`.

use std::collections::BTreeSet;

use crate::crypto::Hasher;
use crate::error::UtxoFailure;
use crate::state::{LedgerEnv, UTxOState};
use crate::tx::{Certificate, Transaction};
use crate::utxo::{TxIn, UTxOOut};
use crate::value::Value;
use tracing::{debug, trace, warn};

/// `totalDeposits`: sum of `keyDeposit` for each stake registration plus
/// `poolDeposit` for each genuinely *new* pool registration (pools already
/// in `env.stake_pools` are not recharged).
fn total_deposits(env: &LedgerEnv, certs: &[Certificate]) -> u64 {
    certs
        .iter()
        .map(|cert| match cert {
            Certificate::StakeRegistration(_) => env.pparams.key_deposit,
            Certificate::PoolRegistration(reg) => {
                if env.stake_pools.contains(&reg.pool_id) {
                    0
                } else {
                    env.pparams.pool_deposit
                }
            }
            _ => 0,
        })
        .sum()
}

/// `refunds`: sum of `keyDeposit` refunded by each deregistration
/// certificate — credited to `consumed` per the conservation equation
/// (§4.F item 5). The `UTXO` rule itself does not check whether the
/// credential's reward balance is zero; that check belongs to `DELEGS`
/// (§4.H), which is the rule that actually applies the certificate.
fn refunds(env: &LedgerEnv, certs: &[Certificate]) -> u64 {
    certs
        .iter()
        .filter(|c| matches!(c, Certificate::StakeDeregistration(_)))
        .map(|_| env.pparams.key_deposit)
        .sum()
}

/// Apply the `UTXO` rule. Preconditions are checked in the order given by
/// §4.F; independent failures accumulate into the returned `Vec` rather
/// than short-circuiting on the first one found (§7, §8 scenario S1).
pub fn apply_utxo<H: Hasher>(
    env: &LedgerEnv,
    state: &UTxOState,
    tx: &Transaction,
) -> Result<UTxOState, Vec<UtxoFailure>> {
    trace!(slot = env.slot, inputs = tx.body.inputs.len(), "entering apply_utxo");

    let mut failures = Vec::new();
    let body = &tx.body;

    // 1. InputSetNonEmpty
    if body.inputs.is_empty() {
        failures.push(UtxoFailure::InputSetEmptyUTxO);
    }

    // 2. TTL not expired
    if env.slot > body.ttl {
        failures.push(UtxoFailure::ExpiredUTxO {
            ttl: body.ttl,
            slot: env.slot,
        });
    }

    // 3. Inputs exist
    let missing: BTreeSet<TxIn> = body
        .inputs
        .iter()
        .filter(|i| !state.utxo.contains_key(i))
        .copied()
        .collect();
    if !missing.is_empty() {
        failures.push(UtxoFailure::BadInputsUTxO(missing.clone()));
    }

    let tx_size = body.size();

    // 4. Fee lower bound
    let min_fee = env.pparams.min_fee(tx_size);
    if body.fee < min_fee {
        failures.push(UtxoFailure::FeeTooSmallUTxO {
            required: min_fee,
            actual: body.fee,
        });
    }

    // 5. Value conservation. Only inputs that actually exist contribute to
    // `consumed`; a missing input still surfaces its own BadInputsUTxO
    // failure above instead of silently being treated as zero-value.
    let present_inputs: BTreeSet<TxIn> = body.inputs.difference(&missing).copied().collect();
    let restricted = state.utxo.restrict_by_key_set(&present_inputs);
    let withdrawals_total: u64 = body.withdrawals.values().sum();
    let consumed = restricted
        .balance()
        .add(&Value::of_coin(withdrawals_total))
        .add(&Value::of_coin(refunds(env, &body.certificates)))
        .add(&body.forge);
    let produced = Value::sum(body.outputs.iter().map(|o| &o.value))
        .add(&Value::of_coin(body.fee))
        .add(&Value::of_coin(total_deposits(env, &body.certificates)));
    if consumed != produced {
        failures.push(UtxoFailure::ValueNotConservedUTxO {
            consumed: consumed.clone(),
            produced: produced.clone(),
        });
    }

    // 6 & 7. Output minimum and positivity: a non-positive output is always
    // "too small" in the sense §4.F item 7 means, so both cases surface as
    // the same OutputTooSmallUTxO failure (§7's taxonomy has no separate
    // variant for a non-positive value).
    let undersized: Vec<Value> = body
        .outputs
        .iter()
        .map(|o| &o.value)
        .filter(|v| !v.is_positive() || v.coin() < env.pparams.min_utxo_value)
        .cloned()
        .collect();
    if !undersized.is_empty() {
        failures.push(UtxoFailure::OutputTooSmallUTxO(undersized));
    }

    // 8. Max tx size
    if tx_size > env.pparams.max_tx_size {
        failures.push(UtxoFailure::MaxTxSizeUTxO {
            actual: tx_size,
            max: env.pparams.max_tx_size,
        });
    }

    // 9. Network id: every output address and withdrawal account matches.
    if body.outputs.iter().any(|o| o.address.network != env.network) {
        failures.push(UtxoFailure::WrongNetwork);
    }
    if body.withdrawals.keys().any(|acct| acct.network != env.network) {
        failures.push(UtxoFailure::WrongNetworkWithdrawal);
    }

    // Forge of the base asset is rejected (§9 "Forge of base asset").
    if body.forge.coin_signed() != 0 {
        failures.push(UtxoFailure::ForgeOfBaseAssetUTxO);
    }

    if !failures.is_empty() {
        warn!(slot = env.slot, failures = failures.len(), "apply_utxo rejected transaction");
        return Err(failures);
    }

    let utxo_after_spend = state.utxo.exclude_by_key_set(&body.inputs);
    let new_outs: crate::utxo::UTxO = tx
        .txouts::<H>()
        .into_iter()
        .map(|(k, v)| (k, UTxOOut::from_tx_out(&v)))
        .collect();
    let utxo_prime = utxo_after_spend.override_with(&new_outs);

    let new_state = UTxOState {
        utxo: utxo_prime,
        deposited: state.deposited + total_deposits(env, &body.certificates),
        fees: state.fees + body.fee,
        ppup: body.update.clone().or_else(|| state.ppup.clone()),
    };
    debug!(slot = env.slot, fees = new_state.fees, "apply_utxo accepted transaction");
    Ok(new_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{Address, Credential, Hash28, Network, StakeReference};
    use crate::crypto::Blake2bHasher;
    use crate::params::ProtocolParams;
    use crate::tx::{TxBody, WitnessSet};
    use std::collections::{BTreeMap, BTreeSet};

    fn addr(seed: u8) -> Address {
        Address::new(
            Network::Testnet,
            Credential::KeyHash(Hash28([seed; 28])),
            StakeReference::None,
        )
    }

    fn seed_utxo() -> (UTxOState, TxIn, TxIn) {
        let g = crate::tx::TxId(Blake2bHasher::hash_32(b"genesis"));
        let alice_in = TxIn { tx_id: g, index: 0 };
        let bob_in = TxIn { tx_id: g, index: 1 };
        let utxo = crate::utxo::UTxO::singleton(
            alice_in,
            UTxOOut::from_tx_out(&crate::tx::TxOut {
                address: addr(1),
                value: Value::of_coin(10_000),
            }),
        )
        .override_with(&crate::utxo::UTxO::singleton(
            bob_in,
            UTxOOut::from_tx_out(&crate::tx::TxOut {
                address: addr(2),
                value: Value::of_coin(1_000),
            }),
        ));
        (
            UTxOState {
                utxo,
                deposited: 0,
                fees: 0,
                ppup: None,
            },
            alice_in,
            bob_in,
        )
    }

    fn env<'a>(pparams: &'a ProtocolParams, pools: &'a BTreeSet<Hash28>) -> LedgerEnv<'a> {
        LedgerEnv {
            slot: 0,
            tx_index: 0,
            current_epoch: 0,
            network: Network::Testnet,
            pparams,
            stake_pools: pools,
        }
    }

    #[test]
    fn scenario_s1_bad_input_and_value_not_conserved() {
        let (state, _, _) = seed_utxo();
        let pparams = ProtocolParams::default();
        let pools = BTreeSet::new();
        let nonexistent = TxIn {
            tx_id: crate::tx::TxId(Blake2bHasher::hash_32(b"nonexistent")),
            index: 42,
        };
        let body = TxBody {
            inputs: [nonexistent].into_iter().collect(),
            outputs: vec![crate::tx::TxOut {
                address: addr(2),
                value: Value::of_coin(3000),
            }],
            certificates: vec![],
            forge: Value::zero(),
            withdrawals: BTreeMap::new(),
            fee: 1500,
            ttl: 100,
            update: None,
            metadata_hash: None,
        };
        let tx = Transaction {
            body,
            witnesses: WitnessSet::default(),
        };
        let result = apply_utxo::<Blake2bHasher>(&env(&pparams, &pools), &state, &tx);
        let failures = result.unwrap_err();
        assert!(failures.iter().any(|f| matches!(f, UtxoFailure::BadInputsUTxO(_))));
        assert!(failures.iter().any(|f| matches!(f, UtxoFailure::ValueNotConservedUTxO { .. })));
    }

    #[test]
    fn scenario_s2_fee_too_small() {
        let (state, alice_in, _) = seed_utxo();
        let pparams = ProtocolParams::default();
        let pools = BTreeSet::new();
        let body = TxBody {
            inputs: [alice_in].into_iter().collect(),
            outputs: vec![
                crate::tx::TxOut {
                    address: addr(2),
                    value: Value::of_coin(3000),
                },
                crate::tx::TxOut {
                    address: addr(1),
                    value: Value::of_coin(10_000 - 3000 - 1),
                },
            ],
            certificates: vec![],
            forge: Value::zero(),
            withdrawals: BTreeMap::new(),
            fee: 1,
            ttl: 100,
            update: None,
            metadata_hash: None,
        };
        let tx = Transaction {
            body,
            witnesses: WitnessSet::default(),
        };
        let result = apply_utxo::<Blake2bHasher>(&env(&pparams, &pools), &state, &tx);
        let failures = result.unwrap_err();
        assert!(failures
            .iter()
            .any(|f| matches!(f, UtxoFailure::FeeTooSmallUTxO { required, actual } if *required == 171 && *actual == 1)));
    }

    #[test]
    fn scenario_s3_expired_ttl() {
        let (state, alice_in, _) = seed_utxo();
        let pparams = ProtocolParams::default();
        let pools = BTreeSet::new();
        let body = TxBody {
            inputs: [alice_in].into_iter().collect(),
            outputs: vec![
                crate::tx::TxOut {
                    address: addr(2),
                    value: Value::of_coin(3000),
                },
                crate::tx::TxOut {
                    address: addr(1),
                    value: Value::of_coin(10_000 - 3000 - 600),
                },
            ],
            certificates: vec![],
            forge: Value::zero(),
            withdrawals: BTreeMap::new(),
            fee: 600,
            ttl: 0,
            update: None,
            metadata_hash: None,
        };
        let tx = Transaction {
            body,
            witnesses: WitnessSet::default(),
        };
        let mut e = env(&pparams, &pools);
        e.slot = 1;
        let result = apply_utxo::<Blake2bHasher>(&e, &state, &tx);
        let failures = result.unwrap_err();
        assert!(failures
            .iter()
            .any(|f| matches!(f, UtxoFailure::ExpiredUTxO { ttl: 0, slot: 1 })));
    }

    #[test]
    fn scenario_s4_output_too_small() {
        let (state, alice_in, _) = seed_utxo();
        let pparams = ProtocolParams::default();
        let pools = BTreeSet::new();
        let body = TxBody {
            inputs: [alice_in].into_iter().collect(),
            outputs: vec![
                crate::tx::TxOut {
                    address: addr(2),
                    value: Value::of_coin(1),
                },
                crate::tx::TxOut {
                    address: addr(1),
                    value: Value::of_coin(10_000 - 1 - 997),
                },
            ],
            certificates: vec![],
            forge: Value::zero(),
            withdrawals: BTreeMap::new(),
            fee: 997,
            ttl: 100,
            update: None,
            metadata_hash: None,
        };
        let tx = Transaction {
            body,
            witnesses: WitnessSet::default(),
        };
        let result = apply_utxo::<Blake2bHasher>(&env(&pparams, &pools), &state, &tx);
        let failures = result.unwrap_err();
        assert!(failures.iter().any(|f| matches!(f, UtxoFailure::OutputTooSmallUTxO(v) if v.len() == 1)));
    }

    #[test]
    fn scenario_s6_accept_and_apply() {
        let (state, alice_in, _) = seed_utxo();
        let pparams = ProtocolParams::default();
        let pools = BTreeSet::new();
        let body = TxBody {
            inputs: [alice_in].into_iter().collect(),
            outputs: vec![
                crate::tx::TxOut {
                    address: addr(1),
                    value: Value::of_coin(6404),
                },
                crate::tx::TxOut {
                    address: addr(2),
                    value: Value::of_coin(3000),
                },
            ],
            certificates: vec![],
            forge: Value::zero(),
            withdrawals: BTreeMap::new(),
            fee: 596,
            ttl: 100,
            update: None,
            metadata_hash: None,
        };
        let tx = Transaction {
            body,
            witnesses: WitnessSet::default(),
        };
        let result = apply_utxo::<Blake2bHasher>(&env(&pparams, &pools), &state, &tx);
        let new_state = result.expect("transaction should be accepted");
        assert_eq!(new_state.fees, 596);
        assert!(!new_state.utxo.contains_key(&alice_in));
        let txid = tx.id::<Blake2bHasher>();
        assert_eq!(
            new_state.utxo.get(&TxIn { tx_id: txid, index: 0 }).unwrap().value(),
            Value::of_coin(6404)
        );
        assert_eq!(
            new_state.utxo.get(&TxIn { tx_id: txid, index: 1 }).unwrap().value(),
            Value::of_coin(3000)
        );
    }
}
