//! Witness engine: required-witness computation (§4.D).
//!
//! `requiredWitnesses` is the union of four contributions: spent inputs'
//! payment credentials, withdrawn reward accounts' staking credentials,
//! vkey-witnessed certificates' credentials (plus pool cold key/owners), and
//! protocol-parameter-update voting genesis delegates.

use std::collections::BTreeSet;

use crate::credential::Credential;
use crate::state::DelegationState;
use crate::tx::{Certificate, Transaction};
use crate::utxo::UTxO;

/// `requiredWitnesses(tx, utxo, delegState)` (§4.D).
pub fn required_witnesses(
    tx: &Transaction,
    utxo: &UTxO,
    deleg_state: &DelegationState,
) -> BTreeSet<crate::credential::Hash28> {
    let mut required = BTreeSet::new();

    // 1. Payment credentials of consumed inputs, key-hash only.
    for input in &tx.body.inputs {
        if let Some(entry) = utxo.get(input)
            && let Credential::KeyHash(h) = entry.address.payment
        {
            required.insert(h);
        }
    }

    // 2. Staking credentials of withdrawn reward accounts, key-hash only.
    for account in tx.body.withdrawals.keys() {
        if let Credential::KeyHash(h) = account.credential {
            required.insert(h);
        }
    }

    // 3. Certificates that require a vkey witness.
    for cert in &tx.body.certificates {
        if !cert.requires_vkey_witness() {
            continue;
        }
        match cert {
            Certificate::StakeRegistration(_) => {}
            Certificate::StakeDeregistration(c) | Certificate::StakeDelegation { delegator: c, .. } => {
                if let Credential::KeyHash(h) = c {
                    required.insert(*h);
                }
            }
            Certificate::PoolRegistration(reg) => {
                required.insert(reg.cold_key);
                required.extend(reg.owners.iter().copied());
            }
            Certificate::PoolRetirement(ret) => {
                if let Some(pool) = deleg_state.stake_pools.get(&ret.pool_id) {
                    required.insert(pool.registration.cold_key);
                }
            }
        }
    }

    // 4. Protocol-parameter update votes: every genesis delegate key voting.
    if let Some(update) = &tx.body.update {
        required.extend(update.proposals.keys().copied());
    }

    required
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{Address, Hash28, Network, RewardAccount, StakeReference};
    use crate::crypto::{Blake2bHasher, Hasher};
    use crate::tx::TxId;
    use crate::utxo::{CompactValue, TxIn, UTxOOut};
    use crate::value::Value;
    use std::collections::BTreeMap;

    fn dummy_tx_id() -> TxId {
        TxId(Blake2bHasher::hash_32(b"dummy"))
    }

    #[test]
    fn requires_payment_key_of_consumed_input() {
        let key_hash = Hash28([7u8; 28]);
        let input = TxIn {
            tx_id: dummy_tx_id(),
            index: 0,
        };
        let utxo = UTxO::singleton(
            input,
            UTxOOut {
                address: Address::new(Network::Testnet, Credential::KeyHash(key_hash), StakeReference::None),
                value: CompactValue::to_compact(&Value::of_coin(10)),
            },
        );
        let body = crate::tx::TxBody {
            inputs: [input].into_iter().collect(),
            outputs: vec![],
            certificates: vec![],
            forge: Value::zero(),
            withdrawals: BTreeMap::new(),
            fee: 0,
            ttl: 0,
            update: None,
            metadata_hash: None,
        };
        let tx = Transaction {
            body,
            witnesses: Default::default(),
        };
        let required = required_witnesses(&tx, &utxo, &DelegationState::default());
        assert!(required.contains(&key_hash));
    }

    #[test]
    fn requires_withdrawal_staking_key() {
        let stake_hash = Hash28([9u8; 28]);
        let account = RewardAccount {
            network: Network::Testnet,
            credential: Credential::KeyHash(stake_hash),
        };
        let body = crate::tx::TxBody {
            inputs: Default::default(),
            outputs: vec![],
            certificates: vec![],
            forge: Value::zero(),
            withdrawals: BTreeMap::from([(account, 10)]),
            fee: 0,
            ttl: 0,
            update: None,
            metadata_hash: None,
        };
        let tx = Transaction {
            body,
            witnesses: Default::default(),
        };
        let required = required_witnesses(&tx, &UTxO::empty(), &DelegationState::default());
        assert!(required.contains(&stake_hash));
    }
}
