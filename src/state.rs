//! Ledger state and environment (§3: UTxOState, DelegationState; §6:
//! Environment).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::credential::{Credential, Hash28, Network, RewardAccount};
use crate::params::ProtocolParams;
use crate::tx::{PoolRegistration, ProtocolParamUpdate};
use crate::utxo::UTxO;
use crate::value::Coin;

/// A registered stake pool's current parameters and retirement status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakePool {
    pub registration: PoolRegistration,
    pub retiring_at: Option<u64>,
}

/// Delegation-related ledger state (§3): registered credentials,
/// delegations, reward accounts, registered pools, and the retiring set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelegationState {
    pub registered_stake_credentials: std::collections::BTreeSet<Credential>,
    #[serde(with = "crate::serde_util")]
    pub delegations: BTreeMap<Credential, Hash28>,
    #[serde(with = "crate::serde_util")]
    pub reward_accounts: BTreeMap<RewardAccount, Coin>,
    #[serde(with = "crate::serde_util")]
    pub stake_pools: BTreeMap<Hash28, StakePool>,
    pub retiring: std::collections::BTreeSet<Hash28>,
}

impl DelegationState {
    pub fn reward_balance(&self, credential: &Credential, network: Network) -> Coin {
        self.reward_accounts
            .get(&RewardAccount {
                network,
                credential: *credential,
            })
            .copied()
            .unwrap_or(0)
    }
}

/// UTxO-related ledger state (§3): the UTxO itself plus running deposit/fee
/// accumulators and any pending protocol-parameter update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UTxOState {
    pub utxo: UTxO,
    pub deposited: Coin,
    pub fees: Coin,
    pub ppup: Option<ProtocolParamUpdate>,
}

/// The environment a rule evaluates against: the current slot, the
/// transaction's index within its block, protocol parameters, the network
/// tag, and the set of currently registered stake pools (§4.F: "Given
/// environment `(slot, pparams, stakePools)`" — used only to decide whether
/// a pool registration certificate is new or a re-registration; `UTXO`
/// reads this set but never mutates it, since applying certificates is
/// `DELEGS`'s job).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerEnv<'a> {
    pub slot: u64,
    pub tx_index: u32,
    pub current_epoch: u64,
    pub network: Network,
    pub pparams: &'a ProtocolParams,
    pub stake_pools: &'a std::collections::BTreeSet<Hash28>,
}
