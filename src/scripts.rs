//! Script-hash requirement and multisig/hash-lock script evaluation
//! (§4.E, §1 Non-goals: "no script interpreter beyond multi-signature /
//! hash-lock witness discharge").

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::credential::{Credential, Hash28};
use crate::crypto::Hasher;
use crate::tx::{Certificate, Transaction};
use crate::utxo::UTxO;

/// A native script: multi-signature combinators over key hashes, or a
/// hash-lock requiring a preimage witness. This is the entire script
/// language the core supports (§1 Non-goals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Script {
    Signature(Hash28),
    AllOf(Vec<Script>),
    AnyOf(Vec<Script>),
    AtLeast(usize, Vec<Script>),
    /// Satisfied by a witness datum whose hash equals the locked hash.
    HashLock(Hash28),
}

/// Context a script evaluates against: the set of vkey hashes that
/// witnessed this transaction, and any preimages supplied for hash-locks.
pub struct ScriptContext<'a> {
    pub witnessing_keys: &'a BTreeSet<Hash28>,
    pub preimages: &'a [(Hash28, Vec<u8>)],
}

impl Script {
    /// Evaluate this script against the transaction context. Multisig
    /// combinators recurse structurally; a hash-lock succeeds iff some
    /// supplied preimage hashes to the locked value.
    pub fn evaluate<H: Hasher>(&self, ctx: &ScriptContext) -> bool {
        match self {
            Script::Signature(h) => ctx.witnessing_keys.contains(h),
            Script::AllOf(scripts) => scripts.iter().all(|s| s.evaluate::<H>(ctx)),
            Script::AnyOf(scripts) => scripts.iter().any(|s| s.evaluate::<H>(ctx)),
            Script::AtLeast(n, scripts) => scripts.iter().filter(|s| s.evaluate::<H>(ctx)).count() >= *n,
            Script::HashLock(locked) => ctx
                .preimages
                .iter()
                .any(|(h, preimage)| h == locked && &H::hash_28(preimage) == locked),
        }
    }
}

/// `scriptsNeeded(tx, utxo)` (§4.E).
pub fn scripts_needed(tx: &Transaction, utxo: &UTxO) -> BTreeSet<Hash28> {
    let mut needed = BTreeSet::new();

    // 1. Payment-credential script hashes of referenced UTxO entries.
    for input in &tx.body.inputs {
        if let Some(entry) = utxo.get(input)
            && let Credential::ScriptHash(h) = entry.address.payment
        {
            needed.insert(h);
        }
    }

    // 2. Staking-credential script hashes of withdrawal accounts.
    for account in tx.body.withdrawals.keys() {
        if let Credential::ScriptHash(h) = account.credential {
            needed.insert(h);
        }
    }

    // 3. Script-hash credentials on deregistration/delegation certificates.
    for cert in &tx.body.certificates {
        match cert {
            Certificate::StakeDeregistration(Credential::ScriptHash(h))
            | Certificate::StakeDelegation {
                delegator: Credential::ScriptHash(h),
                ..
            } => {
                needed.insert(*h);
            }
            _ => {}
        }
    }

    // 4. Policy hashes of every non-base asset in the forge value.
    for (asset, _) in tx.body.forge.iter() {
        if !asset.is_ada() {
            needed.insert(Hash28(asset.policy.0));
        }
    }

    needed
}

/// A transaction is script-authorized iff every required script hash is
/// provided in the witness set *and* each provided script evaluates
/// successfully (§4.E).
pub fn scripts_authorized<H: Hasher>(
    tx: &Transaction,
    utxo: &UTxO,
    witnessing_keys: &BTreeSet<Hash28>,
    preimages: &[(Hash28, Vec<u8>)],
) -> bool {
    let needed = scripts_needed(tx, utxo);
    let provided: BTreeSet<Hash28> = tx.witnesses.scripts.keys().copied().collect();
    if needed != provided {
        return false;
    }
    let ctx = ScriptContext {
        witnessing_keys,
        preimages,
    };
    tx.witnesses.scripts.values().all(|s| s.evaluate::<H>(&ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Blake2bHasher;

    #[test]
    fn signature_script_checks_witnessing_keys() {
        let h = Hash28([1u8; 28]);
        let script = Script::Signature(h);
        let keys: BTreeSet<Hash28> = [h].into_iter().collect();
        let ctx = ScriptContext {
            witnessing_keys: &keys,
            preimages: &[],
        };
        assert!(script.evaluate::<Blake2bHasher>(&ctx));

        let empty = BTreeSet::new();
        let ctx2 = ScriptContext {
            witnessing_keys: &empty,
            preimages: &[],
        };
        assert!(!script.evaluate::<Blake2bHasher>(&ctx2));
    }

    #[test]
    fn all_of_requires_every_branch() {
        let a = Hash28([1u8; 28]);
        let b = Hash28([2u8; 28]);
        let script = Script::AllOf(vec![Script::Signature(a), Script::Signature(b)]);
        let only_a: BTreeSet<Hash28> = [a].into_iter().collect();
        let ctx = ScriptContext {
            witnessing_keys: &only_a,
            preimages: &[],
        };
        assert!(!script.evaluate::<Blake2bHasher>(&ctx));

        let both: BTreeSet<Hash28> = [a, b].into_iter().collect();
        let ctx2 = ScriptContext {
            witnessing_keys: &both,
            preimages: &[],
        };
        assert!(script.evaluate::<Blake2bHasher>(&ctx2));
    }

    #[test]
    fn at_least_threshold() {
        let a = Hash28([1u8; 28]);
        let b = Hash28([2u8; 28]);
        let c = Hash28([3u8; 28]);
        let script = Script::AtLeast(2, vec![Script::Signature(a), Script::Signature(b), Script::Signature(c)]);
        let two: BTreeSet<Hash28> = [a, b].into_iter().collect();
        let ctx = ScriptContext {
            witnessing_keys: &two,
            preimages: &[],
        };
        assert!(script.evaluate::<Blake2bHasher>(&ctx));

        let one: BTreeSet<Hash28> = [a].into_iter().collect();
        let ctx2 = ScriptContext {
            witnessing_keys: &one,
            preimages: &[],
        };
        assert!(!script.evaluate::<Blake2bHasher>(&ctx2));
    }

    #[test]
    fn hash_lock_requires_matching_preimage() {
        let locked = Blake2bHasher::hash_28(b"secret");
        let script = Script::HashLock(locked);
        let empty = BTreeSet::new();
        let ctx = ScriptContext {
            witnessing_keys: &empty,
            preimages: &[(locked, b"secret".to_vec())],
        };
        assert!(script.evaluate::<Blake2bHasher>(&ctx));

        let ctx2 = ScriptContext {
            witnessing_keys: &empty,
            preimages: &[(locked, b"wrong".to_vec())],
        };
        assert!(!script.evaluate::<Blake2bHasher>(&ctx2));
    }
}
