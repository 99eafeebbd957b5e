//! Serde helpers for map types keyed by a struct/enum rather than a string
//! or number. `serde_json` only accepts primitive string/number map keys
//! (see [`crate::value::Value`]'s doc comment); every other map-like type
//! keyed by a domain type (`Hash28`, `Credential`, `RewardAccount`, `TxIn`,
//! ...) goes through this `Vec<(K, V)>` wire encoding instead of the derived
//! one so it survives a JSON round trip, which is how the CLI fixtures and
//! any other JSON-speaking consumer actually exercise these types.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S, K, V>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    K: Serialize,
    V: Serialize,
{
    map.iter().collect::<Vec<(&K, &V)>>().serialize(serializer)
}

pub fn deserialize<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
{
    let pairs = Vec::<(K, V)>::deserialize(deserializer)?;
    Ok(pairs.into_iter().collect())
}

/// Same encoding for `im::HashMap`, used by [`crate::utxo::UTxO`].
pub mod im_hashmap {
    use super::*;
    use std::hash::Hash;

    pub fn serialize<S, K, V>(map: &im::HashMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        K: Serialize + Eq + Hash + Clone,
        V: Serialize + Clone,
    {
        map.iter().collect::<Vec<(&K, &V)>>().serialize(serializer)
    }

    pub fn deserialize<'de, D, K, V>(deserializer: D) -> Result<im::HashMap<K, V>, D::Error>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de> + Eq + Hash + Clone,
        V: Deserialize<'de> + Clone,
    {
        let pairs = Vec::<(K, V)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}
