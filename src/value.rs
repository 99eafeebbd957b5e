//! Multi-asset value algebra (§4.A).
//!
//! A `Value` is a finite mapping from asset id to signed quantity. The base
//! asset (ADA-equivalent coin) is keyed by [`AssetId::ADA`]. `Value` forms a
//! commutative monoid under [`Value::add`] with identity [`Value::zero`], and
//! a componentwise partial order via [`Value::leq`].

use std::collections::BTreeMap;
use std::ops::Neg;

use serde::{Deserialize, Serialize};

/// A non-negative quantity of the base asset. 64-bit is sufficient in
/// practice; the spec does not guarantee that bound, so arithmetic here is
/// checked rather than wrapping.
pub type Coin = u64;

/// Hash of a minting policy script. The base asset uses the reserved
/// all-zero policy hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PolicyId(pub [u8; 28]);

impl PolicyId {
    /// Reserved null policy identifying the base asset (ADA-equivalent coin).
    pub const ADA: PolicyId = PolicyId([0u8; 28]);
}

/// An asset, identified by its minting policy and an arbitrary name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId {
    pub policy: PolicyId,
    pub name: Vec<u8>,
}

impl AssetId {
    /// The base asset id: null policy, empty name.
    pub fn ada() -> Self {
        AssetId {
            policy: PolicyId::ADA,
            name: Vec::new(),
        }
    }

    pub fn is_ada(&self) -> bool {
        self.policy == PolicyId::ADA
    }
}

/// A finite, signed, multi-asset value. Zero-quantity entries are never
/// stored: `Value` equality and the monoid laws depend on this invariant, so
/// every mutating operation normalizes it away.
///
/// `Serialize`/`Deserialize` go through a `Vec<(AssetId, i128)>` rather than
/// the derived `BTreeMap` encoding: `AssetId` is a struct, and `serde_json`
/// (the format the CLI fixtures and RPC-style consumers actually use) only
/// accepts string map keys, so the derived impl panics on any non-empty
/// `Value` the moment it crosses a JSON boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value(BTreeMap<AssetId, i128>);

impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let pairs: Vec<(&AssetId, &i128)> = self.0.iter().collect();
        pairs.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs = Vec::<(AssetId, i128)>::deserialize(deserializer)?;
        Ok(Value(pairs.into_iter().collect()))
    }
}

impl Value {
    /// The monoid identity: no components at all.
    pub fn zero() -> Self {
        Value(BTreeMap::new())
    }

    /// Lift a plain coin amount into a single-component `Value`.
    pub fn of_coin(coin: Coin) -> Self {
        let mut map = BTreeMap::new();
        if coin != 0 {
            map.insert(AssetId::ada(), coin as i128);
        }
        Value(map)
    }

    /// Construct a value from raw components, dropping zero entries.
    pub fn from_components(components: impl IntoIterator<Item = (AssetId, i128)>) -> Self {
        let mut map = BTreeMap::new();
        for (asset, qty) in components {
            if qty != 0 {
                map.insert(asset, qty);
            }
        }
        Value(map)
    }

    /// Project the base-asset component out of a value.
    pub fn coin(&self) -> Coin {
        let raw = self.0.get(&AssetId::ada()).copied().unwrap_or(0);
        raw.max(0) as Coin
    }

    /// Signed base-asset component, without clamping to non-negative. Used
    /// internally by the conservation equation where `forge` may be negative.
    pub fn coin_signed(&self) -> i128 {
        self.0.get(&AssetId::ada()).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &i128)> {
        self.0.iter()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Componentwise addition. Commutative and associative; verified by
    /// property tests below.
    pub fn add(&self, other: &Value) -> Value {
        let mut out = self.0.clone();
        for (asset, qty) in other.0.iter() {
            let entry = out.entry(asset.clone()).or_insert(0);
            *entry += qty;
            if *entry == 0 {
                out.remove(asset);
            }
        }
        Value(out)
    }

    /// Componentwise negation.
    pub fn negate(&self) -> Value {
        Value(self.0.iter().map(|(a, q)| (a.clone(), -q)).collect())
    }

    pub fn sub(&self, other: &Value) -> Value {
        self.add(&other.negate())
    }

    /// `self <= other` componentwise over the union of both supports.
    pub fn leq(&self, other: &Value) -> bool {
        let mut assets: std::collections::BTreeSet<&AssetId> = self.0.keys().collect();
        assets.extend(other.0.keys());
        assets
            .into_iter()
            .all(|a| self.component(a) <= other.component(a))
    }

    fn component(&self, asset: &AssetId) -> i128 {
        self.0.get(asset).copied().unwrap_or(0)
    }

    /// True iff every component of this value is strictly positive. A value
    /// with no components at all is *not* positive: outputs must carry real
    /// value (§4.A, §8 property 5).
    pub fn is_positive(&self) -> bool {
        !self.0.is_empty() && self.0.values().all(|q| *q > 0)
    }

    /// Sum of an iterator of values via repeated [`Value::add`].
    pub fn sum<'a>(values: impl IntoIterator<Item = &'a Value>) -> Value {
        values.into_iter().fold(Value::zero(), |acc, v| acc.add(v))
    }
}

impl Neg for Value {
    type Output = Value;
    fn neg(self) -> Value {
        self.negate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_asset() -> impl Strategy<Value = AssetId> {
        prop_oneof![
            Just(AssetId::ada()),
            (any::<[u8; 28]>(), prop::collection::vec(any::<u8>(), 0..4)).prop_map(
                |(policy, name)| AssetId {
                    policy: PolicyId(policy),
                    name,
                }
            ),
        ]
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop::collection::vec((arb_asset(), -1000i128..1000i128), 0..6)
            .prop_map(Value::from_components)
    }

    #[test]
    fn zero_is_identity() {
        let v = Value::of_coin(42);
        assert_eq!(v.add(&Value::zero()), v);
        assert_eq!(Value::zero().add(&v), v);
    }

    #[test]
    fn coin_projection_roundtrips() {
        let v = Value::of_coin(7);
        assert_eq!(v.coin(), 7);
    }

    #[test]
    fn positive_values_sum_positive() {
        let a = Value::of_coin(5);
        let b = Value::of_coin(3);
        assert!(a.add(&b).is_positive());
    }

    proptest! {
        #[test]
        fn add_is_commutative(a in arb_value(), b in arb_value()) {
            prop_assert_eq!(a.add(&b), b.add(&a));
        }

        #[test]
        fn add_is_associative(a in arb_value(), b in arb_value(), c in arb_value()) {
            prop_assert_eq!(a.add(&b).add(&c), a.add(&b.add(&c)));
        }

        #[test]
        fn zero_identity_holds(a in arb_value()) {
            prop_assert_eq!(a.add(&Value::zero()), a.clone());
        }

        #[test]
        fn negate_is_inverse(a in arb_value()) {
            prop_assert!(a.add(&a.negate()).is_zero());
        }

        #[test]
        fn leq_reflexive(a in arb_value()) {
            prop_assert!(a.leq(&a));
        }
    }
}
