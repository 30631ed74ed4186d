//! sparse feature-id -> scalar mapping (§3 "Weight vector (W)").
//!
//! dot-product with any [`crate::feature::FeatureMap`] is invariant under
//! addition of zero-valued entries: callers never need to prune zeros
//! before comparing two maps for equality of effect.

use crate::feature::FeatureMap;
use crate::FeatureId;
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// interned feature-id allocator. append-only after startup (§9): the one
/// piece of global mutable state the core assumes, modeled here as an
/// explicit, ownable table rather than a hidden `static` so callers control
/// its lifetime and thread-safety discipline.
#[derive(Default, Debug, Clone)]
pub struct IdTable {
    by_name: BTreeMap<String, FeatureId>,
    names: Vec<String>,
}

impl IdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// look up or allocate the id for `name`. idempotent.
    pub fn intern(&mut self, name: &str) -> FeatureId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = self.names.len() as FeatureId;
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn name(&self, id: FeatureId) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    pub fn id(&self, name: &str) -> Option<FeatureId> {
        self.by_name.get(name).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Weight(BTreeMap<FeatureId, f64>);

impl Weight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &BTreeMap<FeatureId, f64> {
        &self.0
    }

    pub fn get(&self, id: FeatureId) -> f64 {
        self.0.get(&id).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, id: FeatureId, value: f64) {
        self.0.insert(id, value);
    }

    /// add `delta` scaled by `scale` in place.
    pub fn add_scaled(&mut self, delta: &FeatureMap, scale: f64) {
        for (&id, &value) in delta.inner() {
            *self.0.entry(id).or_insert(0.0) += value * scale;
        }
    }

    /// multiplicative decay of every coordinate (used by L2 rescaling).
    pub fn scale(&mut self, factor: f64) {
        for value in self.0.values_mut() {
            *value *= factor;
        }
    }

    pub fn dot(&self, features: &FeatureMap) -> f64 {
        features
            .inner()
            .iter()
            .map(|(id, value)| self.get(*id) * value)
            .sum()
    }

    pub fn l1_norm(&self) -> f64 {
        self.0.values().map(|v| v.abs()).sum()
    }

    pub fn l2_norm(&self) -> f64 {
        self.0.values().map(|v| v * v).sum::<f64>().sqrt()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, f64)> + '_ {
        self.0.iter().map(|(&id, &v)| (id, v))
    }
}

impl From<BTreeMap<FeatureId, f64>> for Weight {
    fn from(map: BTreeMap<FeatureId, f64>) -> Self {
        Self(map)
    }
}

impl AddAssign<&Weight> for Weight {
    fn add_assign(&mut self, rhs: &Weight) {
        for (&id, &value) in rhs.0.iter() {
            *self.0.entry(id).or_insert(0.0) += value;
        }
    }
}

impl Add<&Weight> for Weight {
    type Output = Weight;
    fn add(mut self, rhs: &Weight) -> Weight {
        self += rhs;
        self
    }
}

impl SubAssign<&Weight> for Weight {
    fn sub_assign(&mut self, rhs: &Weight) {
        for (&id, &value) in rhs.0.iter() {
            *self.0.entry(id).or_insert(0.0) -= value;
        }
    }
}

impl Sub<&Weight> for Weight {
    type Output = Weight;
    fn sub(mut self, rhs: &Weight) -> Weight {
        self -= rhs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_product_ignores_zero_entries() {
        let mut w = Weight::new();
        w.set(0, 2.0);
        w.set(1, 0.0);
        let mut f = FeatureMap::new();
        f.add(0, 3.0);
        f.add(1, 100.0);
        assert_eq!(w.dot(&f), 6.0);
    }

    #[test]
    fn intern_is_idempotent() {
        let mut table = IdTable::new();
        let a = table.intern("lm");
        let b = table.intern("lm");
        let c = table.intern("distortion");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.name(a), Some("lm"));
    }
}
