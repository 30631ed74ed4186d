use super::Semiring;
use crate::feature::FeatureMap;

/// pairs ⟨p, p·f⟩ (§4.1): running a sum-product over this semiring yields
/// both the total probability mass of a forest and the expected feature
/// vector under that mass, which is exactly the gradient training needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    pub p: f64,
    pub pf: FeatureMap,
}

impl Expectation {
    pub fn new(p: f64, pf: FeatureMap) -> Self {
        Self { p, pf }
    }

    /// lift a bare probability with no attached features (an edge weight
    /// with no sparse-feature contribution).
    pub fn weight(p: f64) -> Self {
        Self {
            p,
            pf: FeatureMap::new(),
        }
    }
}

impl Semiring for Expectation {
    fn zero() -> Self {
        Self {
            p: 0.0,
            pf: FeatureMap::new(),
        }
    }
    fn one() -> Self {
        Self {
            p: 1.0,
            pf: FeatureMap::new(),
        }
    }
    fn plus(&self, other: &Self) -> Self {
        Self {
            p: self.p + other.p,
            pf: self.pf.clone().merge(&other.pf),
        }
    }
    fn times(&self, other: &Self) -> Self {
        let mut pf = FeatureMap::new();
        for (id, value) in self.pf.inner() {
            pf.add(*id, value * other.p);
        }
        for (id, value) in other.pf.inner() {
            pf.add(*id, value * self.p);
        }
        Self {
            p: self.p * other.p,
            pf,
        }
    }
}
