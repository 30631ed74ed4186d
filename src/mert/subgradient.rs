//! sub-gradient line-search variant (§4.9): used in place of the full
//! envelope when a piecewise-linear hinge loss (not BLEU) drives the
//! choice. Each margin [`Instance`] contributes a single hinge term
//! `max(0, cost - (w + k·d)·delta)`; the sum of hinges is convex and
//! piecewise-linear in `k`, so its sub-gradient is non-decreasing and the
//! minimizer is the smallest `k` at which the aggregate sub-gradient is
//! no longer negative.

use crate::feature::FeatureMap;
use crate::train::{dot_features, Instance};
use crate::weight::Weight;

fn subgradient_at(instances: &[Instance], origin: &Weight, direction: &FeatureMap, k: f64) -> f64 {
    instances
        .iter()
        .filter_map(|instance| {
            let slope = dot_features(direction, &instance.delta);
            let intercept = origin.dot(&instance.delta);
            let active = instance.cost - (intercept + k * slope) > 0.0;
            active.then_some(-slope)
        })
        .sum()
}

/// smallest `k` in `[k_min, k_max]` at which the aggregate sub-gradient
/// changes sign from negative to non-negative. Each instance contributes
/// at most one breakpoint (where its hinge turns on or off); candidates
/// are `k_min`, every in-range breakpoint, and `k_max`, evaluated in
/// ascending order since convexity guarantees the first non-negative
/// sub-gradient is the minimizer.
pub fn optimum(
    instances: &[Instance],
    origin: &Weight,
    direction: &FeatureMap,
    k_min: f64,
    k_max: f64,
) -> f64 {
    let mut breakpoints: Vec<f64> = instances
        .iter()
        .filter_map(|instance| {
            let slope = dot_features(direction, &instance.delta);
            if slope == 0.0 {
                return None;
            }
            let intercept = origin.dot(&instance.delta);
            Some((instance.cost - intercept) / slope)
        })
        .filter(|&k| k > k_min && k < k_max)
        .collect();
    breakpoints.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let mut candidates = vec![k_min];
    candidates.extend(breakpoints);
    candidates.push(k_max);

    for k in candidates {
        if subgradient_at(instances, origin, direction, k) >= 0.0 {
            return k;
        }
    }
    k_max
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(slope: f64, cost: f64) -> Instance {
        let mut delta = FeatureMap::new();
        delta.add(0, 1.0);
        let _ = slope; // direction carries the slope; delta is the unit probe.
        Instance { delta, cost }
    }

    #[test]
    fn single_hinge_turns_off_at_its_cost() {
        let origin = Weight::new();
        let mut direction = FeatureMap::new();
        direction.add(0, 1.0);
        let instances = vec![instance(1.0, 1.0)];

        let k = optimum(&instances, &origin, &direction, 0.0, 2.0);
        assert!((k - 1.0).abs() < 1e-9);
    }

    #[test]
    fn no_instances_returns_k_min() {
        let origin = Weight::new();
        let direction = FeatureMap::new();
        let k = optimum(&[], &origin, &direction, 0.3, 1.7);
        assert!((k - 0.3).abs() < 1e-9);
    }
}
