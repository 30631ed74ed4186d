//! online training core (§4.7): learners share an encode/learn contract,
//! pluggable regularizers ([`regularizer`]) and learning-rate schedules
//! ([`schedule`]). Margin-based learners (hinge, optimized-hinge, MIRA/PA,
//! AROW, CW, NHERD) consume pairwise oracle/k-best instances distilled by
//! [`margin_instances`]; the expectation-based learners (softmax,
//! expected-loss, xBLEU) consume whole k-best/oracle lists per segment and
//! differentiate through the current weights at `learn()` time.

pub mod arow;
pub mod cw;
pub mod expected_loss;
pub mod hinge;
pub mod mira;
pub mod nherd;
pub mod optimized_hinge;
pub mod regularizer;
pub mod schedule;
pub mod softmax;
pub mod xbleu;

pub use regularizer::{Regularizer, RegularizerKind};
pub use schedule::Schedule;

use std::collections::HashSet;

use crate::feature::FeatureMap;
use crate::oracle::Hypothesis;
use crate::scorer::Statistic;
use crate::weight::Weight;
use crate::FeatureId;

/// one margin instance distilled from an (oracle, k-best) pair (§4.7):
/// `delta = oracle.features - candidate.features`, `cost = candidate.loss -
/// oracle.loss`.
#[derive(Debug, Clone)]
pub struct Instance {
    pub delta: FeatureMap,
    pub cost: f64,
}

/// common learner contract (§4.7): `encode` accumulates training data from
/// one segment's k-best/oracle lists; `learn` applies one update step over
/// everything accumulated since the last call and returns an objective
/// value; `initialize`/`finalize` bracket a deferred weight-rescale
/// discipline some regularized variants use.
pub trait Learner<S: Statistic> {
    fn initialize(&mut self, _weights: &mut Weight) {}

    fn encode(&mut self, kbest: &[Hypothesis<S>], oracle: &[Hypothesis<S>]);

    /// one learn() call without any encoded data returns objective 0 and
    /// leaves weights unchanged (§8 learner contract).
    fn learn(&mut self, weights: &mut Weight) -> f64;

    fn finalize(&mut self, _weights: &mut Weight) {}
}

/// distill pairwise margin instances from a segment's k-best/oracle lists,
/// mirroring the teacher's online-margin encoding: every (oracle, k-best)
/// pair whose k-best candidate is not itself one of the oracle sentences,
/// whose cost (`kbest.loss - oracle.loss`) is positive, and whose feature
/// delta is non-empty contributes one instance.
pub fn margin_instances<S: Statistic>(
    kbest: &[Hypothesis<S>],
    oracle: &[Hypothesis<S>],
) -> Vec<Instance> {
    if kbest.is_empty() || oracle.is_empty() {
        return Vec::new();
    }
    let oracle_sentences: HashSet<&[String]> =
        oracle.iter().map(|h| h.tokens.as_slice()).collect();

    let mut instances = Vec::new();
    for o in oracle {
        for k in kbest {
            if oracle_sentences.contains(k.tokens.as_slice()) {
                continue;
            }
            let cost = k.loss - o.loss;
            if cost <= 0.0 {
                continue;
            }
            let delta = margin_delta(&o.features, &k.features);
            if delta.is_empty() {
                continue;
            }
            instances.push(Instance { delta, cost });
        }
    }
    instances
}

fn margin_delta(oracle: &FeatureMap, kbest: &FeatureMap) -> FeatureMap {
    use std::collections::BTreeMap;
    let mut merged: BTreeMap<FeatureId, f64> = BTreeMap::new();
    for (&id, &v) in oracle.inner() {
        merged.insert(id, v);
    }
    for (&id, &v) in kbest.inner() {
        *merged.entry(id).or_insert(0.0) -= v;
    }
    merged.retain(|_, v| *v != 0.0);
    FeatureMap::from(merged)
}

/// sparse dot product between two feature maps.
pub fn dot_features(a: &FeatureMap, b: &FeatureMap) -> f64 {
    let (small, large) = if a.inner().len() <= b.inner().len() {
        (a, b)
    } else {
        (b, a)
    };
    small
        .inner()
        .iter()
        .map(|(id, value)| value * large.get(*id))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::Bleu;

    fn hyp(tokens: &str, feature: f64, loss: f64) -> Hypothesis<Bleu> {
        let mut f = FeatureMap::new();
        f.add(0, feature);
        let mut h = Hypothesis::new(
            tokens.split_whitespace().map(String::from).collect(),
            f,
            Bleu::new([1, 0, 0, 0], [1, 0, 0, 0], 1),
        );
        h.loss = loss;
        h
    }

    #[test]
    fn margin_instances_skip_oracle_sentences_and_nonpositive_cost() {
        let oracle = vec![hyp("a", 1.0, 0.1)];
        let kbest = vec![hyp("a", 1.0, 0.1), hyp("b", 2.0, 0.5)];
        let instances = margin_instances(&kbest, &oracle);
        assert_eq!(instances.len(), 1);
        assert!((instances[0].cost - 0.4).abs() < 1e-12);
    }
}
