//! Normal HERD (NHERD) learner (§4.7): diagonal covariance Σ, λ = 1/C in
//! the teacher's parameterization, α = max(0, (cost−margin)/(Σ+1/λ)).

use std::collections::HashMap;

use crate::oracle::Hypothesis;
use crate::scorer::Statistic;
use crate::weight::Weight;
use crate::FeatureId;

use super::{margin_instances, Instance, Learner};

fn variance(delta: &crate::feature::FeatureMap, covariance: &HashMap<FeatureId, f64>) -> f64 {
    delta
        .inner()
        .iter()
        .map(|(id, v)| v * v * covariance.get(id).copied().unwrap_or(1.0))
        .sum()
}

pub struct NHerd {
    instances: Vec<Instance>,
    covariance: HashMap<FeatureId, f64>,
    lambda: f64,
}

impl NHerd {
    /// `c` is the inverse of λ, matching the teacher's `lambda(1.0 / C)`.
    pub fn new(c: f64) -> Self {
        Self {
            instances: Vec::new(),
            covariance: HashMap::new(),
            lambda: 1.0 / c,
        }
    }
}

impl<S: Statistic> Learner<S> for NHerd {
    fn encode(&mut self, kbest: &[Hypothesis<S>], oracle: &[Hypothesis<S>]) {
        self.instances.extend(margin_instances(kbest, oracle));
    }

    fn learn(&mut self, weights: &mut Weight) -> f64 {
        if self.instances.is_empty() {
            return 0.0;
        }
        let mut objective = 0.0;
        for instance in &self.instances {
            let margin = weights.dot(&instance.delta);
            let suffered = instance.cost - margin;
            if suffered <= 0.0 {
                continue;
            }
            let var = variance(&instance.delta, &self.covariance);
            let alpha = (suffered / (var + 1.0 / self.lambda)).max(0.0);
            if alpha > 1e-12 {
                for (id, value) in instance.delta.inner() {
                    let cov = self.covariance.entry(*id).or_insert(1.0);
                    let var_i = *cov;
                    let updated = weights.get(*id) + alpha * value * var_i;
                    weights.set(*id, updated);
                    let denom = 1.0
                        + var_i
                            * (2.0 * self.lambda + self.lambda * self.lambda * var)
                            * value
                            * value;
                    *cov = var_i / denom;
                }
            }
            objective += suffered;
        }
        let n = self.instances.len() as f64;
        self.instances.clear();
        objective / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureMap;
    use crate::scorer::Bleu;

    fn hyp(feature: f64, loss: f64, sentence: &str) -> Hypothesis<Bleu> {
        let mut f = FeatureMap::new();
        f.add(0, feature);
        let mut h = Hypothesis::new(
            sentence.split_whitespace().map(String::from).collect(),
            f,
            Bleu::new([1, 0, 0, 0], [1, 0, 0, 0], 1),
        );
        h.loss = loss;
        h
    }

    #[test]
    fn covariance_shrinks_for_a_repeatedly_violated_feature() {
        let mut learner = NHerd::new(1.0);
        let mut weights = Weight::new();
        for _ in 0..3 {
            learner.encode(&[hyp(0.0, 1.0, "b")], &[hyp(1.0, 0.0, "a")]);
            learner.learn(&mut weights);
        }
        assert!(learner.covariance.get(&0).copied().unwrap_or(1.0) < 1.0);
    }
}
