//! confidence-weighted (CW) learner (§4.7): closed-form per-instance update
//! solving the CW quadratic program directly via its standard θ/α/β
//! closed form, with a diagonal covariance Σ (default 1.0 per coordinate).

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

pub struct Cw {
    instances: Vec<Instance>,
    covariance: HashMap<FeatureId, f64>,
    lambda: f64,
}

impl Cw {
    pub fn new(lambda: f64) -> Self {
        Self {
            instances: Vec::new(),
            covariance: HashMap::new(),
            lambda,
        }
    }
}

impl<S: Statistic> Learner<S> for Cw {
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
            let cost = instance.cost;
            let suffered = cost - margin;
            if suffered <= 0.0 {
                continue;
            }
            let variance = variance(&instance.delta, &self.covariance);
            if variance <= 0.0 {
                continue;
            }

            let theta = 1.0 + 2.0 * self.lambda * (margin - cost);
            let discriminant =
                (theta * theta - 8.0 * self.lambda * (margin - cost - self.lambda * variance))
                    .max(0.0);
            let alpha = (-theta + discriminant.sqrt()) / (4.0 * self.lambda * variance);
            let beta = (2.0 * alpha * self.lambda) / (1.0 + 2.0 * alpha * self.lambda * variance);

            if alpha > 1e-12 && beta > 0.0 {
                for (id, value) in instance.delta.inner() {
                    let cov = self.covariance.entry(*id).or_insert(1.0);
                    let var_i = *cov;
                    let updated = weights.get(*id) + alpha * value * var_i;
                    weights.set(*id, updated);
                    *cov -= beta * (var_i * var_i) * (value * value);
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
    fn learn_without_data_is_a_no_op() {
        let mut learner = Cw::new(1.0);
        let mut weights = Weight::new();
        weights.set(0, 1.0);
        let objective = <Cw as Learner<Bleu>>::learn(&mut learner, &mut weights);
        assert_eq!(objective, 0.0);
        assert_eq!(weights.get(0), 1.0);
    }

    #[test]
    fn violation_moves_weight_towards_oracle_feature() {
        let mut learner = Cw::new(1.0);
        learner.encode(&[hyp(0.0, 1.0, "b")], &[hyp(1.0, 0.0, "a")]);
        let mut weights = Weight::new();
        learner.learn(&mut weights);
        assert!(weights.get(0) >= 0.0);
    }
}
