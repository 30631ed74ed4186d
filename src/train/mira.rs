//! MIRA / PA learner (§4.7): per-instance closed-form step
//! `α = clip(cost/‖x‖², [0, 1/λ])`. The spec gives margin-infused
//! regularized adaptation (MIRA) and passive-aggressive-I the same closed
//! form, so one type serves both: callers name their `λ` to taste (`λ → 0`
//! recovers unconstrained PA).

use crate::error::{Error, Result};
use crate::oracle::Hypothesis;
use crate::scorer::Statistic;
use crate::weight::Weight;

use super::{dot_features, margin_instances, Instance, Learner};

pub struct Mira {
    instances: Vec<Instance>,
    lambda: f64,
}

impl Mira {
    pub fn new(lambda: f64) -> Result<Self> {
        if lambda <= 0.0 {
            return Err(Error::InvalidConfig("MIRA lambda must be > 0".into()));
        }
        Ok(Self {
            instances: Vec::new(),
            lambda,
        })
    }
}

impl<S: Statistic> Learner<S> for Mira {
    fn encode(&mut self, kbest: &[Hypothesis<S>], oracle: &[Hypothesis<S>]) {
        self.instances.extend(margin_instances(kbest, oracle));
    }

    fn learn(&mut self, weights: &mut Weight) -> f64 {
        if self.instances.is_empty() {
            return 0.0;
        }
        let constant = 1.0 / self.lambda;
        let mut objective = 0.0;
        for instance in &self.instances {
            let margin = weights.dot(&instance.delta);
            let suffered = instance.cost - margin;
            if suffered <= 0.0 {
                continue;
            }
            let variance = dot_features(&instance.delta, &instance.delta);
            if variance <= 0.0 {
                continue;
            }
            let alpha = (suffered / variance).min(constant);
            weights.add_scaled(&instance.delta, alpha);
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
    fn step_is_bounded_by_one_over_lambda() {
        let mut learner = Mira::new(10.0).unwrap();
        learner.encode(&[hyp(0.001, 100.0, "b")], &[hyp(1.0, 0.0, "a")]);
        let mut weights = Weight::new();
        learner.learn(&mut weights);
        assert!(weights.get(0) <= 0.1 + 1e-9);
    }
}
