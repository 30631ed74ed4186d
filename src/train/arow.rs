//! AROW learner (§4.7): maintains a diagonal covariance Σ (default 1.0 per
//! coordinate); on a violation, `β = 1/(variance+λ)`, `α = max(0, suffered·β)`,
//! updates `w[i] += α·x_i·Σ[i]` and shrinks `Σ[i] -= β·Σ[i]²·x_i²`.

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

pub struct Arow {
    instances: Vec<Instance>,
    covariance: HashMap<FeatureId, f64>,
    lambda: f64,
}

impl Arow {
    pub fn new(lambda: f64) -> Self {
        Self {
            instances: Vec::new(),
            covariance: HashMap::new(),
            lambda,
        }
    }
}

impl<S: Statistic> Learner<S> for Arow {
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
            let beta = 1.0 / (var + self.lambda);
            let alpha = (suffered * beta).max(0.0);
            if alpha > 1e-12 {
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
