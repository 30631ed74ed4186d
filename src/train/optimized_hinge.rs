//! optimized (batch) hinge learner (§4.7): solves a per-batch dual
//! coordinate-descent QP enforcing `α ≥ 0` and an upper bound derived from
//! η, then updates `w += Σ αᵢ xᵢ`.

use crate::oracle::Hypothesis;
use crate::scorer::Statistic;
use crate::weight::Weight;

use super::schedule::Schedule;
use super::{dot_features, margin_instances, Instance, Learner};

pub struct OptimizedHinge<Sch: Schedule> {
    instances: Vec<Instance>,
    schedule: Sch,
    lambda: f64,
    tolerance: f64,
    max_iterations: usize,
}

impl<Sch: Schedule> OptimizedHinge<Sch> {
    pub fn new(schedule: Sch, lambda: f64) -> Self {
        Self {
            instances: Vec::new(),
            schedule,
            lambda,
            tolerance: 1e-4,
            max_iterations: 50,
        }
    }
}

impl<S: Statistic, Sch: Schedule> Learner<S> for OptimizedHinge<Sch> {
    fn encode(&mut self, kbest: &[Hypothesis<S>], oracle: &[Hypothesis<S>]) {
        self.instances.extend(margin_instances(kbest, oracle));
    }

    fn learn(&mut self, weights: &mut Weight) -> f64 {
        if self.instances.is_empty() {
            return 0.0;
        }
        let n = self.instances.len();
        let eta = self.schedule.rate(0);
        let upper = eta / self.lambda.max(1e-12);

        let h_ii: Vec<f64> = self
            .instances
            .iter()
            .map(|inst| dot_features(&inst.delta, &inst.delta).max(1e-12))
            .collect();
        let mut alpha = vec![0.0f64; n];

        for _ in 0..self.max_iterations {
            let mut moved = 0.0;
            for i in 0..n {
                let margin_i: f64 = (0..n)
                    .map(|j| alpha[j] * dot_features(&self.instances[i].delta, &self.instances[j].delta))
                    .sum();
                let gradient = margin_i - self.instances[i].cost;
                let candidate = (alpha[i] - gradient / h_ii[i]).clamp(0.0, upper);
                moved += (candidate - alpha[i]).abs();
                alpha[i] = candidate;
            }
            if moved < self.tolerance {
                break;
            }
        }

        let mut objective = 0.0;
        for (i, instance) in self.instances.iter().enumerate() {
            if alpha[i] > 0.0 {
                weights.add_scaled(&instance.delta, alpha[i]);
                objective += alpha[i] * instance.cost;
            }
        }

        self.schedule.advance_epoch();
        self.instances.clear();
        objective / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureMap;
    use crate::scorer::Bleu;
    use crate::train::schedule::Simple;

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
        let mut learner = OptimizedHinge::new(Simple::new(0.1), 1.0);
        let mut weights = Weight::new();
        weights.set(0, 1.0);
        let objective = <OptimizedHinge<Simple> as Learner<Bleu>>::learn(&mut learner, &mut weights);
        assert_eq!(objective, 0.0);
        assert_eq!(weights.get(0), 1.0);
    }

    #[test]
    fn multipliers_stay_within_bounds() {
        let mut learner = OptimizedHinge::new(Simple::new(0.1), 1.0);
        learner.encode(&[hyp(0.0, 1.0, "b")], &[hyp(1.0, 0.0, "a")]);
        let mut weights = Weight::new();
        let objective = learner.learn(&mut weights);
        assert!(objective >= 0.0);
    }
}
