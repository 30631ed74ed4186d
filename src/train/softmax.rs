//! softmax / log-linear learner (§4.7): per segment, gradient =
//! `E_kbest[x] − E_oracle[x]`, scaled by 1/|batch|.

use crate::feature::FeatureMap;
use crate::oracle::Hypothesis;
use crate::scorer::Statistic;
use crate::weight::Weight;

use super::regularizer::Regularizer;
use super::schedule::Schedule;
use super::Learner;

pub struct Softmax<S: Statistic, Sch: Schedule> {
    segments: Vec<(Vec<Hypothesis<S>>, Vec<Hypothesis<S>>)>,
    schedule: Sch,
    regularizer: Regularizer,
}

impl<S: Statistic, Sch: Schedule> Softmax<S, Sch> {
    pub fn new(schedule: Sch, regularizer: Regularizer) -> Self {
        Self {
            segments: Vec::new(),
            schedule,
            regularizer,
        }
    }
}

/// softmax distribution over a hypothesis list under current weights, plus
/// its feature expectation.
fn expectation<S: Statistic>(hyps: &[Hypothesis<S>], weights: &Weight) -> FeatureMap {
    let scores: Vec<f64> = hyps.iter().map(|h| weights.dot(&h.features)).collect();
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|&s| (s - max).exp()).collect();
    let z: f64 = exps.iter().sum();

    let mut e_x = FeatureMap::new();
    for (hyp, &e) in hyps.iter().zip(&exps) {
        let p = e / z;
        for (id, value) in hyp.features.inner() {
            e_x.add(*id, p * value);
        }
    }
    e_x
}

impl<S: Statistic, Sch: Schedule> Learner<S> for Softmax<S, Sch> {
    fn encode(&mut self, kbest: &[Hypothesis<S>], oracle: &[Hypothesis<S>]) {
        if kbest.is_empty() || oracle.is_empty() {
            return;
        }
        self.segments.push((kbest.to_vec(), oracle.to_vec()));
    }

    fn learn(&mut self, weights: &mut Weight) -> f64 {
        if self.segments.is_empty() {
            return 0.0;
        }
        let eta = self.schedule.rate(0);
        let mut gradient = FeatureMap::new();
        let mut objective = 0.0;

        for (kbest, oracle) in &self.segments {
            let e_kbest = expectation(kbest, weights);
            let e_oracle = expectation(oracle, weights);
            for (id, value) in e_kbest.inner() {
                gradient.add(*id, *value);
            }
            for (id, value) in e_oracle.inner() {
                gradient.add(*id, -*value);
            }
            objective += weights.dot(&e_kbest) - weights.dot(&e_oracle);
        }

        let n = self.segments.len() as f64;
        weights.add_scaled(&gradient, -eta / n);
        self.regularizer.apply(weights, eta);

        self.schedule.advance_epoch();
        self.segments.clear();
        objective / n
    }
}
