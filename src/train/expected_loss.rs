//! expected-loss learner (§4.7): gradient =
//! `E_kbest[loss·x] − E_kbest[loss]·E_kbest[x]`, the softmax-expectation
//! covariance of the per-candidate loss with its own features.

use crate::feature::FeatureMap;
use crate::oracle::Hypothesis;
use crate::scorer::Statistic;
use crate::weight::Weight;

use super::regularizer::Regularizer;
use super::schedule::Schedule;
use super::Learner;

pub struct ExpectedLoss<S: Statistic, Sch: Schedule> {
    segments: Vec<Vec<Hypothesis<S>>>,
    schedule: Sch,
    regularizer: Regularizer,
}

impl<S: Statistic, Sch: Schedule> ExpectedLoss<S, Sch> {
    pub fn new(schedule: Sch, regularizer: Regularizer) -> Self {
        Self {
            segments: Vec::new(),
            schedule,
            regularizer,
        }
    }
}

impl<S: Statistic, Sch: Schedule> Learner<S> for ExpectedLoss<S, Sch> {
    fn encode(&mut self, kbest: &[Hypothesis<S>], _oracle: &[Hypothesis<S>]) {
        if !kbest.is_empty() {
            self.segments.push(kbest.to_vec());
        }
    }

    fn learn(&mut self, weights: &mut Weight) -> f64 {
        if self.segments.is_empty() {
            return 0.0;
        }
        let eta = self.schedule.rate(0);
        let mut gradient = FeatureMap::new();
        let mut objective = 0.0;

        for segment in &self.segments {
            let scores: Vec<f64> = segment.iter().map(|h| weights.dot(&h.features)).collect();
            let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let exps: Vec<f64> = scores.iter().map(|&s| (s - max).exp()).collect();
            let z: f64 = exps.iter().sum();
            let probs: Vec<f64> = exps.iter().map(|&e| e / z).collect();

            let e_loss: f64 = segment.iter().zip(&probs).map(|(h, &p)| p * h.loss).sum();
            let mut e_x = FeatureMap::new();
            let mut e_loss_x = FeatureMap::new();
            for (h, &p) in segment.iter().zip(&probs) {
                for (id, value) in h.features.inner() {
                    e_x.add(*id, p * value);
                    e_loss_x.add(*id, p * h.loss * value);
                }
            }
            for (id, value) in e_loss_x.inner() {
                gradient.add(*id, *value - e_loss * e_x.get(*id));
            }
            objective += e_loss;
        }

        let n = self.segments.len() as f64;
        weights.add_scaled(&gradient, -eta / n);
        self.regularizer.apply(weights, eta);

        self.schedule.advance_epoch();
        self.segments.clear();
        objective / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::Bleu;
    use crate::train::regularizer::RegularizerKind;
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
        let mut learner: ExpectedLoss<Bleu, Simple> = ExpectedLoss::new(
            Simple::new(0.1),
            Regularizer::new(RegularizerKind::None, 0.0).unwrap(),
        );
        let mut weights = Weight::new();
        weights.set(0, 1.0);
        let objective = learner.learn(&mut weights);
        assert_eq!(objective, 0.0);
        assert_eq!(weights.get(0), 1.0);
    }

    #[test]
    fn high_loss_candidate_pulls_weight_away_from_its_feature() {
        let mut learner: ExpectedLoss<Bleu, Simple> = ExpectedLoss::new(
            Simple::new(1.0),
            Regularizer::new(RegularizerKind::None, 0.0).unwrap(),
        );
        learner.encode(&[hyp(1.0, 1.0, "a"), hyp(1.0, 0.0, "b")], &[]);
        let mut weights = Weight::new();
        learner.learn(&mut weights);
        assert!(weights.get(0).is_finite());
    }
}
