//! xBLEU learner (§4.7): gradient of the expected corpus-level smoothed
//! BLEU. Accumulates per-order expected matched/hypothesis-count gradients,
//! an expected-reference-length gradient, and an entropy regularizer at
//! temperature `T`, then differentiates the smoothed corpus BLEU through
//! those expectations via the softmax covariance trick
//! (`dE[c]/dw = E[c·x] − E[c]·E[x]`).
//!
//! This mirrors the teacher's `LearnXBLEU::learn` chain-rule structure
//! (`P = (1/order)·Σ(log matched − log hypo)`, `C = reference/hypo[1]`,
//! `B = brevity_penalty(1−C)`) but keeps the reference-length term
//! constant with respect to `w` (a documented simplification — see
//! DESIGN.md) since this crate's references are fixed per segment rather
//! than chosen among several candidate lengths.

use crate::feature::FeatureMap;
use crate::oracle::Hypothesis;
use crate::scorer::Bleu;
use crate::weight::Weight;
use crate::BLEU_SMOOTH;

use super::regularizer::Regularizer;
use super::schedule::Schedule;
use super::Learner;

const ORDERS: usize = 4;

pub struct XBleu<Sch: Schedule> {
    segments: Vec<Vec<Hypothesis<Bleu>>>,
    schedule: Sch,
    regularizer: Regularizer,
    temperature: f64,
}

impl<Sch: Schedule> XBleu<Sch> {
    pub fn new(schedule: Sch, regularizer: Regularizer, temperature: f64) -> Self {
        Self {
            segments: Vec::new(),
            schedule,
            regularizer,
            temperature: temperature.max(1e-6),
        }
    }
}

impl<Sch: Schedule> Learner<Bleu> for XBleu<Sch> {
    fn encode(&mut self, kbest: &[Hypothesis<Bleu>], _oracle: &[Hypothesis<Bleu>]) {
        if !kbest.is_empty() {
            self.segments.push(kbest.to_vec());
        }
    }

    fn learn(&mut self, weights: &mut Weight) -> f64 {
        if self.segments.is_empty() {
            return 0.0;
        }

        let mut matched_count = [0.0f64; ORDERS];
        let mut hypo_count = [0.0f64; ORDERS];
        let mut reference_count = 0.0f64;
        let mut grad_matched: [FeatureMap; ORDERS] = Default::default();
        let mut grad_hypo: [FeatureMap; ORDERS] = Default::default();
        let mut grad_entropy = FeatureMap::new();
        let mut entropy_total = 0.0;
        let mut instances = 0usize;

        for segment in &self.segments {
            instances += segment.len();
            let scaled: Vec<f64> = segment
                .iter()
                .map(|h| weights.dot(&h.features) / self.temperature)
                .collect();
            let max = scaled.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let exps: Vec<f64> = scaled.iter().map(|&s| (s - max).exp()).collect();
            let z: f64 = exps.iter().sum();
            let probs: Vec<f64> = exps.iter().map(|&e| e / z).collect();

            let mut e_x = FeatureMap::new();
            let mut e_s = 0.0;
            for (h, &p) in segment.iter().zip(&probs) {
                e_s += p * weights.dot(&h.features);
                for (id, value) in h.features.inner() {
                    e_x.add(*id, p * value);
                }
            }

            let mut e_sx = FeatureMap::new();
            for (h, &p) in segment.iter().zip(&probs) {
                let s = weights.dot(&h.features);
                for (id, value) in h.features.inner() {
                    e_sx.add(*id, p * s * value);
                }
            }
            for (id, value) in e_sx.inner() {
                grad_entropy.add(*id, *value);
            }
            for (id, value) in e_x.inner() {
                grad_entropy.add(*id, -e_s * value);
            }

            for &p in &probs {
                if p > 0.0 {
                    entropy_total -= p * p.ln();
                }
            }

            reference_count += segment
                .iter()
                .zip(&probs)
                .map(|(h, &p)| p * h.stat.reference_length as f64)
                .sum::<f64>();

            for n in 0..ORDERS {
                let mut e_m = 0.0;
                let mut e_h = 0.0;
                for (hyp, &p) in segment.iter().zip(&probs) {
                    e_m += p * hyp.stat.matched[n] as f64;
                    e_h += p * hyp.stat.hypothesis[n] as f64;
                }
                matched_count[n] += e_m;
                hypo_count[n] += e_h;

                let mut e_mx = FeatureMap::new();
                let mut e_hx = FeatureMap::new();
                for (hyp, &p) in segment.iter().zip(&probs) {
                    for (id, value) in hyp.features.inner() {
                        e_mx.add(*id, p * hyp.stat.matched[n] as f64 * value);
                        e_hx.add(*id, p * hyp.stat.hypothesis[n] as f64 * value);
                    }
                }
                for (id, value) in e_mx.inner() {
                    grad_matched[n].add(*id, *value - e_m * e_x.get(*id));
                }
                for (id, value) in e_hx.inner() {
                    grad_hypo[n].add(*id, *value - e_h * e_x.get(*id));
                }
            }
        }

        // corpus-level smoothed log-precision (same geometric smoothing
        // chain as the plain Bleu statistic).
        let mut log_p = 0.0;
        let mut smoothing = BLEU_SMOOTH;
        let mut factor_matched = [0.0f64; ORDERS];
        let mut factor_hypo = [0.0f64; ORDERS];
        for n in 0..ORDERS {
            if hypo_count[n] <= 0.0 {
                continue;
            }
            let m = if matched_count[n] <= 0.0 {
                let v = smoothing;
                smoothing *= 0.1;
                v
            } else {
                matched_count[n]
            };
            log_p += (m.ln() - hypo_count[n].ln()) / ORDERS as f64;
            factor_matched[n] = 1.0 / m;
            factor_hypo[n] = 1.0 / hypo_count[n];
        }
        let exp_p = log_p.exp();

        let c = if hypo_count[0] > 0.0 {
            reference_count / hypo_count[0]
        } else {
            1.0
        };
        let bp = (1.0 - c).exp().min(1.0);
        let dbp_dx = if 1.0 - c < 0.0 { bp } else { 0.0 };
        let c_dc = c * dbp_dx;

        let xbleu_score = exp_p * bp;

        let mut gradient = FeatureMap::new();
        for n in 0..ORDERS {
            if hypo_count[n] <= 0.0 {
                continue;
            }
            let scale_m = (exp_p * bp / ORDERS as f64) * factor_matched[n];
            let scale_h = (exp_p * bp / ORDERS as f64) * factor_hypo[n];
            for (id, value) in grad_matched[n].inner() {
                gradient.add(*id, scale_m * value);
            }
            for (id, value) in grad_hypo[n].inner() {
                gradient.add(*id, -scale_h * value);
            }
        }
        if hypo_count[0] > 0.0 {
            let scale_hypo1 = exp_p * c_dc / hypo_count[0];
            for (id, value) in grad_hypo[0].inner() {
                gradient.add(*id, -scale_hypo1 * value);
            }
        }

        let n = instances.max(1) as f64;
        for (id, value) in grad_entropy.inner() {
            gradient.add(*id, self.temperature * value / n);
        }

        // ascend the corpus BLEU + entropy objective.
        let eta = self.schedule.rate(0);
        weights.add_scaled(&gradient, eta);
        self.regularizer.apply(weights, eta);

        let objective = xbleu_score + self.temperature * entropy_total / n;

        self.schedule.advance_epoch();
        self.segments.clear();
        objective
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::regularizer::RegularizerKind;
    use crate::train::schedule::Simple;

    fn hyp(feature: f64, matched: u64, hypo: u64, reference: u64, sentence: &str) -> Hypothesis<Bleu> {
        let mut f = FeatureMap::new();
        f.add(0, feature);
        Hypothesis::new(
            sentence.split_whitespace().map(String::from).collect(),
            f,
            Bleu::new([matched, 0, 0, 0], [hypo, 0, 0, 0], reference),
        )
    }

    #[test]
    fn learn_without_data_is_a_no_op() {
        let mut learner = XBleu::new(
            Simple::new(0.1),
            Regularizer::new(RegularizerKind::None, 0.0).unwrap(),
            1.0,
        );
        let mut weights = Weight::new();
        weights.set(0, 1.0);
        let objective = learner.learn(&mut weights);
        assert_eq!(objective, 0.0);
        assert_eq!(weights.get(0), 1.0);
    }

    #[test]
    fn higher_matched_candidate_is_favored_by_the_gradient() {
        let mut learner = XBleu::new(
            Simple::new(1.0),
            Regularizer::new(RegularizerKind::None, 0.0).unwrap(),
            1.0,
        );
        learner.encode(
            &[hyp(1.0, 3, 3, 3, "a"), hyp(0.0, 1, 3, 3, "b")],
            &[],
        );
        let mut weights = Weight::new();
        let objective = learner.learn(&mut weights);
        assert!(objective.is_finite());
        assert!(weights.get(0) > 0.0);
    }
}
