//! Pegasos-style hinge learner (§4.7): rescale `w` by `(1 - ηλ)`, then add
//! the average violating-instance gradient scaled by η.

use crate::feature::FeatureMap;
use crate::oracle::Hypothesis;
use crate::scorer::Statistic;
use crate::weight::Weight;

use super::schedule::Schedule;
use super::{margin_instances, Instance, Learner};

pub struct Hinge<Sch: Schedule> {
    instances: Vec<Instance>,
    schedule: Sch,
    lambda: f64,
}

impl<Sch: Schedule> Hinge<Sch> {
    pub fn new(schedule: Sch, lambda: f64) -> Self {
        Self {
            instances: Vec::new(),
            schedule,
            lambda,
        }
    }
}

impl<S: Statistic, Sch: Schedule> Learner<S> for Hinge<Sch> {
    fn encode(&mut self, kbest: &[Hypothesis<S>], oracle: &[Hypothesis<S>]) {
        self.instances.extend(margin_instances(kbest, oracle));
    }

    fn learn(&mut self, weights: &mut Weight) -> f64 {
        if self.instances.is_empty() {
            return 0.0;
        }
        let eta = self.schedule.rate(0);
        weights.scale(1.0 - eta * self.lambda);

        let mut objective = 0.0;
        let mut gradient = FeatureMap::new();
        let mut violators = 0usize;
        for instance in &self.instances {
            let margin = weights.dot(&instance.delta);
            let suffered = instance.cost - margin;
            if suffered <= 0.0 {
                continue;
            }
            objective += suffered;
            violators += 1;
            for (id, value) in instance.delta.inner() {
                gradient.add(*id, *value);
            }
        }
        if violators > 0 {
            weights.add_scaled(&gradient, eta / violators as f64);
        }

        let n = self.instances.len() as f64;
        self.schedule.advance_epoch();
        self.instances.clear();
        objective / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
        let mut learner = Hinge::new(Simple::new(0.1), 0.01);
        let mut weights = Weight::new();
        weights.set(0, 3.0);
        let objective: f64 = <Hinge<Simple> as Learner<Bleu>>::learn(&mut learner, &mut weights);
        assert_eq!(objective, 0.0);
        assert_eq!(weights.get(0), 3.0);
    }

    #[test]
    fn violating_instance_pulls_weight_towards_oracle_direction() {
        let oracle = vec![hyp(2.0, 0.0, "a")];
        let kbest = vec![hyp(1.0, 1.0, "b")];
        let mut learner = Hinge::new(Simple::new(0.5), 0.0);
        learner.encode(&kbest, &oracle);
        let mut weights = Weight::new();
        let objective = learner.learn(&mut weights);
        assert!(objective > 0.0);
        assert!(weights.get(0) > 0.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::scorer::Bleu;
    use crate::train::schedule::Simple;
    use proptest::prelude::*;

    proptest! {
        /// learner no-op contract (§8): a `learn()` call with nothing
        /// encoded since the last call returns objective 0 and leaves
        /// whatever weight vector the caller passed in untouched, for any
        /// starting weight vector.
        #[test]
        fn learn_without_data_is_a_no_op_for_any_starting_weights(
            values in prop::collection::btree_map(0u32..8, -10.0..10.0f64, 0..6),
            lambda in 0.0..1.0f64,
            eta in 0.01..1.0f64,
        ) {
            let mut learner = Hinge::new(Simple::new(eta), lambda);
            let mut weights = Weight::from(values.clone());
            let objective: f64 = <Hinge<Simple> as Learner<Bleu>>::learn(&mut learner, &mut weights);
            prop_assert_eq!(objective, 0.0);
            for (&id, &value) in &values {
                prop_assert!((weights.get(id) - value).abs() < 1e-12);
            }
        }
    }
}
