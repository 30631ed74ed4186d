//! semiring traits (§4.1): an abstract multiplicative/additive monoid with
//! `one`/`zero`, used to parameterize inside/outside and k-best over the
//! same hypergraph for different purposes (best-derivation, probability,
//! gradient, envelope).

mod envelope;
mod expectation;
mod log;
mod tropical;
mod viterbi;

pub use envelope::{Envelope, Line};
pub use expectation::Expectation;
pub use log::LogWeight;
pub use tropical::Tropical;
pub use viterbi::Viterbi;

pub trait Semiring: Clone {
    fn zero() -> Self;
    fn one() -> Self;
    fn plus(&self, other: &Self) -> Self;
    fn times(&self, other: &Self) -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_monoid_laws<S: Semiring + PartialEq + std::fmt::Debug + Clone>(a: S, b: S, c: S) {
        assert_eq!(a.plus(&S::zero()), a.clone());
        assert_eq!(a.times(&S::one()), a.clone());
        assert_eq!(a.plus(&b).plus(&c), a.plus(&b.plus(&c)));
        assert_eq!(a.times(&b).times(&c), a.times(&b.times(&c)));
    }

    #[test]
    fn tropical_obeys_semiring_laws() {
        check_monoid_laws(Tropical::new(-1.0), Tropical::new(-2.0), Tropical::new(-0.5));
    }

    #[test]
    fn viterbi_obeys_semiring_laws() {
        check_monoid_laws(Viterbi::new(0.2), Viterbi::new(0.5), Viterbi::new(0.9));
    }

    #[test]
    fn log_semiring_obeys_semiring_laws() {
        check_monoid_laws(LogWeight::new(-1.0), LogWeight::new(-2.0), LogWeight::new(-0.3));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        if a.is_infinite() || b.is_infinite() {
            return a == b;
        }
        (a - b).abs() < 1e-6
    }

    proptest! {
        /// plus/times are associative and zero/one are their identities (§4.1),
        /// for arbitrary log-scores rather than the three fixed examples above.
        #[test]
        fn tropical_obeys_semiring_laws_for_any_score(
            a in -50.0..50.0f64, b in -50.0..50.0f64, c in -50.0..50.0f64,
        ) {
            let (a, b, c) = (Tropical::new(a), Tropical::new(b), Tropical::new(c));
            prop_assert!(approx_eq(a.plus(&Tropical::zero()).0, a.0));
            prop_assert!(approx_eq(a.times(&Tropical::one()).0, a.0));
            prop_assert!(approx_eq(a.plus(&b).plus(&c).0, a.plus(&b.plus(&c)).0));
            prop_assert!(approx_eq(a.times(&b).times(&c).0, a.times(&b.times(&c)).0));
        }

        #[test]
        fn viterbi_obeys_semiring_laws_for_any_probability(
            a in 0.0..1.0f64, b in 0.0..1.0f64, c in 0.0..1.0f64,
        ) {
            let (a, b, c) = (Viterbi::new(a), Viterbi::new(b), Viterbi::new(c));
            prop_assert!(approx_eq(a.plus(&Viterbi::zero()).0, a.0));
            prop_assert!(approx_eq(a.times(&Viterbi::one()).0, a.0));
            prop_assert!(approx_eq(a.plus(&b).plus(&c).0, a.plus(&b.plus(&c)).0));
            prop_assert!(approx_eq(a.times(&b).times(&c).0, a.times(&b.times(&c)).0));
        }

        #[test]
        fn log_semiring_obeys_semiring_laws_for_any_score(
            a in -50.0..50.0f64, b in -50.0..50.0f64, c in -50.0..50.0f64,
        ) {
            let (a, b, c) = (LogWeight::new(a), LogWeight::new(b), LogWeight::new(c));
            prop_assert!(approx_eq(a.plus(&LogWeight::zero()).0, a.0));
            prop_assert!(approx_eq(a.times(&LogWeight::one()).0, a.0));
            prop_assert!(approx_eq(a.plus(&b).plus(&c).0, a.plus(&b.plus(&c)).0));
            prop_assert!(approx_eq(a.times(&b).times(&c).0, a.times(&b.times(&c)).0));
        }
    }
}
