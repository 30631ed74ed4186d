//! MERT line-search (§4.9): minimum error-rate training along a single
//! direction `d` from an origin `w`. [`envelope`] builds the full
//! per-segment upper envelope and sweeps the corpus for the minimizing
//! plateau; [`subgradient`] is the cheaper piecewise-linear-hinge variant
//! used by the online margin learners and the cutting-plane learner's
//! optional local search (§4.7, §4.8).

pub mod envelope;
pub mod subgradient;

pub use envelope::{optimum as envelope_optimum, Penalty, SegmentEnvelope};
pub use subgradient::optimum as subgradient_optimum;
