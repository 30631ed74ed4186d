//! feature-function application over a forest (§4.4): a `FeatureFunction`
//! exposes state size and an `apply` step; `RescoreConfig` selects and
//! validates exactly one traversal variant plus the orthogonal pruning
//! knobs, matching the CLI flags in §6.

mod config;
mod cube_grow;
mod cube_prune;
mod exact;
mod expand;
mod incremental;

pub use config::{RescoreConfig, Variant};
pub use cube_grow::{cube_grow, cube_grow_coarse};
pub use cube_prune::cube_prune;
pub use exact::exact;
pub use incremental::incremental;

use crate::feature::FeatureMap;
use crate::hypergraph::Edge;

/// a feature function's capability set (§9): state size, and a step that
/// consumes child state signatures and produces a new signature plus
/// feature/estimate contributions. `state_size() == 0` means stateless.
pub trait FeatureFunction: Send + Sync {
    fn name(&self) -> &str;

    fn state_size(&self) -> usize;

    /// apply this function to one edge given its children's state
    /// signatures; write the new state signature, add feature
    /// contributions into `features`, and add a (possibly heuristic,
    /// non-stateful) future-cost estimate into `estimate`.
    fn apply(
        &self,
        edge: Edge,
        child_states: &[&[u8]],
        new_state: &mut Vec<u8>,
        features: &mut FeatureMap,
        estimate: &mut f64,
    );

    fn is_sparse(&self) -> bool {
        false
    }
}
