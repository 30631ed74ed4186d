//! concurrency substrate (§5): a worker pool for the per-segment CPU
//! phases (inside, k-best envelope, viterbi) and an orchestrator
//! abstraction for the broadcast/reduce calls a distributed learner makes
//! between iterations. Transport is explicitly out of scope (§1); this
//! module provides the shape and a single-process implementation runnable
//! without one.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::scorer::Statistic;
use crate::semiring::Line;
use crate::weight::Weight;

/// one point of a reduced line-envelope (§5: "line-envelope breakpoints").
/// an alias rather than a new type: it's exactly the teacher's
/// [`crate::semiring::Line`] shape, just named the way §4.10 names it.
pub type EnvelopePoint = Line;

/// wraps a `rayon::ThreadPool` sized from `num_cpus::get()` unless
/// overridden; one pool per process, shared by whichever phase is
/// currently running (the core never runs two CPU phases concurrently
/// against the same hypergraph, per §5's shared-resource policy).
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::with_threads(num_cpus::get())
    }

    pub fn with_threads(threads: usize) -> Self {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .expect("build worker thread pool");
        Self { pool }
    }

    /// run `segments` through `f` across the pool, preserving input order
    /// in the returned vector (rayon's `par_iter` guarantees this).
    pub fn map_segments<T, R, F>(&self, segments: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        use rayon::prelude::*;
        self.pool.install(|| segments.par_iter().map(|s| f(s)).collect())
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

/// the coordinator-facing half of distributed execution (§5): broadcasts
/// the current weight vector to workers each iteration, then reduces
/// whatever they send back. A distributed/MPI implementation is an
/// embedder's concern (§1); this crate ships only the rank-0-only,
/// in-process instance below.
pub trait Orchestrator {
    fn broadcast_weights(&self, w: &Weight);
    fn reduce_deltas(&self, deltas: Vec<Weight>) -> Weight;
    /// folds every contribution with `+=`; an empty `stats` (a segment with
    /// no contribution, §7) reduces to `S::default()` rather than panicking.
    fn reduce_stats<S: Statistic>(&self, stats: Vec<S>) -> S;
    fn reduce_envelope(&self, points: Vec<EnvelopePoint>) -> Vec<EnvelopePoint>;
}

/// single-process stand-in for a rank-0 coordinator: every "worker" call
/// already ran on this process, so broadcast is a no-op and every
/// reduction just folds its inputs with the natural monoid op for that
/// type.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalOrchestrator;

impl Orchestrator for LocalOrchestrator {
    fn broadcast_weights(&self, _w: &Weight) {}

    fn reduce_deltas(&self, deltas: Vec<Weight>) -> Weight {
        let mut total = Weight::new();
        for delta in &deltas {
            total += delta;
        }
        total
    }

    fn reduce_stats<S: Statistic>(&self, stats: Vec<S>) -> S {
        // §7: a segment contributing nothing reduces to the additive
        // identity rather than panicking.
        let mut total = S::default();
        for stat in stats {
            total += stat;
        }
        total
    }

    fn reduce_envelope(&self, points: Vec<EnvelopePoint>) -> Vec<EnvelopePoint> {
        use crate::semiring::Envelope;
        Envelope::from_lines(points).lines().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_pool_preserves_order() {
        let pool = WorkerPool::with_threads(2);
        let segments = vec![1, 2, 3, 4, 5];
        let doubled = pool.map_segments(&segments, |s| s * 2);
        assert_eq!(doubled, vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn reduce_deltas_sums_weight_vectors() {
        let orchestrator = LocalOrchestrator;
        let mut a = Weight::new();
        a.set(0, 1.0);
        let mut b = Weight::new();
        b.set(0, 2.0);
        b.set(1, 3.0);
        let reduced = orchestrator.reduce_deltas(vec![a, b]);
        assert_eq!(reduced.get(0), 3.0);
        assert_eq!(reduced.get(1), 3.0);
    }

    #[test]
    fn reduce_stats_folds_an_empty_vec_to_the_additive_identity() {
        let orchestrator = LocalOrchestrator;
        let reduced: crate::scorer::Bleu = orchestrator.reduce_stats(Vec::new());
        assert_eq!(reduced, crate::scorer::Bleu::default());
    }

    #[test]
    fn reduce_envelope_merges_to_the_upper_hull() {
        let orchestrator = LocalOrchestrator;
        let points = vec![Line::new(0.0, 0.0), Line::new(1.0, -5.0), Line::new(0.0, -1.0)];
        let merged = orchestrator.reduce_envelope(points);
        assert_eq!(merged.len(), 2);
    }
}
