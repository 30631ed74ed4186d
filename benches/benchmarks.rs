criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        inside_over_a_wide_forest,
        inside_outside_over_a_wide_forest,
        kbest_extraction_over_a_wide_forest,
        mert_envelope_over_many_segments,
}

use hyperforge::algorithms::{inside, inside_outside, no_duplicate_filter, KBest};
use hyperforge::feature::{AttributeMap, FeatureMap};
use hyperforge::hypergraph::{Edge, Hypergraph, NodeId};
use hyperforge::mert::{envelope_optimum, Penalty, SegmentEnvelope};
use hyperforge::scorer::Bleu;
use hyperforge::semiring::{Expectation, LogWeight, Tropical};
use hyperforge::weight::Weight;

const WIDTH: usize = 24;
const DEPTH: usize = 8;

/// a "ladder" forest: each of `DEPTH` layers has `WIDTH` nodes, every node
/// in layer `i+1` has one incoming edge per node in layer `i` (so layer
/// `i+1` has `WIDTH` nodes and `WIDTH * WIDTH` edges), collapsing to a
/// single goal node on top. Exercises both wide fan-in (inside/outside's
/// per-node edge sums) and deep topological chains (k-best's lazy-next
/// recursion through many tails).
fn ladder_forest() -> (Hypergraph, NodeId) {
    let mut g = Hypergraph::new();
    let mut layer: Vec<NodeId> = (0..WIDTH).map(|_| g.add_node()).collect();

    for _ in 0..DEPTH {
        let next_layer: Vec<NodeId> = (0..WIDTH).map(|_| g.add_node()).collect();
        for &head in &next_layer {
            for &tail in &layer {
                let mut features = FeatureMap::new();
                features.add(0, 1.0);
                g.add_edge(head, vec![tail], None, features, AttributeMap::new()).unwrap();
            }
        }
        layer = next_layer;
    }

    let goal = g.add_node();
    for &tail in &layer {
        g.add_edge(goal, vec![tail], None, FeatureMap::new(), AttributeMap::new()).unwrap();
    }
    g.set_goal(goal).unwrap();
    (g, goal)
}

fn inside_over_a_wide_forest(c: &mut criterion::Criterion) {
    let (graph, _) = ladder_forest();
    c.bench_function("inside over a wide ladder forest", |b| {
        b.iter(|| inside::<LogWeight, _>(&graph, |_| LogWeight::new(0.0)).unwrap())
    });
}

fn inside_outside_over_a_wide_forest(c: &mut criterion::Criterion) {
    let (graph, _) = ladder_forest();
    c.bench_function("inside/outside over a wide ladder forest", |b| {
        b.iter(|| {
            inside_outside::<Expectation, _, _>(
                &graph,
                |_| Expectation::weight(1.0),
                |e| Expectation::new(1.0, e.features().clone()),
            )
            .unwrap()
        })
    });
}

fn kbest_extraction_over_a_wide_forest(c: &mut criterion::Criterion) {
    let (graph, _) = ladder_forest();
    let weight = Weight::new();
    c.bench_function("extract 50-best over a wide ladder forest", |b| {
        b.iter(|| {
            let kbest = KBest::new(
                &graph,
                |e: Edge| Tropical::new(weight.dot(e.features())),
                |_e, tails: &[&()]| {
                    let _ = tails;
                },
                no_duplicate_filter,
            )
            .unwrap();
            for k in 0..50 {
                if kbest.get(k).is_err() {
                    break;
                }
            }
        })
    });
}

fn mert_envelope_over_many_segments(c: &mut criterion::Criterion) {
    const SEGMENTS: usize = 200;
    const CANDIDATES: usize = 20;

    let origin = Weight::new();
    let mut direction = FeatureMap::new();
    direction.add(0, 1.0);
    direction.add(1, -0.3);

    let segments: Vec<SegmentEnvelope<Bleu>> = (0..SEGMENTS)
        .map(|s| {
            let pairs: Vec<(FeatureMap, Bleu)> = (0..CANDIDATES)
                .map(|k| {
                    let mut f = FeatureMap::new();
                    f.add(0, (k as f64) * 0.1);
                    f.add(1, ((s + k) as f64).sin());
                    let matched = (k + 1) as u64;
                    (f, Bleu::new([matched, 0, 0, 0], [CANDIDATES as u64, 0, 0, 0], CANDIDATES as u64))
                })
                .collect();
            SegmentEnvelope::build(&pairs, &origin, &direction)
        })
        .collect();

    c.bench_function("mert envelope optimum over 200 segments", |b| {
        b.iter(|| envelope_optimum(&segments, -2.0, 2.0, &Penalty::None))
    });
}
