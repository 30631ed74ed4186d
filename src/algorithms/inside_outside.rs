use super::inside::inside;
use super::outside::outside;
use crate::error::Result;
use crate::hypergraph::{Edge, Hypergraph};
use crate::semiring::Semiring;

/// edge expectations (§4.2): x[e] = f_x(e) · α[head] · Π β[tails],
/// aggregated into a caller-provided container. no normalization is
/// performed; callers divide by β[goal] themselves if they want a
/// probability rather than an unnormalized expectation.
pub fn inside_outside<S, FK, FX>(
    graph: &Hypergraph,
    weight_k: FK,
    weight_x: FX,
) -> Result<(Vec<S>, Vec<S>)>
where
    S: Semiring,
    FK: Fn(Edge) -> S,
    FX: Fn(Edge) -> S,
{
    let beta = inside(graph, &weight_k)?;
    let alpha = outside(graph, &beta, &weight_k)?;

    let mut x: Vec<S> = vec![S::zero(); graph.edge_count()];
    for node in graph.nodes() {
        for edge in node.incoming() {
            let mut score_k = alpha[node.id().index()].clone();
            for tail in edge.tails() {
                score_k = score_k.times(&beta[tail.id().index()]);
            }
            x[edge.id().index()] = weight_x(edge).times(&score_k);
        }
    }
    Ok((beta, x))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::feature::{AttributeMap, FeatureMap};
    use crate::semiring::LogWeight;
    use proptest::prelude::*;

    proptest! {
        /// on a linear chain, inside/outside correctness (§4.2) reduces to:
        /// beta[goal] is the sum of every edge's log-weight, and every
        /// edge's expectation x[e] = alpha[head]*f(e)*beta[tail] also
        /// collapses to that same total, since the missing edge weight is
        /// always exactly supplied by either the alpha or the beta half.
        #[test]
        fn chain_inside_outside_matches_the_closed_form(
            log_weights in prop::collection::vec(-5.0..5.0f64, 1..8),
        ) {
            let mut g = Hypergraph::new();
            let mut prev = g.add_node();
            for _ in &log_weights {
                let next = g.add_node();
                g.add_edge(next, vec![prev], None, FeatureMap::new(), AttributeMap::new()).unwrap();
                prev = next;
            }
            g.set_goal(prev).unwrap();

            let weight = |edge: Edge| LogWeight::new(log_weights[edge.id().index()]);
            let (beta, x) = inside_outside(&g, weight, weight).unwrap();

            let total: f64 = log_weights.iter().sum();
            prop_assert!((beta[prev.index()].0 - total).abs() < 1e-9);
            for value in &x {
                prop_assert!((value.0 - total).abs() < 1e-9);
            }
        }
    }
}
