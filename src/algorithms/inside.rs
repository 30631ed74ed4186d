use crate::error::{Error, Result};
use crate::hypergraph::{Edge, Hypergraph};
use crate::semiring::Semiring;

/// β[v] = Σ over incoming edges e of f(e) · Π β[t] for t in tails(e) (§4.2).
/// the graph is assumed topologically sorted; visiting nodes in id order
/// then guarantees every tail's weight is already computed.
pub fn inside<S, F>(graph: &Hypergraph, weight: F) -> Result<Vec<S>>
where
    S: Semiring,
    F: Fn(Edge) -> S,
{
    if !graph.is_topologically_sorted() {
        return Err(Error::InvalidGraph(
            "inside requires a topologically sorted hypergraph".into(),
        ));
    }
    let mut beta: Vec<S> = vec![S::zero(); graph.node_count()];
    for node in graph.nodes() {
        let mut acc = S::zero();
        for edge in node.incoming() {
            let mut score = weight(edge);
            for tail in edge.tails() {
                score = score.times(&beta[tail.id().index()]);
            }
            acc = acc.plus(&score);
        }
        beta[node.id().index()] = acc;
    }
    Ok(beta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{AttributeMap, FeatureMap};
    use crate::semiring::LogWeight;

    #[test]
    fn single_path_inside_multiplies_edge_scores() {
        let mut g = Hypergraph::new();
        let a = g.add_node();
        let b = g.add_node();
        let c = g.add_node();
        g.add_edge(b, vec![a], None, FeatureMap::new(), AttributeMap::new())
            .unwrap();
        g.add_edge(c, vec![b], None, FeatureMap::new(), AttributeMap::new())
            .unwrap();
        g.set_goal(c).unwrap();

        let w1 = 0.6_f64.ln();
        let w2 = 0.4_f64.ln();
        let beta = inside(&g, |e| LogWeight::new(if e.head().id() == b { w1 } else { w2 })).unwrap();

        assert!((beta[c.index()].value() - (w1 + w2)).abs() < 1e-9);
    }

    #[test]
    fn two_edges_into_goal_sums_under_log_semiring() {
        let mut g = Hypergraph::new();
        let a = g.add_node();
        let goal = g.add_node();
        g.add_edge(goal, vec![a], None, FeatureMap::new(), AttributeMap::new())
            .unwrap();
        g.add_edge(goal, vec![], None, FeatureMap::new(), AttributeMap::new())
            .unwrap();
        g.set_goal(goal).unwrap();

        let beta = inside(&g, |e| {
            if e.tail_ids().is_empty() {
                LogWeight::new(0.4_f64.ln())
            } else {
                LogWeight::new(0.6_f64.ln())
            }
        })
        .unwrap();

        assert!((beta[goal.index()].value().exp() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unsorted_graph_is_rejected() {
        let mut g = Hypergraph::new();
        let goal = g.add_node();
        let a = g.add_node();
        g.add_edge(goal, vec![a], None, FeatureMap::new(), AttributeMap::new())
            .unwrap();
        g.set_goal(goal).unwrap();
        let result = inside::<LogWeight, _>(&g, |_| LogWeight::one());
        assert!(matches!(result, Err(Error::InvalidGraph(_))));
    }
}
