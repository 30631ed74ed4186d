use crate::error::{Error, Result};
use crate::hypergraph::{Edge, Hypergraph};
use crate::semiring::Semiring;

/// α[goal] = one(); for nodes in reverse topological order, for each
/// incoming edge e and tail i, accumulate into α[tail_i] the product of
/// α[head], f(e), and Π β[tail_j] for j≠i (§4.2).
pub fn outside<S, F>(graph: &Hypergraph, inside: &[S], weight: F) -> Result<Vec<S>>
where
    S: Semiring,
    F: Fn(Edge) -> S,
{
    if inside.len() != graph.node_count() {
        return Err(Error::SizeMismatch(format!(
            "inside has {} entries, graph has {} nodes",
            inside.len(),
            graph.node_count()
        )));
    }
    if !graph.is_topologically_sorted() {
        return Err(Error::InvalidGraph(
            "outside requires a topologically sorted hypergraph".into(),
        ));
    }

    let mut alpha: Vec<S> = vec![S::zero(); graph.node_count()];
    if let Some(goal) = graph.goal() {
        alpha[goal.index()] = S::one();
    }

    for node in graph.nodes().collect::<Vec<_>>().into_iter().rev() {
        let score_head = alpha[node.id().index()].clone();
        for edge in node.incoming() {
            let score_head_edge = weight(edge).times(&score_head);
            let tails: Vec<_> = edge.tails().collect();
            for (i, tail_i) in tails.iter().enumerate() {
                let mut score = score_head_edge.clone();
                for (j, tail_j) in tails.iter().enumerate() {
                    if i != j {
                        score = score.times(&inside[tail_j.id().index()]);
                    }
                }
                alpha[tail_i.id().index()] = alpha[tail_i.id().index()].plus(&score);
            }
        }
    }
    Ok(alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::inside::inside;
    use crate::feature::{AttributeMap, FeatureMap};
    use crate::semiring::LogWeight;

    #[test]
    fn outside_of_goal_is_one() {
        let mut g = Hypergraph::new();
        let a = g.add_node();
        let b = g.add_node();
        g.add_edge(b, vec![a], None, FeatureMap::new(), AttributeMap::new())
            .unwrap();
        g.set_goal(b).unwrap();

        let beta = inside(&g, |_| LogWeight::new(0.0)).unwrap();
        let alpha = outside(&g, &beta, |_| LogWeight::new(0.0)).unwrap();
        assert_eq!(alpha[b.index()], LogWeight::one());
    }

    #[test]
    fn size_mismatch_between_inside_and_graph_fails() {
        let mut g = Hypergraph::new();
        let a = g.add_node();
        g.set_goal(a).unwrap();
        let result = outside::<LogWeight, _>(&g, &[], |_| LogWeight::one());
        assert!(matches!(result, Err(Error::SizeMismatch(_))));
    }
}
