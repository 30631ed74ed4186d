use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::hypergraph::Hypergraph;

use super::expand::{close_goal, enumerate_combos, materialize, seed_source, Signature};
use super::FeatureFunction;

/// enumerate every combination of child state signatures with no pruning
/// (§4.4): exact under + but exponential in state fan-out.
pub fn exact(graph: &Hypergraph, functions: &[Box<dyn FeatureFunction>]) -> Result<Hypergraph> {
    if functions.is_empty() {
        return Err(Error::InvalidConfig(
            "at least one feature function must remain active".into(),
        ));
    }
    if !graph.is_topologically_sorted() {
        return Err(Error::InvalidGraph(
            "rescoring requires a topologically sorted hypergraph".into(),
        ));
    }

    let mut expansions: Vec<HashMap<Signature, _>> = vec![HashMap::new(); graph.node_count()];
    let mut out = Hypergraph::new();

    for node in graph.nodes() {
        if node.is_source() {
            let id = out.add_node();
            expansions[node.id().index()].insert(seed_source(functions), id);
            continue;
        }
        let combos = enumerate_combos(node.id(), graph, functions, &expansions);
        materialize(&mut out, &mut expansions[node.id().index()], combos)?;
    }

    if let Some(goal) = graph.goal() {
        close_goal(&mut out, &expansions[goal.index()])?;
    }
    Ok(out)
}
