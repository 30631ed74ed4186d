use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::hypergraph::Hypergraph;
use crate::weight::Weight;

use super::config::RescoreConfig;
use super::expand::{close_goal, enumerate_combos, materialize, seed_source, Combo, Signature};
use super::FeatureFunction;

/// left-to-right expansion simulating a beam of partial hypotheses (§4.4).
/// nodes are visited in topological (left-to-right) order; each node's
/// combinations are scored and truncated to `config.size` exactly like
/// cube-pruning, except when `config.prune_bin` is set, in which case
/// pruning keeps only the best candidate within each state-signature bin
/// rather than a single global top-`size` beam.
pub fn incremental(
    graph: &Hypergraph,
    functions: &[Box<dyn FeatureFunction>],
    weights: &Weight,
    config: &RescoreConfig,
) -> Result<Hypergraph> {
    if functions.is_empty() {
        return Err(Error::InvalidConfig(
            "at least one feature function must remain active".into(),
        ));
    }
    if config.size < 1 {
        return Err(Error::InvalidConfig("incremental beam size must be >= 1".into()));
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
        let survivors = if config.prune_bin {
            prune_by_bin(combos, weights)
        } else {
            let mut ranked = combos;
            ranked.sort_by(|a, b| b.score(weights).partial_cmp(&a.score(weights)).unwrap());
            ranked.truncate(config.size);
            ranked
        };

        materialize(&mut out, &mut expansions[node.id().index()], survivors)?;
    }

    if let Some(goal) = graph.goal() {
        close_goal(&mut out, &expansions[goal.index()])?;
    }
    Ok(out)
}

/// keep the single best-scoring candidate per distinct state signature
/// (its "bin"), regardless of the global beam size.
fn prune_by_bin(combos: Vec<Combo>, weights: &Weight) -> Vec<Combo> {
    let mut best: HashMap<Signature, Combo> = HashMap::new();
    for combo in combos {
        match best.get(&combo.signature) {
            Some(existing) if existing.score(weights) >= combo.score(weights) => {}
            _ => {
                best.insert(combo.signature.clone(), combo);
            }
        }
    }
    best.into_values().collect()
}
