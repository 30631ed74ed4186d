use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::hypergraph::Hypergraph;
use crate::weight::Weight;

use super::config::RescoreConfig;
use super::expand::{close_goal, enumerate_combos, materialize, seed_source, Combo, Signature};
use super::FeatureFunction;

/// two-pass expansion (§4.4): a first pass ranks candidates by their cheap
/// non-stateful `estimate` alone (over-generating `2 * size` survivors),
/// a second pass re-ranks those survivors by the true weighted score and
/// truncates to `size`. `coarse` additionally collapses candidates sharing
/// the first feature function's state into one representative before the
/// first pass, the "grow-coarse" variant's more aggressive grouping.
pub fn cube_grow(
    graph: &Hypergraph,
    functions: &[Box<dyn FeatureFunction>],
    weights: &Weight,
    config: &RescoreConfig,
) -> Result<Hypergraph> {
    cube_grow_impl(graph, functions, weights, config, false)
}

/// the more aggressively grouped "grow-coarse" variant of [`cube_grow`].
pub fn cube_grow_coarse(
    graph: &Hypergraph,
    functions: &[Box<dyn FeatureFunction>],
    weights: &Weight,
    config: &RescoreConfig,
) -> Result<Hypergraph> {
    cube_grow_impl(graph, functions, weights, config, true)
}

fn cube_grow_impl(
    graph: &Hypergraph,
    functions: &[Box<dyn FeatureFunction>],
    weights: &Weight,
    config: &RescoreConfig,
    coarse: bool,
) -> Result<Hypergraph> {
    if functions.is_empty() {
        return Err(Error::InvalidConfig(
            "at least one feature function must remain active".into(),
        ));
    }
    if config.size < 1 {
        return Err(Error::InvalidConfig("cube-grow size must be >= 1".into()));
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
        let coarsely_grouped = if coarse { group_coarse(combos) } else { combos };

        let mut pass_one = coarsely_grouped;
        pass_one.sort_by(|a, b| b.estimate.partial_cmp(&a.estimate).unwrap());
        pass_one.truncate(config.size.saturating_mul(2).max(config.size));

        let mut pass_two = pass_one;
        pass_two.sort_by(|a, b| b.score(weights).partial_cmp(&a.score(weights)).unwrap());
        pass_two.truncate(config.size);

        materialize(&mut out, &mut expansions[node.id().index()], pass_two)?;
    }

    if let Some(goal) = graph.goal() {
        close_goal(&mut out, &expansions[goal.index()])?;
    }
    Ok(out)
}

/// keep only the best-estimate candidate per coarse equivalence class,
/// where the class key is the first feature function's state bytes.
fn group_coarse(combos: Vec<Combo>) -> Vec<Combo> {
    let mut best: HashMap<Vec<u8>, Combo> = HashMap::new();
    for combo in combos {
        let key = combo.signature.first().cloned().unwrap_or_default();
        match best.get(&key) {
            Some(existing) if existing.estimate >= combo.estimate => {}
            _ => {
                best.insert(key, combo);
            }
        }
    }
    best.into_values().collect()
}
