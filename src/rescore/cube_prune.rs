use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::hypergraph::Hypergraph;
use crate::weight::Weight;

use super::config::RescoreConfig;
use super::expand::{close_goal, enumerate_combos, materialize, seed_source, Combo, Signature};
use super::FeatureFunction;

/// for each node, keep up to `config.size` results, chosen from the full
/// combination set by descending `weights.dot(features) + estimate` (§4.4).
/// `config.diversity > 0` applies an additive per-equivalence-class penalty
/// as repeats are accepted; `config.rejection` instead accepts candidates
/// by rejection sampling against the current beam, seeded deterministically
/// from the node id so a run is reproducible (§5).
pub fn cube_prune(
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
        return Err(Error::InvalidConfig("cube-prune size must be >= 1".into()));
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
        let mut combos = enumerate_combos(node.id(), graph, functions, &expansions);
        combos.sort_by(|a, b| b.score(weights).partial_cmp(&a.score(weights)).unwrap());

        let survivors = if config.rejection {
            reject_sample(combos, weights, config.size, node.id().index() as u64)
        } else {
            top_beam(combos, weights, config.size, config.diversity)
        };

        materialize(&mut out, &mut expansions[node.id().index()], survivors)?;
    }

    if let Some(goal) = graph.goal() {
        close_goal(&mut out, &expansions[goal.index()])?;
    }
    Ok(out)
}

fn top_beam(combos: Vec<Combo>, weights: &Weight, size: usize, diversity: f64) -> Vec<Combo> {
    if diversity <= 0.0 {
        return combos.into_iter().take(size).collect();
    }
    let mut counts: HashMap<Signature, usize> = HashMap::new();
    let mut ranked: Vec<(f64, Combo)> = combos
        .into_iter()
        .map(|c| {
            let counter = counts.entry(c.signature.clone()).or_insert(0);
            let count = *counter;
            *counter += 1;
            let penalized = c.score(weights) - diversity * count as f64;
            (penalized, c)
        })
        .collect();
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
    ranked.into_iter().take(size).map(|(_, c)| c).collect()
}

/// rejection sampling against the current beam: walk the (already
/// score-sorted) candidates, accepting each with probability proportional
/// to its score relative to the best score seen so far, until `size`
/// candidates are accepted or the candidate pool is exhausted.
fn reject_sample(combos: Vec<Combo>, weights: &Weight, size: usize, seed: u64) -> Vec<Combo> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let best = combos.first().map(|c| c.score(weights)).unwrap_or(0.0);
    let mut accepted = Vec::with_capacity(size);
    for combo in combos {
        if accepted.len() >= size {
            break;
        }
        let score = combo.score(weights);
        let ratio = if best > score {
            (score - best).exp().clamp(0.0, 1.0)
        } else {
            1.0
        };
        if rng.random::<f64>() < ratio {
            accepted.push(combo);
        }
    }
    accepted
}
