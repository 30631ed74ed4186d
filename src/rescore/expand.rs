use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::feature::{AttributeMap, FeatureMap};
use crate::hypergraph::{Edge, EdgeId, Hypergraph, NodeId};
use crate::weight::Weight;

use super::FeatureFunction;

/// concatenation of each active feature function's own state signature,
/// in function order. hashable so equivalent (original_node, signature)
/// pairs collapse onto one new node (§3: "nodes are (original_node,
/// state_signature) pairs").
pub(super) type Signature = Vec<Vec<u8>>;

/// one fully-applied combination of child expansions for a single edge.
pub(super) struct Combo {
    pub edge: EdgeId,
    pub child_ids: Vec<NodeId>,
    pub signature: Signature,
    pub features: FeatureMap,
    pub estimate: f64,
    pub rule: Option<Arc<str>>,
    pub attributes: AttributeMap,
}

impl Combo {
    pub fn score(&self, weights: &Weight) -> f64 {
        weights.dot(&self.features) + self.estimate
    }
}

fn trivial_signature(arity: usize) -> Signature {
    vec![Vec::new(); arity]
}

/// run every active feature function over one edge given its children's
/// state signatures, threading each function's own state-size slice.
fn apply_functions(
    functions: &[Box<dyn FeatureFunction>],
    edge: Edge,
    child_signatures: &[&Signature],
    base_features: FeatureMap,
) -> (Signature, FeatureMap, f64) {
    let mut signature = Vec::with_capacity(functions.len());
    let mut features = base_features;
    let mut estimate = 0.0;
    for (fi, function) in functions.iter().enumerate() {
        let child_states: Vec<&[u8]> = child_signatures
            .iter()
            .map(|sig| sig[fi].as_slice())
            .collect();
        let mut state = Vec::new();
        function.apply(edge, &child_states, &mut state, &mut features, &mut estimate);
        signature.push(state);
    }
    (signature, features, estimate)
}

/// cartesian product of owned per-slot candidate lists. owned (rather than
/// borrowed) on purpose: slots are read from `expansions` once and then
/// combined, so this never holds a live borrow of `expansions` across a
/// mutation of it.
fn cartesian(slots: Vec<Vec<(Signature, NodeId)>>) -> Vec<Vec<(Signature, NodeId)>> {
    let mut combos: Vec<Vec<(Signature, NodeId)>> = vec![Vec::new()];
    for slot in slots {
        let mut next = Vec::with_capacity(combos.len() * slot.len().max(1));
        for combo in &combos {
            for choice in &slot {
                let mut extended = combo.clone();
                extended.push(choice.clone());
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

/// every combination of child-node expansions across every incoming edge
/// of `node`, each with its features/signature/estimate already computed.
/// a source node (no incoming edges) yields a single trivial combo with an
/// empty per-function state and the node's prior features untouched.
pub(super) fn enumerate_combos(
    node_id: NodeId,
    graph: &crate::hypergraph::Hypergraph,
    functions: &[Box<dyn FeatureFunction>],
    expansions: &[HashMap<Signature, NodeId>],
) -> Vec<Combo> {
    let node = graph.node(node_id);
    node.incoming()
        .flat_map(|edge| {
            let slots: Vec<Vec<(Signature, NodeId)>> = edge
                .tails()
                .map(|t| {
                    expansions[t.id().index()]
                        .iter()
                        .map(|(sig, &id)| (sig.clone(), id))
                        .collect()
                })
                .collect();
            let combos = if slots.is_empty() {
                vec![Vec::new()]
            } else {
                cartesian(slots)
            };
            combos.into_iter().map(move |combo| {
                let child_signatures: Vec<&Signature> = combo.iter().map(|(s, _)| s).collect();
                let child_ids: Vec<NodeId> = combo.iter().map(|(_, id)| *id).collect();
                let (signature, features, estimate) =
                    apply_functions(functions, edge, &child_signatures, edge.features().clone());
                Combo {
                    edge: edge.id(),
                    child_ids,
                    signature,
                    features,
                    estimate,
                    rule: edge.rule().map(Arc::from),
                    attributes: edge.attributes().clone(),
                }
            })
        })
        .collect()
}

/// seed a source node's trivial expansion (no incoming edges, so no
/// feature function has anything to consume yet).
pub(super) fn seed_source(functions: &[Box<dyn FeatureFunction>]) -> Signature {
    trivial_signature(functions.len())
}

/// write `combos` into `out` as new nodes (deduplicated by signature) and
/// edges, recording each original node's surviving expansions.
pub(super) fn materialize(
    out: &mut Hypergraph,
    expansions: &mut HashMap<Signature, NodeId>,
    combos: Vec<Combo>,
) -> Result<()> {
    for combo in combos {
        let new_node = *expansions
            .entry(combo.signature)
            .or_insert_with(|| out.add_node());
        out.add_edge(new_node, combo.child_ids, combo.rule, combo.features, combo.attributes)?;
    }
    Ok(())
}

/// finalize the goal of a rescored graph: if several state signatures
/// survived for the original goal node, merge them behind a fresh node,
/// the same idiom `Hypergraph::unite` uses to merge two goals.
pub(super) fn close_goal(out: &mut Hypergraph, expansions: &HashMap<Signature, NodeId>) -> Result<()> {
    match expansions.len() {
        0 => Err(Error::InvalidGraph("goal node has no surviving expansions".into())),
        1 => out.set_goal(*expansions.values().next().unwrap()),
        _ => {
            let merged = out.add_node();
            for &id in expansions.values() {
                out.add_edge(merged, vec![id], None, FeatureMap::new(), AttributeMap::new())?;
            }
            out.set_goal(merged)
        }
    }
}
