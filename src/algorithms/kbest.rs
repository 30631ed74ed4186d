use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::hypergraph::{Edge, EdgeId, Hypergraph, NodeId};
use crate::semiring::Semiring;

/// a single candidate derivation: an edge plus a back-index vector j giving,
/// for each tail, the rank into that tail's own k-best list (§3).
struct Derivation<W, Y> {
    edge: EdgeId,
    j: Vec<usize>,
    score: W,
    value: Y,
}

struct HeapEntry<W, Y>(Rc<Derivation<W, Y>>);

impl<W: PartialOrd, Y> HeapEntry<W, Y> {
    fn cardinality(&self) -> usize {
        self.0.j.iter().sum()
    }
}

impl<W: PartialOrd, Y> PartialEq for HeapEntry<W, Y> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl<W: PartialOrd, Y> Eq for HeapEntry<W, Y> {}

impl<W: PartialOrd, Y> PartialOrd for HeapEntry<W, Y> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// max-heap keyed by score; ties prefer the smaller Σjᵢ (§4.3), which we
// express as "smaller cardinality sorts greater" so BinaryHeap pops it first.
impl<W: PartialOrd, Y> Ord for HeapEntry<W, Y> {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.0.score.partial_cmp(&other.0.score) {
            Some(Ordering::Equal) | None => other.cardinality().cmp(&self.cardinality()),
            Some(ord) => ord,
        }
    }
}

struct NodeState<W, Y> {
    cand: BinaryHeap<HeapEntry<W, Y>>,
    emitted: Vec<Rc<Derivation<W, Y>>>,
    uniques: HashSet<(EdgeId, Vec<usize>)>,
    seeded: bool,
}

impl<W, Y> Default for NodeState<W, Y> {
    fn default() -> Self {
        Self {
            cand: BinaryHeap::new(),
            emitted: Vec::new(),
            uniques: HashSet::new(),
            seeded: false,
        }
    }
}

/// lazy k-best derivation extractor (§4.3), following Huang & Chiang's
/// Algorithm 3: each node lazily grows its own ordered derivation list `D`
/// on demand, driven by a candidate max-heap `cand` seeded from its
/// incoming edges and advanced one back-index at a time.
///
/// `weight` scores a bare edge (combined with antecedent scores via
/// `Semiring::times`); `traverse` builds a node's yield from its edge and
/// its tails' yields; `filter` is the duplicate filter φ — when it returns
/// true for a popped derivation, that derivation is *not* emitted into `D`
/// but is still advanced, matching the reference algorithm.
pub struct KBest<'graph, W, Y, F, X, Phi> {
    graph: &'graph Hypergraph,
    weight: F,
    traverse: X,
    filter: RefCell<Phi>,
    states: Vec<RefCell<NodeState<W, Y>>>,
}

impl<'graph, W, Y, F, X, Phi> KBest<'graph, W, Y, F, X, Phi>
where
    W: Semiring + PartialOrd,
    Y: Clone,
    F: Fn(Edge<'graph>) -> W,
    X: Fn(Edge<'graph>, &[&Y]) -> Y,
    Phi: FnMut(NodeId, &Y) -> bool,
{
    pub fn new(graph: &'graph Hypergraph, weight: F, traverse: X, filter: Phi) -> Result<Self> {
        if graph.goal().is_none() {
            return Err(Error::InvalidGraph("goal unset".into()));
        }
        let states = (0..graph.node_count()).map(|_| RefCell::new(NodeState::default())).collect();
        Ok(Self {
            graph,
            weight,
            traverse,
            filter: RefCell::new(filter),
            states,
        })
    }

    /// the k-th best derivation's yield and score at the goal, or
    /// `Error::Exhausted` once fewer than k+1 derivations exist.
    pub fn get(&self, k: usize) -> Result<(Y, W)> {
        let goal = self.graph.goal().expect("validated in new()");
        match self.kth(goal, k)? {
            Some(d) => Ok((d.value.clone(), d.score.clone())),
            None => Err(Error::Exhausted),
        }
    }

    fn make_derivation(&self, edge_id: EdgeId, j: Vec<usize>) -> Result<Option<Rc<Derivation<W, Y>>>> {
        let edge = self.graph.edge(edge_id);
        let mut score = (self.weight)(edge);
        let mut antecedents = Vec::with_capacity(edge.arity());
        for (i, tail) in edge.tails().enumerate() {
            match self.kth(tail.id(), j[i])? {
                Some(ant) => {
                    score = score.times(&ant.score);
                    antecedents.push(ant);
                }
                None => return Ok(None),
            }
        }
        let refs: Vec<&Y> = antecedents.iter().map(|d| &d.value).collect();
        let value = (self.traverse)(edge, &refs);
        Ok(Some(Rc::new(Derivation { edge: edge_id, j, score, value })))
    }

    fn seed(&self, v: NodeId) -> Result<()> {
        {
            let state = self.states[v.index()].borrow();
            if state.seeded {
                return Ok(());
            }
        }
        self.states[v.index()].borrow_mut().seeded = true;
        let edge_ids: Vec<EdgeId> = self.graph.node(v).incoming().map(|e| e.id()).collect();
        for edge_id in edge_ids {
            let arity = self.graph.edge(edge_id).arity();
            if let Some(d) = self.make_derivation(edge_id, vec![0; arity])? {
                self.states[v.index()].borrow_mut().cand.push(HeapEntry(d));
            }
        }
        Ok(())
    }

    fn lazy_next(&self, v: NodeId, derivation: &Rc<Derivation<W, Y>>) -> Result<()> {
        let tails: Vec<NodeId> = self.graph.edge(derivation.edge).tails().map(|t| t.id()).collect();
        for i in 0..derivation.j.len() {
            let mut j = derivation.j.clone();
            j[i] += 1;
            if self.kth(tails[i], j[i])?.is_none() {
                continue;
            }
            let key = (derivation.edge, j.clone());
            let already_seen = {
                let state = self.states[v.index()].borrow();
                state.uniques.contains(&key)
            };
            if already_seen {
                continue;
            }
            self.states[v.index()].borrow_mut().uniques.insert(key);
            if let Some(next) = self.make_derivation(derivation.edge, j)? {
                self.states[v.index()].borrow_mut().cand.push(HeapEntry(next));
            }
        }
        Ok(())
    }

    fn kth(&self, v: NodeId, k: usize) -> Result<Option<Rc<Derivation<W, Y>>>> {
        self.seed(v)?;
        loop {
            {
                let state = self.states[v.index()].borrow();
                if k < state.emitted.len() {
                    return Ok(Some(state.emitted[k].clone()));
                }
            }

            let last = self.states[v.index()].borrow().emitted.last().cloned();
            if let Some(last) = last {
                self.lazy_next(v, &last)?;
            }

            let mut incremented = false;
            loop {
                let popped = self.states[v.index()].borrow_mut().cand.pop();
                let Some(HeapEntry(derivation)) = popped else {
                    break;
                };
                let skip = self.filter.borrow_mut()(v, &derivation.value);
                if skip {
                    self.lazy_next(v, &derivation)?;
                    continue;
                }
                self.states[v.index()].borrow_mut().emitted.push(derivation);
                incremented = true;
                break;
            }
            if !incremented {
                let state = self.states[v.index()].borrow();
                return Ok(state.emitted.get(k).cloned());
            }
        }
    }
}

/// the no-op duplicate filter: never rejects a candidate.
pub fn no_duplicate_filter(_node: NodeId, _value: &impl Clone) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{AttributeMap, FeatureMap};
    use crate::semiring::Tropical;

    fn concat_traversal<'g>(_edge: Edge<'g>, tails: &[&String]) -> String {
        tails.iter().map(|s| s.as_str()).collect::<Vec<_>>().join("")
    }

    #[test]
    fn single_path_yields_one_derivation_then_exhausted() {
        let mut g = Hypergraph::new();
        let a = g.add_node();
        let b = g.add_node();
        g.add_edge(b, vec![a], None, FeatureMap::new(), AttributeMap::new())
            .unwrap();
        g.set_goal(b).unwrap();

        let w1 = 2.0_f64.ln();
        let w2 = 3.0_f64.ln();
        let kbest = KBest::new(
            &g,
            |e| Tropical::new(if e.head().id() == b { w1 } else { w2 }),
            |_e, _tails: &[&()]| (),
            |_v, _y: &()| false,
        )
        .unwrap();

        let (_, score) = kbest.get(0).unwrap();
        assert!((score.score() - (w1 + w2)).abs() < 1e-9);
        assert!(matches!(kbest.get(1), Err(Error::Exhausted)));
    }

    #[test]
    fn two_edges_rank_by_score_descending() {
        let mut g = Hypergraph::new();
        let goal = g.add_node();
        let hi = g.add_edge(goal, vec![], None, FeatureMap::new(), AttributeMap::new()).unwrap();
        let lo = g.add_edge(goal, vec![], None, FeatureMap::new(), AttributeMap::new()).unwrap();
        g.set_goal(goal).unwrap();

        let log_hi = 0.6_f64.ln();
        let log_lo = 0.4_f64.ln();
        let kbest = KBest::new(
            &g,
            |e| Tropical::new(if e.id() == hi { log_hi } else { log_lo }),
            |e, _tails: &[&EdgeId]| e.id(),
            |_v, _y: &EdgeId| false,
        )
        .unwrap();

        let (first, first_score) = kbest.get(0).unwrap();
        assert_eq!(first, hi);
        assert!((first_score.score() - log_hi).abs() < 1e-9);

        let (second, second_score) = kbest.get(1).unwrap();
        assert_eq!(second, lo);
        assert!(second_score.score() <= first_score.score());

        assert!(matches!(kbest.get(2), Err(Error::Exhausted)));
    }

    #[test]
    fn traversal_builds_yield_from_tails() {
        let mut g = Hypergraph::new();
        let a = g.add_node();
        let b = g.add_node();
        g.add_edge(b, vec![a], None, FeatureMap::new(), AttributeMap::new())
            .unwrap();
        g.set_goal(b).unwrap();

        let kbest = KBest::new(
            &g,
            |_e| Tropical::new(0.0),
            |e, tails: &[&String]| {
                if tails.is_empty() {
                    "leaf".to_string()
                } else {
                    concat_traversal(e, tails)
                }
            },
            |_v, _y: &String| false,
        )
        .unwrap();
        let (yield_, _) = kbest.get(0).unwrap();
        assert_eq!(yield_, "leaf");
    }
}
