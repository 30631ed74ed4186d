use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use super::edge::{Edge, EdgeRecord};
use super::node::{Node, NodeRecord};
use super::{EdgeId, NodeId};
use crate::error::{Error, Result};
use crate::feature::{AttributeMap, FeatureMap};

/// directed acyclic hypergraph (§3): nodes and edges are append-only flat
/// arenas, an edge's id is its position in `edges`, a node's id is its
/// position in `nodes`. `deps` mirrors the tail->head dependency relation
/// as a plain `petgraph` digraph over node ids alone (one edge per
/// (tail, head) pair, collapsing each hyperedge's tails to their
/// individual dependency edges) so `topological_sort` can delegate to
/// `petgraph::algo::toposort` instead of a hand-rolled traversal. `goal`
/// is `None` until set; an H is valid iff goal is set.
#[derive(Debug, Clone, Default)]
pub struct Hypergraph {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    deps: DiGraph<(), ()>,
    goal: Option<NodeId>,
}

impl Hypergraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord::default());
        let idx = self.deps.add_node(());
        debug_assert_eq!(idx.index(), id.index());
        id
    }

    pub fn add_edge(
        &mut self,
        head: NodeId,
        tails: Vec<NodeId>,
        rule: Option<Arc<str>>,
        features: FeatureMap,
        attributes: AttributeMap,
    ) -> Result<EdgeId> {
        if head.index() >= self.nodes.len() {
            return Err(Error::InvalidGraph(format!("head {head} does not exist")));
        }
        for &tail in &tails {
            if tail.index() >= self.nodes.len() {
                return Err(Error::InvalidGraph(format!("tail {tail} does not exist")));
            }
        }
        let id = EdgeId(self.edges.len() as u32);
        self.nodes[head.index()].incoming.push(id);
        for &tail in &tails {
            self.deps.add_edge(
                NodeIndex::new(tail.index()),
                NodeIndex::new(head.index()),
                (),
            );
        }
        self.edges.push(EdgeRecord {
            head,
            tails,
            rule,
            features,
            attributes,
        });
        Ok(id)
    }

    pub fn set_goal(&mut self, node: NodeId) -> Result<()> {
        if node.index() >= self.nodes.len() {
            return Err(Error::InvalidGraph(format!("goal {node} does not exist")));
        }
        self.goal = Some(node);
        Ok(())
    }

    pub fn goal(&self) -> Option<NodeId> {
        self.goal
    }

    pub fn is_valid(&self) -> bool {
        self.goal.is_some()
    }

    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node::new(id, self)
    }

    pub fn edge(&self, id: EdgeId) -> Edge<'_> {
        Edge::new(id, self)
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> + '_ {
        (0..self.nodes.len() as u32).map(move |i| self.node(NodeId(i)))
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge<'_>> + '_ {
        (0..self.edges.len() as u32).map(move |i| self.edge(EdgeId(i)))
    }

    pub(super) fn node_record(&self, id: NodeId) -> &NodeRecord {
        &self.nodes[id.index()]
    }

    pub(super) fn edge_record(&self, id: EdgeId) -> &EdgeRecord {
        &self.edges[id.index()]
    }

    /// full invariant check (§3): goal set, every id in range, every
    /// node's incoming list actually points back at that node.
    pub fn validate(&self) -> Result<()> {
        if self.goal.is_none() {
            return Err(Error::InvalidGraph("goal unset".into()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            for &e in &node.incoming {
                if e.index() >= self.edges.len() {
                    return Err(Error::InvalidGraph(format!(
                        "node {i} references dangling edge {e}"
                    )));
                }
                if self.edges[e.index()].head.index() != i {
                    return Err(Error::InvalidGraph(format!(
                        "edge {e} is not incoming to node {i}"
                    )));
                }
            }
        }
        for (i, edge) in self.edges.iter().enumerate() {
            if edge.head.index() >= self.nodes.len() {
                return Err(Error::InvalidGraph(format!("edge {i} head out of range")));
            }
            for &t in &edge.tails {
                if t.index() >= self.nodes.len() {
                    return Err(Error::InvalidGraph(format!("edge {i} tail out of range")));
                }
            }
        }
        Ok(())
    }

    /// true iff every edge satisfies head > max(tails), the ordering
    /// `topological_sort` establishes.
    pub fn is_topologically_sorted(&self) -> bool {
        self.edges.iter().all(|e| {
            e.tails
                .iter()
                .all(|t| t.index() < e.head.index())
        })
    }

    /// reorders nodes in place so that for every edge, head > max(tails),
    /// and renumbers ids throughout. Delegates the actual ordering to
    /// `petgraph::algo::toposort` over `deps`; fails with `InvalidGraph` on
    /// a cycle (reported at the node petgraph names in its `Cycle`).
    pub fn topological_sort(&mut self) -> Result<()> {
        let order: Vec<NodeId> = toposort(&self.deps, None)
            .map_err(|cycle| {
                Error::InvalidGraph(format!(
                    "cycle detected during topological sort at node {}",
                    cycle.node_id().index()
                ))
            })?
            .into_iter()
            .map(|idx| NodeId(idx.index() as u32))
            .collect();
        self.reindex(&order);
        Ok(())
    }

    /// `order[new_position] = old_id`; rewrite every stored id accordingly.
    fn reindex(&mut self, order: &[NodeId]) {
        let mut new_id_of = vec![NodeId(0); self.nodes.len()];
        for (new_pos, &old_id) in order.iter().enumerate() {
            new_id_of[old_id.index()] = NodeId(new_pos as u32);
        }

        let mut nodes = vec![NodeRecord::default(); self.nodes.len()];
        for (new_pos, &old_id) in order.iter().enumerate() {
            nodes[new_pos] = self.nodes[old_id.index()].clone();
        }
        for edge in &mut self.edges {
            edge.head = new_id_of[edge.head.index()];
            for t in &mut edge.tails {
                *t = new_id_of[t.index()];
            }
        }
        self.nodes = nodes;
        self.goal = self.goal.map(|g| new_id_of[g.index()]);
        self.rebuild_deps();
    }

    /// rebuilds `deps` from `edges` after an operation (`reindex`, `unite`)
    /// that changes node/edge ids out from under the incremental
    /// `add_node`/`add_edge` bookkeeping.
    fn rebuild_deps(&mut self) {
        let mut deps = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        for _ in 0..self.nodes.len() {
            deps.add_node(());
        }
        for edge in &self.edges {
            for &tail in &edge.tails {
                deps.add_edge(
                    NodeIndex::new(tail.index()),
                    NodeIndex::new(edge.head.index()),
                    (),
                );
            }
        }
        self.deps = deps;
    }

    /// appends `other`, offsetting all of its ids, and merges goals by
    /// introducing a fresh node with two unary edges pointing at the two
    /// original goals (§3). uniting with an empty graph is a no-op on
    /// structure and preserves the existing goal.
    pub fn unite(&mut self, mut other: Hypergraph) -> Result<()> {
        let node_offset = self.nodes.len() as u32;
        let edge_offset = self.edges.len() as u32;

        for edge in &mut other.edges {
            edge.head = NodeId(edge.head.0 + node_offset);
            for t in &mut edge.tails {
                t.0 += node_offset;
            }
        }
        for node in &mut other.nodes {
            for e in &mut node.incoming {
                e.0 += edge_offset;
            }
        }
        let other_goal = other.goal.map(|g| NodeId(g.0 + node_offset));

        self.nodes.append(&mut other.nodes);
        self.edges.append(&mut other.edges);
        self.rebuild_deps();

        match (self.goal, other_goal) {
            (Some(a), Some(b)) => {
                let merged = self.add_node();
                self.add_edge(merged, vec![a], None, FeatureMap::new(), AttributeMap::new())?;
                self.add_edge(merged, vec![b], None, FeatureMap::new(), AttributeMap::new())?;
                self.goal = Some(merged);
            }
            (None, Some(b)) => self.goal = Some(b),
            (Some(_), None) | (None, None) => {}
        }
        Ok(())
    }
}
