use std::sync::Arc;

use super::graph::Hypergraph;
use super::node::Node;
use super::{EdgeId, NodeId};
use crate::feature::{AttributeMap, FeatureMap};

/// an edge's own storage. `rule` is an opaque handle into an external rule
/// store (§9): it is a shared `Arc` precisely so that rescoring, which may
/// run one edge across many worker threads, never clones the rule itself.
#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub(super) head: NodeId,
    pub(super) tails: Vec<NodeId>,
    pub(super) rule: Option<Arc<str>>,
    pub(super) features: FeatureMap,
    pub(super) attributes: AttributeMap,
}

/// thin Copy wrapper around an EdgeId and a &Hypergraph, mirroring `Node`.
#[derive(Debug, Clone, Copy)]
pub struct Edge<'graph> {
    id: EdgeId,
    graph: &'graph Hypergraph,
}

impl<'graph> Edge<'graph> {
    pub(super) fn new(id: EdgeId, graph: &'graph Hypergraph) -> Self {
        Self { id, graph }
    }

    fn record(&self) -> &'graph EdgeRecord {
        self.graph.edge_record(self.id)
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn head(&self) -> Node<'graph> {
        self.graph.node(self.record().head)
    }

    pub fn tail_ids(&self) -> &'graph [NodeId] {
        &self.record().tails
    }

    pub fn tails(&self) -> impl Iterator<Item = Node<'graph>> + '_ {
        self.record().tails.iter().map(move |&t| self.graph.node(t))
    }

    pub fn arity(&self) -> usize {
        self.record().tails.len()
    }

    pub fn rule(&self) -> Option<&'graph str> {
        self.record().rule.as_deref()
    }

    pub fn features(&self) -> &'graph FeatureMap {
        &self.record().features
    }

    pub fn attributes(&self) -> &'graph AttributeMap {
        &self.record().attributes
    }
}

impl std::fmt::Display for Edge<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
