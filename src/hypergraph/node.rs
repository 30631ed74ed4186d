use super::edge::Edge;
use super::graph::Hypergraph;
use super::{EdgeId, NodeId};

/// a node's own storage: nothing but the edges that point into it. the
/// node's position in `Hypergraph::nodes` is its id.
#[derive(Debug, Clone, Default)]
pub struct NodeRecord {
    pub(super) incoming: Vec<EdgeId>,
}

/// a Node is a wrapper around a NodeId and a &Hypergraph. because it's a
/// thin wrapper around an index, it's cheap to Copy; holding a reference to
/// the graph is what makes navigation methods possible.
#[derive(Debug, Clone, Copy)]
pub struct Node<'graph> {
    id: NodeId,
    graph: &'graph Hypergraph,
}

impl<'graph> Node<'graph> {
    pub(super) fn new(id: NodeId, graph: &'graph Hypergraph) -> Self {
        Self { id, graph }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn incoming(&self) -> impl Iterator<Item = Edge<'graph>> + '_ {
        self.graph
            .node_record(self.id)
            .incoming
            .iter()
            .map(move |&e| self.graph.edge(e))
    }

    pub fn is_source(&self) -> bool {
        self.graph.node_record(self.id).incoming.is_empty()
    }
}

impl std::fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
