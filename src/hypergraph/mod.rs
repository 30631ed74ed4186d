//! weighted hypergraph data model (§3): nodes and multi-tail edges stored
//! in flat, append-only arenas so ids double as array indices. `Node`/`Edge`
//! are thin `Copy` accessor wrappers over an id plus a graph reference, the
//! same shape the rest of the crate's ancestry uses for tree-structured
//! data, generalized here onto true hyperedges (`Vec<NodeId>` tails).
//! Hyperedges don't map onto a plain graph's binary edges, so the arenas
//! stay hand-rolled `Vec`s; the node-level tail->head dependency relation
//! they induce does map onto one, and [`graph::Hypergraph::topological_sort`]
//! delegates to `petgraph::algo::toposort` over it rather than hand-rolling
//! Kahn's algorithm a second time.

mod edge;
mod graph;
mod node;

pub use edge::{Edge, EdgeRecord};
pub use graph::Hypergraph;
pub use node::{Node, NodeRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}
