//! Knowledge graph of concept prerequisites

mod edges;
mod knowledge_graph;
mod stats;

pub use edges::{Edge, build_edges, count_nodes_and_edges};
pub use knowledge_graph::{EdgeOutcome, GraphExport, KnowledgeGraph, NodeId};
pub use stats::{DegreeEntry, GraphStats};
