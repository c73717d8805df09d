//! Degree and chain statistics

use petgraph::Direction;
use petgraph::algo::toposort;
use serde::{Deserialize, Serialize};

use super::knowledge_graph::{KnowledgeGraph, NodeId};

/// A concept and one of its degrees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeEntry {
    pub concept: String,
    pub degree: usize,
}

/// Summary of a knowledge graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    /// Concepts with no recorded prerequisites
    pub foundations: Vec<String>,
    /// Concepts nothing depends on
    pub targets: Vec<String>,
    pub foundations_count: usize,
    pub targets_count: usize,
    pub max_out_degree: usize,
    pub max_in_degree: usize,
    /// Edges on the longest concept -> prerequisite path
    pub longest_prereq_chain: usize,
    pub top_by_out_degree: Vec<DegreeEntry>,
    pub top_by_in_degree: Vec<DegreeEntry>,
}

impl KnowledgeGraph {
    /// Compute statistics, listing the `top_k` concepts by each degree
    pub fn stats(&self, top_k: usize) -> GraphStats {
        let graph = &self.graph;
        let out_degree: Vec<usize> = graph
            .node_indices()
            .map(|u| graph.neighbors_directed(u, Direction::Outgoing).count())
            .collect();
        let in_degree: Vec<usize> = graph
            .node_indices()
            .map(|u| graph.neighbors_directed(u, Direction::Incoming).count())
            .collect();

        let names = self.node_names();
        let foundations: Vec<String> = (0..names.len())
            .filter(|&u| out_degree[u] == 0)
            .map(|u| names[u].to_string())
            .collect();
        let targets: Vec<String> = (0..names.len())
            .filter(|&u| in_degree[u] == 0)
            .map(|u| names[u].to_string())
            .collect();

        GraphStats {
            nodes: self.num_nodes(),
            edges: self.num_edges(),
            foundations_count: foundations.len(),
            targets_count: targets.len(),
            foundations,
            targets,
            max_out_degree: out_degree.iter().copied().max().unwrap_or(0),
            max_in_degree: in_degree.iter().copied().max().unwrap_or(0),
            longest_prereq_chain: self.longest_chain(),
            top_by_out_degree: top_items(&names, &out_degree, top_k),
            top_by_in_degree: top_items(&names, &in_degree, top_k),
        }
    }

    /// Longest path length, walking a topological order from the back
    ///
    /// `depth(u)` is 0 without prerequisites, else one more than the deepest
    /// prerequisite. Every prerequisite sorts after its concept, so it is
    /// already settled when the concept is reached.
    fn longest_chain(&self) -> usize {
        let Ok(order) = toposort(&self.graph, None) else {
            return 0;
        };
        let mut depth = vec![0usize; self.num_nodes()];
        for &u in order.iter().rev() {
            let d = self
                .graph
                .neighbors_directed(u, Direction::Outgoing)
                .map(|v| depth[v.index()] + 1)
                .max()
                .unwrap_or(0);
            depth[u.index()] = d;
        }
        depth.into_iter().max().unwrap_or(0)
    }
}

/// Highest degrees first, ties by id
fn top_items(names: &[&str], degrees: &[usize], top_k: usize) -> Vec<DegreeEntry> {
    let mut ids: Vec<NodeId> = (0..degrees.len()).collect();
    ids.sort_by(|a, b| degrees[*b].cmp(&degrees[*a]));
    ids.into_iter()
        .take(top_k)
        .map(|id| DegreeEntry {
            concept: names[id].to_string(),
            degree: degrees[id],
        })
        .collect()
}
