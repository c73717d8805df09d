//! Incrementally built prerequisite DAG
//!
//! Edges point from a concept to one of its prerequisites. Every insertion is
//! checked against the current graph: an edge `concept -> prerequisite` is
//! refused when `prerequisite` already reaches `concept`, since adding it would
//! close a cycle. Nodes are never removed and ids are never reused.
//!
//! The graph is a plain single-owner value. Callers that classify concepts in
//! parallel must still apply the resulting edges from one place, one at a time.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::concepts::canonical;
use crate::error::{Error, Result};

use super::edges::Edge;

/// Dense node identifier, assigned from 0 in order of first sight
pub type NodeId = usize;

/// What happened to a proposed edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Stored
    Added,
    /// Already present
    Duplicate,
    /// One of the names was empty after trimming
    EmptyName,
    /// Both names are the same concept
    SelfLoop,
    /// Would have closed a cycle
    CycleRejected,
}

impl EdgeOutcome {
    /// Whether the edge was stored
    pub fn is_added(self) -> bool {
        matches!(self, Self::Added)
    }
}

/// Node names and integer edges, the persisted form of a graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    /// Display name of each node, indexed by id
    pub nodes: Vec<String>,
    /// `[concept_id, prerequisite_id]` pairs in insertion order
    pub edges: Vec<[NodeId; 2]>,
}

/// Directed acyclic graph of concept prerequisites
///
/// Node weights are display names. Node indices double as [`NodeId`]s, which
/// stay dense because nodes are never removed.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    pub(super) graph: DiGraph<String, ()>,
    ids: HashMap<String, NodeIndex>,
    edge_set: HashSet<(NodeId, NodeId)>,
    edges: Vec<(NodeId, NodeId)>,
    cycles_rejected: usize,
}

impl KnowledgeGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an edge list, applying edges in order
    pub fn from_edges(edges: &[Edge]) -> Self {
        let mut graph = Self::new();
        graph.add_edges(edges);
        graph
    }

    /// Record that `concept` requires `prerequisite`
    ///
    /// Empty names and self-loops are ignored without creating nodes.
    pub fn add_prerequisite(&mut self, concept: &str, prerequisite: &str) -> EdgeOutcome {
        let concept = concept.trim();
        let prerequisite = prerequisite.trim();
        if concept.is_empty() || prerequisite.is_empty() {
            return EdgeOutcome::EmptyName;
        }
        if canonical(concept) == canonical(prerequisite) {
            return EdgeOutcome::SelfLoop;
        }
        let (Some(concept_id), Some(prereq_id)) = (self.id_of(concept), self.id_of(prerequisite))
        else {
            return EdgeOutcome::EmptyName;
        };
        self.add_edge_ids(concept_id, prereq_id)
    }

    /// Record several prerequisites of one concept
    ///
    /// Returns how many edges were stored.
    pub fn add_concept_with_prerequisites<I, S>(&mut self, concept: &str, prerequisites: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        prerequisites
            .into_iter()
            .filter(|p| self.add_prerequisite(concept, p.as_ref()).is_added())
            .count()
    }

    /// Bulk insert; returns `(added, skipped)`
    pub fn add_edges(&mut self, edges: &[Edge]) -> (usize, usize) {
        let mut added = 0;
        let mut skipped = 0;
        for edge in edges {
            if self.add_prerequisite(&edge.concept, &edge.prerequisite).is_added() {
                added += 1;
            } else {
                skipped += 1;
            }
        }
        debug!(added, skipped, "Applied edge batch");
        (added, skipped)
    }

    /// Prerequisites of a concept; all ancestors when `transitive`
    ///
    /// Direct prerequisites come back in insertion order, ancestors each once
    /// in depth-first order. Unknown concepts have none.
    pub fn prerequisites_of(&self, concept: &str, transitive: bool) -> Vec<String> {
        let Some(start) = self.ids.get(&canonical(concept)).copied() else {
            return Vec::new();
        };

        if !transitive {
            return self.names_for(&self.out_neighbors(start.index()));
        }

        let mut dfs = Dfs::new(&self.graph, start);
        let mut ancestors = Vec::new();
        while let Some(node) = dfs.next(&self.graph) {
            if node != start {
                ancestors.push(self.graph[node].clone());
            }
        }
        ancestors
    }

    /// Concepts that directly require `prerequisite`, in insertion order
    pub fn dependents_of(&self, prerequisite: &str) -> Vec<String> {
        self.lookup_id(prerequisite)
            .map(|id| self.names_for(&self.in_neighbors(id)))
            .unwrap_or_default()
    }

    /// Display name for a node id
    pub fn name_of(&self, id: NodeId) -> Result<&str> {
        self.graph
            .node_weight(NodeIndex::new(id))
            .map(String::as_str)
            .ok_or(Error::NodeNotFound(id))
    }

    /// Id for a concept, creating the node on first sight
    ///
    /// Names that are empty after trimming get no node.
    pub fn id_of(&mut self, name: &str) -> Option<NodeId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let key = canonical(name);
        if let Some(&idx) = self.ids.get(&key) {
            return Some(idx.index());
        }
        let idx = self.graph.add_node(name.to_string());
        self.ids.insert(key, idx);
        Some(idx.index())
    }

    /// Id for a concept if it has a node
    pub fn lookup_id(&self, name: &str) -> Option<NodeId> {
        self.ids.get(&canonical(name)).map(|idx| idx.index())
    }

    /// `(concept_id, prerequisite_id)` pairs in insertion order
    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    /// Display names indexed by node id
    pub fn node_names(&self) -> Vec<&str> {
        self.graph.node_weights().map(String::as_str).collect()
    }

    /// Direct prerequisite ids of a node, in insertion order
    pub fn out_neighbors(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Direct dependent ids of a node, in insertion order
    pub fn in_neighbors(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Incoming)
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edges refused because they would have closed a cycle
    pub fn cycles_rejected(&self) -> usize {
        self.cycles_rejected
    }

    /// Full-graph acyclicity check
    ///
    /// Always true for a graph built through this type; kept as a self-check.
    /// Uses the iterative topological sort so long chains do not grow the stack.
    pub fn is_acyclic(&self) -> bool {
        toposort(&self.graph, None).is_ok()
    }

    /// Names and integer edges for persistence
    pub fn to_export(&self) -> GraphExport {
        GraphExport {
            nodes: self.graph.node_weights().cloned().collect(),
            edges: self.edges.iter().map(|&(c, p)| [c, p]).collect(),
        }
    }

    fn add_edge_ids(&mut self, concept_id: NodeId, prereq_id: NodeId) -> EdgeOutcome {
        if self.edge_set.contains(&(concept_id, prereq_id)) {
            return EdgeOutcome::Duplicate;
        }
        let concept = NodeIndex::new(concept_id);
        let prereq = NodeIndex::new(prereq_id);
        if has_path_connecting(&self.graph, prereq, concept, None) {
            self.cycles_rejected += 1;
            warn!(
                concept = %self.graph[concept],
                prerequisite = %self.graph[prereq],
                "Edge would create a cycle, skipping"
            );
            return EdgeOutcome::CycleRejected;
        }

        self.edge_set.insert((concept_id, prereq_id));
        self.edges.push((concept_id, prereq_id));
        self.graph.add_edge(concept, prereq, ());
        EdgeOutcome::Added
    }

    /// petgraph lists the newest edge first; flip back to insertion order
    fn neighbors(&self, id: NodeId, direction: Direction) -> Vec<NodeId> {
        if id >= self.graph.node_count() {
            return Vec::new();
        }
        let mut ids: Vec<NodeId> = self
            .graph
            .neighbors_directed(NodeIndex::new(id), direction)
            .map(|idx| idx.index())
            .collect();
        ids.reverse();
        ids
    }

    fn names_for(&self, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| self.graph[NodeIndex::new(id)].clone())
            .collect()
    }
}
