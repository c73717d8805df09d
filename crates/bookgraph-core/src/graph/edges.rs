//! Named prerequisite edges and their derivation from classifier output

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::prereqs::PrereqRecord;

/// "`prerequisite` must be understood before `concept`"
///
/// Both ends are named so the orientation survives serialization unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub concept: String,
    pub prerequisite: String,
}

impl Edge {
    /// Create a new edge
    pub fn new(concept: impl Into<String>, prerequisite: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            prerequisite: prerequisite.into(),
        }
    }
}

/// Edges for every prerequisite of every non-noisy record, in concept order
pub fn build_edges(per_concept: &BTreeMap<String, PrereqRecord>) -> Vec<Edge> {
    per_concept
        .iter()
        .filter(|(_, record)| !record.noisy)
        .flat_map(|(concept, record)| {
            record
                .prerequisites
                .iter()
                .map(move |prereq| Edge::new(concept.clone(), prereq.clone()))
        })
        .collect()
}

/// Distinct names and total edges in an edge list
pub fn count_nodes_and_edges(edges: &[Edge]) -> (usize, usize) {
    let nodes: HashSet<&str> = edges
        .iter()
        .flat_map(|e| [e.concept.as_str(), e.prerequisite.as_str()])
        .collect();
    (nodes.len(), edges.len())
}
