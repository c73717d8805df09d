//! Graph building and queries

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::graph::{GraphStats, KnowledgeGraph};
use crate::storage::ArtifactStore;

/// What to report besides statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQuery {
    pub top_k: usize,
    /// Concept whose prerequisites to list
    pub concept: Option<String>,
    /// List all ancestors instead of direct prerequisites
    pub transitive: bool,
    /// Concept whose dependents to list
    pub dependents: Option<String>,
}

impl Default for GraphQuery {
    fn default() -> Self {
        Self {
            top_k: 5,
            concept: None,
            transitive: false,
            dependents: None,
        }
    }
}

/// Names related to one concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConceptNeighbors {
    pub concept: String,
    pub names: Vec<String>,
}

/// Graph statistics plus any requested queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphReport {
    pub book: String,
    pub added: usize,
    pub skipped: usize,
    pub stats: GraphStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<ConceptNeighbors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependents: Option<ConceptNeighbors>,
    pub saved_to: PathBuf,
}

/// Edge list artifact -> graph export plus report
pub fn run(store: &ArtifactStore, book_title: &str, query: &GraphQuery) -> Result<GraphReport> {
    let edges = store.load_edges(book_title)?;

    let mut graph = KnowledgeGraph::new();
    let (added, skipped) = graph.add_edges(&edges);
    info!(book = %book_title, added, skipped, cycles = graph.cycles_rejected(), "Built knowledge graph");

    let prerequisites = query.concept.as_ref().map(|concept| ConceptNeighbors {
        concept: concept.clone(),
        names: graph.prerequisites_of(concept, query.transitive),
    });
    let dependents = query.dependents.as_ref().map(|concept| ConceptNeighbors {
        concept: concept.clone(),
        names: graph.dependents_of(concept),
    });

    let saved_to = store.save_graph(book_title, &graph.to_export())?;

    Ok(GraphReport {
        book: book_title.to_string(),
        added,
        skipped,
        stats: graph.stats(query.top_k),
        prerequisites,
        dependents,
        saved_to,
    })
}
