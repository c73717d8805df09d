//! Edge extraction stage

use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;
use crate::graph::{build_edges, count_nodes_and_edges};
use crate::storage::ArtifactStore;

/// Outcome of edge extraction for a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgesSummary {
    pub book: String,
    pub nodes: usize,
    pub edges: usize,
    pub saved_to: PathBuf,
}

/// Prerequisites artifact -> edge list artifact
pub fn run(store: &ArtifactStore, book_title: &str) -> Result<EdgesSummary> {
    let result = store.load_prereqs(book_title)?;
    let edges = build_edges(&result.per_concept);
    let (nodes, count) = count_nodes_and_edges(&edges);
    let saved_to = store.save_edges(book_title, &edges)?;

    Ok(EdgesSummary {
        book: book_title.to_string(),
        nodes,
        edges: count,
        saved_to,
    })
}
