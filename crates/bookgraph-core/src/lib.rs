//! Bookgraph Core Library
//!
//! This crate turns the concepts extracted from a book into a prerequisite
//! graph, including:
//! - Concept corpus and case-insensitive index over book sections
//! - Concept extraction from section text
//! - Two-pass prerequisite classification through a local LLM
//! - Rate-limited, retrying completion client
//! - Acyclic knowledge graph with queries and statistics
//! - JSON artifact storage per book

pub mod commands;
pub mod concepts;
pub mod config;
pub mod error;
pub mod extraction;
pub mod graph;
pub mod llm;
pub mod prereqs;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::concepts::ConceptCorpus;
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::graph::KnowledgeGraph;
    pub use crate::llm::{CompletionClient, CompletionService};
    pub use crate::storage::ArtifactStore;
}

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod classifier_tests;
#[cfg(test)]
mod storage_tests;
