//! Concept extraction stage

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::extraction::{ExtractionOptions, extract_concepts};
use crate::llm::{CompletionService, ModelParams};
use crate::storage::ArtifactStore;

/// Outcome of concept extraction for a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConceptsSummary {
    pub book: String,
    pub sections_parsed: usize,
    pub errors: usize,
    pub unique_concepts: usize,
    pub saved_to: PathBuf,
}

/// Sections artifact -> concepts artifact
pub async fn run<S: CompletionService + ?Sized>(
    store: &ArtifactStore,
    book_title: &str,
    service: &S,
    params: &ModelParams,
    options: ExtractionOptions,
) -> Result<ConceptsSummary> {
    let sections = store.load_sections(book_title)?;
    info!(book = %book_title, sections = sections.len(), "Extracting concepts");

    let data = extract_concepts(&sections, service, params, options).await;
    let saved_to = store.save_concepts(book_title, &data)?;

    Ok(ConceptsSummary {
        book: book_title.to_string(),
        sections_parsed: data.sections_parsed,
        errors: data.errors,
        unique_concepts: data.unique_concepts.len(),
        saved_to,
    })
}
