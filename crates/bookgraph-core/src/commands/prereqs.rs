//! Prerequisite classification stage

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::concepts::{ConceptCorpus, Section};
use crate::error::{Error, Result};
use crate::llm::{CompletionService, ModelParams};
use crate::prereqs::{ClassifierOptions, PrerequisiteClassifier};
use crate::storage::ArtifactStore;

/// Outcome of prerequisite classification for a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrereqsSummary {
    pub book: String,
    pub concepts: usize,
    pub edges: usize,
    pub noisy: usize,
    pub rechecked: usize,
    pub errors: usize,
    /// Whether section text was available for the recheck
    pub with_context: bool,
    pub saved_to: PathBuf,
}

/// Concepts artifact (plus sections when readable) -> prerequisites artifact
pub async fn run<S: CompletionService + ?Sized>(
    store: &ArtifactStore,
    book_title: &str,
    service: &S,
    params: &ModelParams,
    options: ClassifierOptions,
) -> Result<PrereqsSummary> {
    let concepts = store.load_concepts(book_title)?;
    let sections = load_context(store, book_title);
    let with_context = !sections.is_empty();

    let corpus = ConceptCorpus::from_sections(concepts, sections);
    info!(book = %book_title, concepts = corpus.index().len(), with_context, "Classifying prerequisites");

    let result = PrerequisiteClassifier::new(&corpus, service, params.clone())
        .with_options(options)
        .run()
        .await;
    let saved_to = store.save_prereqs(book_title, &result)?;

    Ok(PrereqsSummary {
        book: book_title.to_string(),
        concepts: result.per_concept.len(),
        edges: result.edges.len(),
        noisy: result.noisy_concepts.len(),
        rechecked: result.meta.rechecked.len(),
        errors: result.errors,
        with_context,
        saved_to,
    })
}

/// Section text for the recheck; any failure means running without context
fn load_context(store: &ArtifactStore, book_title: &str) -> Vec<Section> {
    match store.load_sections(book_title) {
        Ok(sections) => sections,
        Err(Error::ArtifactNotFound(path)) => {
            info!(path = %path, "No sections artifact, proceeding without context recheck");
            Vec::new()
        }
        Err(e) => {
            warn!(error = %e, "Sections unreadable, proceeding without context recheck");
            Vec::new()
        }
    }
}
