//! Two-pass prerequisite classifier
//!
//! Pass one asks for prerequisites of every concept without context. Concepts
//! seen more than once are trusted outright; single-occurrence concepts may be
//! flagged noisy. Pass two revisits only the noisy ones, this time with a slice
//! of the book text they came from, and its answer replaces the first record.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::concepts::ConceptCorpus;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::graph::build_edges;
use crate::llm::{CompletionService, ModelParams};

use super::prompts::{
    concept_text, concept_with_context_text, context_noise_filter_prompt, select_system_prompt,
};
use super::record::{PrereqMeta, PrereqRecord, PrereqResult};

/// Knobs for a classifier run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierOptions {
    /// Characters of section text sent with a recheck
    pub context_chars: usize,
    /// Log every N concepts in the first pass
    pub progress_every: usize,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            context_chars: 2000,
            progress_every: 25,
        }
    }
}

impl From<&PipelineConfig> for ClassifierOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            context_chars: config.context_chars,
            progress_every: config.progress_every,
        }
    }
}

/// Records from the context-free pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstPass {
    pub records: BTreeMap<String, PrereqRecord>,
    /// Concepts flagged noisy, in processing order
    pub noisy: Vec<String>,
    pub errors: usize,
}

/// Replacement records from the context-aware pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recheck {
    pub updates: BTreeMap<String, PrereqRecord>,
    /// Concepts that came back not noisy
    pub corrected: Vec<String>,
    pub errors: usize,
}

/// Classifies every concept of a corpus through a completion service
pub struct PrerequisiteClassifier<'a, S: CompletionService + ?Sized> {
    corpus: &'a ConceptCorpus,
    service: &'a S,
    params: ModelParams,
    options: ClassifierOptions,
}

impl<'a, S: CompletionService + ?Sized> PrerequisiteClassifier<'a, S> {
    /// Create a classifier with default options
    pub fn new(corpus: &'a ConceptCorpus, service: &'a S, params: ModelParams) -> Self {
        Self {
            corpus,
            service,
            params,
            options: ClassifierOptions::default(),
        }
    }

    /// Replace the run options
    pub fn with_options(mut self, options: ClassifierOptions) -> Self {
        self.options = options;
        self
    }

    /// Run both passes and assemble the result
    pub async fn run(&self) -> PrereqResult {
        let first = self.first_pass().await;
        let recheck = self.recheck(&first.noisy).await;

        let mut per_concept = first.records;
        per_concept.extend(recheck.updates);

        let noisy_concepts: Vec<String> = per_concept
            .iter()
            .filter(|(_, record)| record.noisy)
            .map(|(concept, _)| concept.clone())
            .collect();
        let edges = build_edges(&per_concept);
        let errors = first.errors + recheck.errors;

        info!(
            concepts = per_concept.len(),
            edges = edges.len(),
            noisy = noisy_concepts.len(),
            corrected = recheck.corrected.len(),
            errors,
            "Prerequisite classification finished"
        );

        PrereqResult {
            per_concept,
            noisy_concepts,
            edges,
            errors,
            meta: PrereqMeta {
                counts: self.corpus.concept_counts().clone(),
                rechecked: recheck.corrected,
                generated_at: Utc::now(),
            },
        }
    }

    /// Classify every indexed concept without context
    ///
    /// A failed call counts an error and leaves an empty, non-noisy record.
    pub async fn first_pass(&self) -> FirstPass {
        let concepts: Vec<&str> = self.corpus.concepts().collect();
        let total = concepts.len();
        let every = self.options.progress_every.max(1);
        let mut pass = FirstPass::default();

        for (idx, concept) in concepts.into_iter().enumerate() {
            let record = match self.classify(concept).await {
                Ok(record) => record,
                Err(e) => {
                    pass.errors += 1;
                    error!(concept, error = %e, "Prerequisite request failed");
                    PrereqRecord::empty(concept)
                }
            };

            if idx % every == 0 {
                info!(
                    progress = %format!("{}/{}", idx + 1, total),
                    concept,
                    noisy = record.noisy,
                    prereqs = record.prerequisites.len(),
                    "Classified concept"
                );
            }

            if record.noisy {
                pass.noisy.push(concept.to_string());
            }
            pass.records.insert(concept.to_string(), record);
        }

        pass
    }

    /// Re-decide noisy concepts with book context
    ///
    /// Concepts without an occurrence or without text keep their first record.
    /// A failed call counts an error and replaces the record with an empty,
    /// non-noisy one.
    pub async fn recheck(&self, noisy: &[String]) -> Recheck {
        let total = noisy.len();
        let every = (total / 10).max(1);
        let mut pass = Recheck::default();

        for (idx, concept) in noisy.iter().enumerate() {
            let record = match self.classify_with_context(concept).await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    debug!(concept = %concept, "No context available, keeping first verdict");
                    continue;
                }
                Err(e) => {
                    pass.errors += 1;
                    error!(concept = %concept, error = %e, "Recheck request failed");
                    pass.updates
                        .insert(concept.clone(), PrereqRecord::empty(concept.as_str()));
                    continue;
                }
            };

            if idx % every == 0 {
                info!(
                    progress = %format!("{}/{}", idx + 1, total),
                    concept = %concept,
                    noisy = record.noisy,
                    prereqs = record.prerequisites.len(),
                    "Rechecked concept"
                );
            }

            if !record.noisy {
                pass.corrected.push(concept.clone());
            }
            pass.updates.insert(concept.clone(), record);
        }

        pass
    }

    /// First-pass verdict for one concept
    pub async fn classify(&self, concept: &str) -> Result<PrereqRecord> {
        let count = self.corpus.count(concept);
        let prompt = select_system_prompt(concept, count, self.corpus);
        let reply = self
            .service
            .generate(&prompt, &concept_text(concept), &self.params)
            .await?;

        let mut record = PrereqRecord::from_reply(&reply, concept);
        if count > 1 {
            record.noisy = false;
        }
        Ok(record)
    }

    /// Context-aware verdict for one concept, `None` when there is no context
    pub async fn classify_with_context(&self, concept: &str) -> Result<Option<PrereqRecord>> {
        let Some(key) = self.corpus.get_concept_occurrences(concept).first() else {
            return Ok(None);
        };
        let context = self.corpus.get_content(key, self.options.context_chars);
        if context.is_empty() {
            return Ok(None);
        }

        let prompt = context_noise_filter_prompt(&key.book_title, &key.chapter);
        let reply = self
            .service
            .generate(
                &prompt,
                &concept_with_context_text(concept, &context),
                &self.params,
            )
            .await?;
        Ok(Some(PrereqRecord::from_reply(&reply, concept)))
    }
}
