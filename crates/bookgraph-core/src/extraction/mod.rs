//! Concept extraction from book sections
//!
//! Each section long enough to be worth asking about is sent to the
//! completion service, which answers with `{"concepts": [...]}`. The per-section
//! lists are gathered into a [`ConceptData`].

use std::collections::BTreeMap;

use tracing::{error, info};

use crate::concepts::{ConceptData, Section};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::llm::json::{dedup, to_str_list};
use crate::llm::{CompletionService, ModelParams};

/// Instructions for pulling concepts out of one section
pub const SYSTEM_PROMPT: &str = "You will receive the raw text of ONE book subsection.\n\
Return ONLY a single JSON object with this shape:\n  \
{\"concepts\": [\"...\", \"...\"]}\n\
- Concepts must be language-agnostic ideas (e.g., 'Observer pattern',\n  \
'Encapsulation', 'Quadratic equations').\n\
- Do NOT include languages, tools, frameworks, brands, or people.\n\
- Deduplicate; use concise canonical names.\n\
If nothing substantive, return {\"concepts\": []}.\n\
No prose; only the JSON object.";

/// Extraction settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// Sections with fewer characters are skipped
    pub min_chars: usize,
    /// Log every N sections
    pub progress_every: usize,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            min_chars: 100,
            progress_every: 25,
        }
    }
}

impl From<&PipelineConfig> for ExtractionOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            min_chars: config.min_section_chars,
            progress_every: config.progress_every,
        }
    }
}

/// Extracts concepts section by section
pub struct ConceptExtractor<'a, S: CompletionService + ?Sized> {
    service: &'a S,
    params: ModelParams,
    options: ExtractionOptions,
}

impl<'a, S: CompletionService + ?Sized> ConceptExtractor<'a, S> {
    /// Create an extractor with default options
    pub fn new(service: &'a S, params: ModelParams) -> Self {
        Self {
            service,
            params,
            options: ExtractionOptions::default(),
        }
    }

    /// Replace the options
    pub fn with_options(mut self, options: ExtractionOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether a section is long enough to be sent
    pub fn is_eligible(&self, section: &Section) -> bool {
        section.content.chars().count() >= self.options.min_chars
    }

    /// Concepts discussed in one section, deduplicated case-insensitively
    pub async fn extract_section(&self, section: &Section) -> Result<Vec<String>> {
        let reply = self
            .service
            .generate(SYSTEM_PROMPT, &section.content, &self.params)
            .await?;
        Ok(dedup(to_str_list(reply.get("concepts"))))
    }

    /// Run over all sections
    ///
    /// A failing section counts an error and records an empty list.
    pub async fn extract_all<'s, I>(&self, sections: I) -> ConceptData
    where
        I: IntoIterator<Item = &'s Section>,
    {
        let every = self.options.progress_every.max(1);
        let mut by_key = BTreeMap::new();
        let mut eligible = 0;
        let mut errors = 0;

        for (idx, section) in sections.into_iter().enumerate() {
            if !self.is_eligible(section) {
                continue;
            }
            eligible += 1;
            let key = section.key();

            let concepts = match self.extract_section(section).await {
                Ok(concepts) => concepts,
                Err(e) => {
                    errors += 1;
                    error!(section = %key, error = %e, "Concept extraction failed");
                    Vec::new()
                }
            };

            if idx % every == 0 {
                info!(section = %key, concepts = concepts.len(), "Extracted concepts");
            }
            by_key.insert(key, concepts);
        }

        let data = ConceptData::from_sections(by_key, eligible, errors);
        info!(
            sections_parsed = data.sections_parsed,
            unique_concepts = data.unique_concepts.len(),
            errors = data.errors,
            "Concept extraction finished"
        );
        data
    }
}

/// Extract concepts from `sections` with the given options
pub async fn extract_concepts<'s, S, I>(
    sections: I,
    service: &S,
    params: &ModelParams,
    options: ExtractionOptions,
) -> ConceptData
where
    S: CompletionService + ?Sized,
    I: IntoIterator<Item = &'s Section>,
{
    ConceptExtractor::new(service, params.clone())
        .with_options(options)
        .extract_all(sections)
        .await
}
