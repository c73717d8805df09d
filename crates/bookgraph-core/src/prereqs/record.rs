//! Classifier records and the pipeline's output bundle

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::concepts::canonical;
use crate::graph::Edge;
use crate::llm::json::{dedup, to_str_list, truthy};

/// Verdict and prerequisites for one concept
///
/// `prerequisites` is deduplicated case-insensitively and never contains the
/// concept itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrereqRecord {
    pub concept: String,
    pub noisy: bool,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

impl PrereqRecord {
    /// Non-noisy record with no prerequisites
    pub fn empty(concept: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            noisy: false,
            prerequisites: Vec::new(),
        }
    }

    /// Normalize a model reply for `concept`
    pub fn from_reply(reply: &Map<String, Value>, concept: &str) -> Self {
        let folded = canonical(concept);
        let prerequisites = dedup(to_str_list(reply.get("prerequisites")))
            .into_iter()
            .filter(|p| canonical(p) != folded)
            .collect();

        Self {
            concept: concept.to_string(),
            noisy: truthy(reply.get("noisy")),
            prerequisites,
        }
    }
}

/// Run metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrereqMeta {
    /// Concept frequencies the run started from
    pub counts: BTreeMap<String, usize>,
    /// Concepts the context-aware recheck found not to be noisy
    pub rechecked: Vec<String>,
    #[serde(default)]
    pub generated_at: DateTime<Utc>,
}

/// Output of the two-pass classifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrereqResult {
    #[serde(alias = "prereqs_per_concept")]
    pub per_concept: BTreeMap<String, PrereqRecord>,
    /// Concepts still noisy after the recheck
    pub noisy_concepts: Vec<String>,
    /// One edge per prerequisite of every non-noisy concept
    pub edges: Vec<Edge>,
    /// Failed completion calls across both passes
    pub errors: usize,
    #[serde(default)]
    pub meta: PrereqMeta,
}
