//! Decoding of persisted concept data
//!
//! Two shapes exist on disk. Current files carry `"format": "structured"` and
//! list each section as a record. Older files have no tag, store sections as
//! `[[book, chapter, index], [concepts...]]` pairs and may call the parsed
//! count `eligible_sections`. Both are resolved into one [`ConceptData`] here.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::concepts::{ConceptData, SectionKey, canonical};
use crate::error::{Error, Result};

/// Tag value written into structured artifacts
pub const STRUCTURED_FORMAT: &str = "structured";

/// A concepts artifact after shape detection
#[derive(Debug, Clone, PartialEq)]
pub enum ConceptsArtifact {
    Structured(ConceptData),
    Legacy(LegacyConceptData),
}

/// Untagged, tuple-keyed concept data
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LegacyConceptData {
    pub concepts_by_key: Vec<((String, String, usize), Vec<String>)>,
    #[serde(default)]
    pub unique_concepts: BTreeSet<String>,
    #[serde(default)]
    pub concept_counts: BTreeMap<String, usize>,
    #[serde(default, alias = "eligible_sections")]
    pub sections_parsed: usize,
    #[serde(default)]
    pub errors: usize,
}

#[derive(Serialize)]
struct TaggedRef<'a> {
    format: &'static str,
    #[serde(flatten)]
    data: &'a ConceptData,
}

impl ConceptsArtifact {
    /// Detect the shape of a decoded JSON document
    pub fn decode(value: Value, origin: &str) -> Result<Self> {
        let unsupported = |reason: String| Error::UnsupportedFormat {
            path: origin.to_string(),
            reason,
        };

        let Value::Object(mut object) = value else {
            return Err(unsupported("expected a JSON object".to_string()));
        };

        match object.remove("format") {
            Some(Value::String(tag)) if tag == STRUCTURED_FORMAT => {
                serde_json::from_value(Value::Object(object))
                    .map(Self::Structured)
                    .map_err(|e| unsupported(e.to_string()))
            }
            Some(other) => Err(unsupported(format!("unknown format tag {}", other))),
            None if object.contains_key("concepts_by_key") => {
                serde_json::from_value(Value::Object(object))
                    .map(Self::Legacy)
                    .map_err(|e| unsupported(e.to_string()))
            }
            None => Err(unsupported("missing concepts_by_key".to_string())),
        }
    }

    /// The canonical in-memory form
    pub fn into_concept_data(self) -> ConceptData {
        match self {
            Self::Structured(data) => data,
            Self::Legacy(legacy) => legacy.into_concept_data(),
        }
    }
}

impl LegacyConceptData {
    fn into_concept_data(self) -> ConceptData {
        let mut by_key: BTreeMap<SectionKey, Vec<String>> = BTreeMap::new();
        for ((book_title, chapter, section_index), concepts) in self.concepts_by_key {
            by_key
                .entry(SectionKey::new(book_title, chapter, section_index))
                .or_default()
                .extend(concepts);
        }

        let mut data = ConceptData {
            concepts_by_key: by_key,
            unique_concepts: self.unique_concepts,
            concept_counts: self.concept_counts,
            sections_parsed: self.sections_parsed,
            errors: self.errors,
        };
        if data.unique_concepts.is_empty() {
            if data.is_consistent() {
                return data;
            }
            warn!("Legacy concept data has no unique set, rebuilding from section lists");
            return ConceptData::from_sections(data.concepts_by_key, data.sections_parsed, data.errors);
        }

        // The unique set is an allow list; only its members are counted.
        let allowed: BTreeSet<String> = data.unique_concepts.iter().map(|c| canonical(c)).collect();
        let mut recounted: BTreeMap<String, usize> = BTreeMap::new();
        for folded in data.concepts_by_key.values().flatten().map(|c| canonical(c)) {
            if allowed.contains(&folded) {
                *recounted.entry(folded).or_insert(0) += 1;
            }
        }
        let counts_cover_sections = recounted
            .keys()
            .all(|c| data.concept_counts.get(c).is_some_and(|n| *n >= 1));
        if !counts_cover_sections {
            warn!("Legacy concept counts disagree with section lists, recounting");
            data.concept_counts = recounted;
        }
        data
    }
}

/// Structured JSON form of concept data, tag included
pub fn encode_concepts(data: &ConceptData) -> Result<Value> {
    Ok(serde_json::to_value(TaggedRef {
        format: STRUCTURED_FORMAT,
        data,
    })?)
}
