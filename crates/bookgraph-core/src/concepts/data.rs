//! Sections and the concept extraction result

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::normalize::canonical;

/// Stable location of a section: book, chapter, position within the chapter
///
/// Ordering is lexicographic over the three fields, which is the order every
/// index in this crate walks sections in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectionKey {
    pub book_title: String,
    pub chapter: String,
    pub section_index: usize,
}

impl SectionKey {
    /// Create a new key
    pub fn new(book_title: impl Into<String>, chapter: impl Into<String>, section_index: usize) -> Self {
        Self {
            book_title: book_title.into(),
            chapter: chapter.into(),
            section_index,
        }
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {} / #{}", self.book_title, self.chapter, self.section_index)
    }
}

/// A section of a book as supplied by the section source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub id: String,
    pub book_title: String,
    pub chapter: String,
    #[serde(default)]
    pub title: String,
    pub section_index: usize,
    #[serde(default)]
    pub content: String,
}

impl Section {
    /// Key of this section
    pub fn key(&self) -> SectionKey {
        SectionKey::new(&self.book_title, &self.chapter, self.section_index)
    }
}

/// Output of concept extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptData {
    /// Concept surface forms found in each section
    #[serde(with = "section_concepts")]
    pub concepts_by_key: BTreeMap<SectionKey, Vec<String>>,
    /// First-seen surface form of every distinct concept
    pub unique_concepts: BTreeSet<String>,
    /// Occurrences per case-folded concept
    pub concept_counts: BTreeMap<String, usize>,
    /// Sections that were long enough to be sent for extraction
    pub sections_parsed: usize,
    /// Sections whose extraction failed
    #[serde(default)]
    pub errors: usize,
}

impl ConceptData {
    /// Build the result from per-section lists, deriving counts and the unique set
    ///
    /// Sections are tallied in key order so the retained surface forms do not
    /// depend on the order extraction happened to run in.
    pub fn from_sections(
        concepts_by_key: BTreeMap<SectionKey, Vec<String>>,
        sections_parsed: usize,
        errors: usize,
    ) -> Self {
        let mut concept_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut unique_concepts = BTreeSet::new();

        for concepts in concepts_by_key.values() {
            for concept in concepts {
                let trimmed = concept.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let count = concept_counts.entry(trimmed.to_lowercase()).or_insert(0);
                *count += 1;
                if *count == 1 {
                    unique_concepts.insert(trimmed.to_string());
                }
            }
        }

        Self {
            concepts_by_key,
            unique_concepts,
            concept_counts,
            sections_parsed,
            errors,
        }
    }

    /// Frequency of a concept under any casing
    pub fn count(&self, concept: &str) -> usize {
        self.concept_counts
            .get(&canonical(concept))
            .copied()
            .unwrap_or(0)
    }

    /// Every listed concept is in the unique set and has a positive count
    pub fn is_consistent(&self) -> bool {
        let unique: BTreeSet<String> = self.unique_concepts.iter().map(|c| canonical(c)).collect();
        self.concepts_by_key
            .values()
            .flatten()
            .map(|c| canonical(c))
            .filter(|c| !c.is_empty())
            .all(|c| unique.contains(&c) && self.concept_counts.get(&c).is_some_and(|n| *n >= 1))
    }
}

/// `concepts_by_key` travels as a list of `{book_title, chapter, section_index, concepts}`
/// records since JSON object keys must be strings.
pub(crate) mod section_concepts {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::SectionKey;

    #[derive(Serialize)]
    struct EntryRef<'a> {
        #[serde(flatten)]
        key: &'a SectionKey,
        concepts: &'a [String],
    }

    #[derive(Deserialize)]
    struct Entry {
        #[serde(flatten)]
        key: SectionKey,
        #[serde(default)]
        concepts: Vec<String>,
    }

    pub fn serialize<S>(map: &BTreeMap<SectionKey, Vec<String>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(map.iter().map(|(key, concepts)| EntryRef { key, concepts }))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<SectionKey, Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        let mut map = BTreeMap::new();
        for entry in entries {
            map.entry(entry.key)
                .or_insert_with(Vec::new)
                .extend(entry.concepts);
        }
        Ok(map)
    }
}
