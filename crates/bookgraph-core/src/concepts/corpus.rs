//! Concept corpus: extraction output joined with the section text it came from

use std::collections::BTreeMap;

use super::data::{ConceptData, Section, SectionKey};
use super::index::{ConceptIndex, build_index};

/// Immutable view over concepts, their occurrences and the source sections
#[derive(Debug, Clone, Default)]
pub struct ConceptCorpus {
    concepts: ConceptData,
    sections_by_key: BTreeMap<SectionKey, Section>,
    index: ConceptIndex,
}

impl ConceptCorpus {
    /// Build a corpus; `sections_by_key` may be empty when no text is available
    pub fn from_concepts(concepts: ConceptData, sections_by_key: BTreeMap<SectionKey, Section>) -> Self {
        let index = build_index(&concepts);
        Self {
            concepts,
            sections_by_key,
            index,
        }
    }

    /// Build a corpus from a flat list of sections
    pub fn from_sections<I>(concepts: ConceptData, sections: I) -> Self
    where
        I: IntoIterator<Item = Section>,
    {
        let sections_by_key = sections.into_iter().map(|s| (s.key(), s)).collect();
        Self::from_concepts(concepts, sections_by_key)
    }

    /// The extraction result this corpus was built from
    pub fn concept_data(&self) -> &ConceptData {
        &self.concepts
    }

    /// The occurrence index
    pub fn index(&self) -> &ConceptIndex {
        &self.index
    }

    /// Case-insensitive frequency of a concept, 0 if absent
    pub fn count(&self, concept: &str) -> usize {
        self.concepts.count(concept)
    }

    /// Frequencies keyed by case-folded concept
    pub fn concept_counts(&self) -> &BTreeMap<String, usize> {
        &self.concepts.concept_counts
    }

    /// Sections a concept occurs in, in sorted key order
    pub fn get_concept_occurrences(&self, concept: &str) -> &[SectionKey] {
        self.index.occurrences(concept)
    }

    /// Indexed concepts in display form, sorted
    pub fn concepts(&self) -> impl Iterator<Item = &str> {
        self.index.concepts()
    }

    /// Whether any section text is available
    pub fn has_sections(&self) -> bool {
        !self.sections_by_key.is_empty()
    }

    /// Trimmed text of a section, cut to `max_chars` characters when non-zero
    ///
    /// Returns an empty string for unknown keys.
    pub fn get_content(&self, key: &SectionKey, max_chars: usize) -> String {
        let Some(section) = self.sections_by_key.get(key) else {
            return String::new();
        };
        let text = section.content.trim();
        if max_chars == 0 {
            return text.to_string();
        }
        match text.char_indices().nth(max_chars) {
            Some((cut, _)) => text[..cut].to_string(),
            None => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(chapter: &str, index: usize, content: &str) -> Section {
        Section {
            id: format!("{}-{}", chapter, index),
            book_title: "Book".to_string(),
            chapter: chapter.to_string(),
            title: String::new(),
            section_index: index,
            content: content.to_string(),
        }
    }

    fn corpus() -> ConceptCorpus {
        let mut by_key = BTreeMap::new();
        by_key.insert(SectionKey::new("Book", "1", 0), vec!["Graphs".to_string(), "Édges".to_string()]);
        by_key.insert(SectionKey::new("Book", "2", 0), vec!["graphs".to_string()]);
        let data = ConceptData::from_sections(by_key, 2, 0);
        ConceptCorpus::from_sections(
            data,
            vec![section("1", 0, "  Édges connect vertices.  "), section("2", 0, "More graphs")],
        )
    }

    #[test]
    fn test_count_and_occurrences() {
        let corpus = corpus();
        assert_eq!(corpus.count("GRAPHS"), 2);
        assert_eq!(corpus.count("trees"), 0);
        assert_eq!(corpus.get_concept_occurrences("graphs").len(), 2);
        assert_eq!(corpus.concepts().collect::<Vec<_>>(), vec!["Graphs", "Édges"]);
    }

    #[test]
    fn test_get_content_truncates_on_char_boundary() {
        let corpus = corpus();
        let key = SectionKey::new("Book", "1", 0);
        assert_eq!(corpus.get_content(&key, 0), "Édges connect vertices.");
        assert_eq!(corpus.get_content(&key, 3), "Édg");
        assert_eq!(corpus.get_content(&key, 1000), "Édges connect vertices.");
    }

    #[test]
    fn test_get_content_unknown_key_is_empty() {
        let corpus = corpus();
        assert_eq!(corpus.get_content(&SectionKey::new("Other", "1", 0), 10), "");
    }

    #[test]
    fn test_corpus_without_sections() {
        let corpus = ConceptCorpus::from_concepts(ConceptData::default(), BTreeMap::new());
        assert!(!corpus.has_sections());
        assert_eq!(corpus.concepts().count(), 0);
    }
}
