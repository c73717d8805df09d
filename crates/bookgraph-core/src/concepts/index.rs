//! Occurrence index over extraction output

use std::collections::{BTreeMap, HashSet};

use super::data::{ConceptData, SectionKey};
use super::normalize::{CanonMap, canonical};

/// Read-only lookup from canonical concepts to the sections they occur in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptIndex {
    canon_map: CanonMap,
    keys_by_canon: BTreeMap<String, Vec<SectionKey>>,
}

impl ConceptIndex {
    /// Canonical display form of a concept, if indexed
    pub fn canonical_form(&self, concept: &str) -> Option<&str> {
        self.canon_map.lookup(concept)
    }

    /// Section keys where a concept occurs, in sorted key order
    pub fn occurrences(&self, concept: &str) -> &[SectionKey] {
        self.canon_map
            .lookup(concept)
            .and_then(|display| self.keys_by_canon.get(display))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Indexed concepts in their display form, sorted
    pub fn concepts(&self) -> impl Iterator<Item = &str> {
        self.keys_by_canon.keys().map(String::as_str)
    }

    /// Number of indexed concepts
    pub fn len(&self) -> usize {
        self.keys_by_canon.len()
    }

    /// True if nothing was indexed
    pub fn is_empty(&self) -> bool {
        self.keys_by_canon.is_empty()
    }
}

/// Build the index, walking sections in sorted key order
///
/// When the unique-concept set is non-empty it acts as an allow list: a
/// concept listed in a section but absent from the set is left out.
pub fn build_index(data: &ConceptData) -> ConceptIndex {
    let allowed: HashSet<String> = data
        .unique_concepts
        .iter()
        .map(|c| canonical(c))
        .filter(|c| !c.is_empty())
        .collect();

    let mut canon_map = CanonMap::new();
    let mut keys_by_canon: BTreeMap<String, Vec<SectionKey>> = BTreeMap::new();

    for (key, concepts) in &data.concepts_by_key {
        for concept in concepts {
            let folded = canonical(concept);
            if folded.is_empty() || (!allowed.is_empty() && !allowed.contains(&folded)) {
                continue;
            }
            let Some(display) = canon_map.register(concept) else {
                continue;
            };

            let keys = keys_by_canon.entry(display.to_string()).or_default();
            if keys.last() != Some(key) {
                keys.push(key.clone());
            }
        }
    }

    ConceptIndex {
        canon_map,
        keys_by_canon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn key(chapter: &str, index: usize) -> SectionKey {
        SectionKey::new("Book", chapter, index)
    }

    fn data(entries: Vec<(SectionKey, Vec<&str>)>) -> ConceptData {
        let by_key = entries
            .into_iter()
            .map(|(k, v)| (k, v.into_iter().map(String::from).collect()))
            .collect();
        ConceptData::from_sections(by_key, 0, 0)
    }

    #[test]
    fn test_canonical_form_follows_sorted_key_order() {
        let data = data(vec![
            (key("2", 0), vec!["HASH TABLES"]),
            (key("1", 0), vec!["Hash tables"]),
        ]);
        let index = build_index(&data);

        assert_eq!(index.canonical_form("hash tables"), Some("Hash tables"));
        assert_eq!(index.occurrences("HASH tables"), &[key("1", 0), key("2", 0)]);
    }

    #[test]
    fn test_allow_list_excludes_unregistered_concepts() {
        let mut data = data(vec![(key("1", 0), vec!["Trees", "Tries"])]);
        data.unique_concepts = BTreeSet::from(["Trees".to_string()]);
        let index = build_index(&data);

        assert_eq!(index.len(), 1);
        assert!(index.occurrences("tries").is_empty());
        assert_eq!(index.concepts().collect::<Vec<_>>(), vec!["Trees"]);
    }

    #[test]
    fn test_empty_allow_list_admits_everything() {
        let mut data = data(vec![(key("1", 0), vec!["Trees", "  "])]);
        data.unique_concepts.clear();
        let index = build_index(&data);

        assert_eq!(index.len(), 1);
        assert_eq!(index.occurrences("trees"), &[key("1", 0)]);
    }

    #[test]
    fn test_unknown_concept_has_no_occurrences() {
        let index = build_index(&ConceptData::default());
        assert!(index.is_empty());
        assert!(index.occurrences("anything").is_empty());
    }
}
