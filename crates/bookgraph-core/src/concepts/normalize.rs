//! Canonical concept names
//!
//! Two surface forms name the same concept iff their trimmed, case-folded
//! forms are equal. The first surface form seen is kept for display.

use std::collections::BTreeMap;

/// Trimmed, case-folded identity of a concept name
pub fn canonical(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Stable mapping from case-folded identity to first-seen display form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonMap {
    display_by_folded: BTreeMap<String, String>,
}

impl CanonMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a surface form and return its display form
    ///
    /// Returns `None` for names that are empty after trimming.
    pub fn register(&mut self, surface: &str) -> Option<&str> {
        let trimmed = surface.trim();
        if trimmed.is_empty() {
            return None;
        }
        let display = self
            .display_by_folded
            .entry(trimmed.to_lowercase())
            .or_insert_with(|| trimmed.to_string());
        Some(display.as_str())
    }

    /// Display form of an already registered name
    pub fn lookup(&self, surface: &str) -> Option<&str> {
        self.display_by_folded
            .get(&canonical(surface))
            .map(String::as_str)
    }

    /// Whether a name has been registered under any casing
    pub fn contains(&self, surface: &str) -> bool {
        self.display_by_folded.contains_key(&canonical(surface))
    }

    /// Number of distinct concepts
    pub fn len(&self) -> usize {
        self.display_by_folded.len()
    }

    /// True if nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.display_by_folded.is_empty()
    }

    /// `(folded, display)` pairs in folded order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.display_by_folded
            .iter()
            .map(|(folded, display)| (folded.as_str(), display.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical() {
        assert_eq!(canonical("  Binary Search "), "binary search");
        assert_eq!(canonical(""), "");
    }

    #[test]
    fn test_first_seen_form_wins() {
        let mut map = CanonMap::new();
        assert_eq!(map.register(" Recursion "), Some("Recursion"));
        assert_eq!(map.register("RECURSION"), Some("Recursion"));
        assert_eq!(map.lookup("recursion"), Some("Recursion"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_empty_names_are_not_registered() {
        let mut map = CanonMap::new();
        assert_eq!(map.register("   "), None);
        assert!(map.is_empty());
        assert!(!map.contains(""));
    }
}
