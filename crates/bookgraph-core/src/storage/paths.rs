//! Artifact locations

use std::path::{Path, PathBuf};

/// Kinds of artifact a pipeline run reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Sections,
    Concepts,
    Prerequisites,
    Edges,
    Graph,
}

impl ArtifactKind {
    /// Subdirectory of the results directory holding this kind
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Sections => "sections",
            Self::Concepts => "concepts",
            Self::Prerequisites => "prerequisites",
            Self::Edges => "edges",
            Self::Graph => "graph",
        }
    }

    /// All kinds, in pipeline order
    pub fn all() -> &'static [ArtifactKind] {
        &[
            Self::Sections,
            Self::Concepts,
            Self::Prerequisites,
            Self::Edges,
            Self::Graph,
        ]
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// File-name-safe form of a book title
///
/// Lowercased, with every run of non-alphanumerics collapsed to one `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "book".to_string()
    } else {
        slug
    }
}

/// Resolves artifact paths under a results directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    root: PathBuf,
}

impl ArtifactPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<kind>/<slug>.json`
    pub fn path(&self, kind: ArtifactKind, book_title: &str) -> PathBuf {
        self.root
            .join(kind.dir_name())
            .join(format!("{}.json", slugify(book_title)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Structure and Interpretation of Computer Programs"), "structure-and-interpretation-of-computer-programs");
        assert_eq!(slugify("  C++: The Good Parts!! "), "c-the-good-parts");
        assert_eq!(slugify("Café Über"), "café-über");
        assert_eq!(slugify("?!"), "book");
        assert_eq!(slugify(""), "book");
    }

    #[test]
    fn test_artifact_path() {
        let paths = ArtifactPaths::new("results");
        assert_eq!(
            paths.path(ArtifactKind::Edges, "Clean Code"),
            PathBuf::from("results/edges/clean-code.json")
        );
        assert_eq!(ArtifactKind::all().len(), 5);
    }
}
