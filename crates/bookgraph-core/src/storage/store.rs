//! Reading and writing pipeline artifacts as JSON files

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::concepts::{ConceptData, Section};
use crate::error::{Error, Result};
use crate::graph::{Edge, GraphExport};
use crate::prereqs::PrereqResult;

use super::concepts_format::{ConceptsArtifact, encode_concepts};
use super::paths::{ArtifactKind, ArtifactPaths};

/// Book-keyed artifact store under one results directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    paths: ArtifactPaths,
}

impl ArtifactStore {
    /// Create a store rooted at `results_dir`
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            paths: ArtifactPaths::new(results_dir),
        }
    }

    /// Path of an artifact for a book
    pub fn path(&self, kind: ArtifactKind, book_title: &str) -> PathBuf {
        self.paths.path(kind, book_title)
    }

    /// Whether an artifact exists
    pub fn exists(&self, kind: ArtifactKind, book_title: &str) -> bool {
        self.path(kind, book_title).is_file()
    }

    pub fn save_sections(&self, book_title: &str, sections: &[Section]) -> Result<PathBuf> {
        self.save(ArtifactKind::Sections, book_title, &sections)
    }

    /// Sections of a book; anything but a list of section records is unsupported
    pub fn load_sections(&self, book_title: &str) -> Result<Vec<Section>> {
        let path = self.path(ArtifactKind::Sections, book_title);
        let value = read_value(&path)?;
        if !value.is_array() {
            return Err(unsupported(&path, "expected a list of sections"));
        }
        serde_json::from_value(value).map_err(|e| unsupported(&path, e))
    }

    pub fn save_concepts(&self, book_title: &str, data: &ConceptData) -> Result<PathBuf> {
        self.save(ArtifactKind::Concepts, book_title, &encode_concepts(data)?)
    }

    /// Concept data in either the structured or the legacy shape
    pub fn load_concepts(&self, book_title: &str) -> Result<ConceptData> {
        let path = self.path(ArtifactKind::Concepts, book_title);
        let value = read_value(&path)?;
        let artifact = ConceptsArtifact::decode(value, &path.display().to_string())?;
        Ok(artifact.into_concept_data())
    }

    pub fn save_prereqs(&self, book_title: &str, result: &PrereqResult) -> Result<PathBuf> {
        self.save(ArtifactKind::Prerequisites, book_title, result)
    }

    pub fn load_prereqs(&self, book_title: &str) -> Result<PrereqResult> {
        self.load(ArtifactKind::Prerequisites, book_title)
    }

    pub fn save_edges(&self, book_title: &str, edges: &[Edge]) -> Result<PathBuf> {
        self.save(ArtifactKind::Edges, book_title, &edges)
    }

    pub fn load_edges(&self, book_title: &str) -> Result<Vec<Edge>> {
        self.load(ArtifactKind::Edges, book_title)
    }

    pub fn save_graph(&self, book_title: &str, export: &GraphExport) -> Result<PathBuf> {
        self.save(ArtifactKind::Graph, book_title, export)
    }

    pub fn load_graph(&self, book_title: &str) -> Result<GraphExport> {
        self.load(ArtifactKind::Graph, book_title)
    }

    fn save<T: Serialize + ?Sized>(&self, kind: ArtifactKind, book_title: &str, value: &T) -> Result<PathBuf> {
        let path = self.path(kind, book_title);
        save_json(&path, value)?;
        debug!(kind = %kind, path = %path.display(), "Saved artifact");
        Ok(path)
    }

    fn load<T: DeserializeOwned>(&self, kind: ArtifactKind, book_title: &str) -> Result<T> {
        let path = self.path(kind, book_title);
        let value = read_value(&path)?;
        serde_json::from_value(value).map_err(|e| unsupported(&path, e))
    }
}

/// Write pretty JSON, creating parent directories as needed
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)?;
    }
    let contents = serde_json::to_string_pretty(value)?;
    fs::write(path, contents)?;
    Ok(())
}

fn read_value(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(Error::ArtifactNotFound(path.display().to_string()));
    }
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| unsupported(path, e))
}

fn unsupported(path: &Path, reason: impl std::fmt::Display) -> Error {
    Error::UnsupportedFormat {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
