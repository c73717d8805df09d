//! Artifact storage
//!
//! Every pipeline stage persists its output as pretty-printed JSON under the
//! results directory:
//!
//! ```text
//! results/
//! ├── sections/<slug>.json
//! ├── concepts/<slug>.json
//! ├── prerequisites/<slug>.json
//! ├── edges/<slug>.json
//! └── graph/<slug>.json
//! ```
//!
//! Malformed files surface as [`Error::UnsupportedFormat`](crate::Error::UnsupportedFormat),
//! missing ones as [`Error::ArtifactNotFound`](crate::Error::ArtifactNotFound).

mod concepts_format;
mod paths;
mod store;

pub use concepts_format::{ConceptsArtifact, LegacyConceptData, STRUCTURED_FORMAT, encode_concepts};
pub use paths::{ArtifactKind, ArtifactPaths, slugify};
pub use store::{ArtifactStore, save_json};
