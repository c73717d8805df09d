//! Concept layer
//!
//! Canonical naming, the extraction result, the occurrence index and the
//! corpus that joins concepts back to section text.

mod corpus;
mod data;
mod index;
mod normalize;

pub use corpus::ConceptCorpus;
pub use data::{ConceptData, Section, SectionKey};
pub use index::{ConceptIndex, build_index};
pub use normalize::{CanonMap, canonical};
