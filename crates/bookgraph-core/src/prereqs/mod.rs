//! Prerequisite classification
//!
//! Turns a concept corpus into per-concept prerequisite records, a noisy
//! concept list and the edges the knowledge graph is built from.

mod classifier;
mod prompts;
mod record;

pub use classifier::{ClassifierOptions, FirstPass, PrerequisiteClassifier, Recheck};
pub use prompts::{
    SYSTEM_PROMPT_PREREQUISITES, concept_text, concept_with_context_text,
    context_noise_filter_prompt, noise_filter_prompt, select_system_prompt,
};
pub use record::{PrereqMeta, PrereqRecord, PrereqResult};
