//! Prerequisite classifier tests

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::concepts::{ConceptCorpus, ConceptData, Section, SectionKey};
use crate::error::Error;
use crate::graph::Edge;
use crate::llm::ModelParams;
use crate::prereqs::{
    ClassifierOptions, PrereqRecord, PrerequisiteClassifier, SYSTEM_PROMPT_PREREQUISITES,
};
use crate::test_support::ScriptedService;

fn section(chapter: &str, index: usize, content: &str) -> Section {
    Section {
        id: String::new(),
        book_title: "Compilers".to_string(),
        chapter: chapter.to_string(),
        title: String::new(),
        section_index: index,
        content: content.to_string(),
    }
}

/// Corpus where each `(chapter, index, concepts)` names one section
fn corpus(entries: &[(&str, usize, &[&str])], with_text: bool) -> ConceptCorpus {
    let mut by_key = BTreeMap::new();
    let mut sections = Vec::new();
    for (chapter, index, concepts) in entries {
        by_key.insert(
            SectionKey::new("Compilers", *chapter, *index),
            concepts.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
        );
        if with_text {
            sections.push(section(chapter, *index, &format!("Text of {} #{}", chapter, index)));
        }
    }
    let data = ConceptData::from_sections(by_key, entries.len(), 0);
    ConceptCorpus::from_sections(data, sections)
}

fn concept_of(user: &str) -> &str {
    user.lines()
        .next()
        .and_then(|line| line.strip_prefix("CONCEPT: "))
        .unwrap_or("")
}

#[tokio::test]
async fn test_frequent_concept_is_never_noisy() {
    let corpus = corpus(
        &[
            ("Parsing", 0, &["Grammars"]),
            ("Parsing", 1, &["grammars"]),
            ("Scanning", 0, &["GRAMMARS"]),
        ],
        true,
    );
    let service = ScriptedService::new(|_, _| {
        Ok(json!({"noisy": true, "prerequisites": ["Sets"]}))
    });
    let classifier = PrerequisiteClassifier::new(&corpus, &service, ModelParams::default());

    let pass = classifier.first_pass().await;

    let record = &pass.records["Grammars"];
    assert!(!record.noisy);
    assert_eq!(record.prerequisites, vec!["Sets"]);
    assert!(pass.noisy.is_empty());

    let calls = service.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].system, SYSTEM_PROMPT_PREREQUISITES);
    assert_eq!(calls[0].user, "CONCEPT: Grammars");
}

#[tokio::test]
async fn test_single_occurrence_uses_noise_filter_prompt() {
    let corpus = corpus(&[("Lexing", 0, &["Tokens"])], true);
    let service = ScriptedService::new(|_, _| Ok(json!({"noisy": true})));
    let classifier = PrerequisiteClassifier::new(&corpus, &service, ModelParams::default());

    let pass = classifier.first_pass().await;

    assert!(pass.records["Tokens"].noisy);
    assert_eq!(pass.noisy, vec!["Tokens"]);
    let system = &service.calls()[0].system;
    assert!(system.contains("'Compilers', chapter 'Lexing'"));
    assert!(system.contains("legitimate learnable concept"));
}

#[tokio::test]
async fn test_recheck_replaces_first_record_wholesale() {
    let corpus = corpus(&[("Parsing", 0, &["Foo"])], true);
    let service = ScriptedService::new(|_, user| {
        if user.contains("CONTEXT:") {
            Ok(json!({"noisy": false, "prerequisites": ["Bar"]}))
        } else {
            Ok(json!({"noisy": true, "prerequisites": ["Baz", "Qux"]}))
        }
    });
    let classifier = PrerequisiteClassifier::new(&corpus, &service, ModelParams::default());

    let result = classifier.run().await;

    assert_eq!(
        result.per_concept["Foo"],
        PrereqRecord {
            concept: "Foo".to_string(),
            noisy: false,
            prerequisites: vec!["Bar".to_string()],
        }
    );
    assert!(result.noisy_concepts.is_empty());
    assert_eq!(result.edges, vec![Edge::new("Foo", "Bar")]);
    assert_eq!(result.meta.rechecked, vec!["Foo"]);
    assert_eq!(result.errors, 0);

    let calls = service.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].user, "CONCEPT: Foo\n\nCONTEXT:\nText of Parsing #0");
    assert!(calls[1].system.contains("Treat CONTEXT as primary evidence"));
}

#[tokio::test]
async fn test_recheck_without_context_keeps_first_verdict() {
    let corpus = corpus(&[("Parsing", 0, &["Foo"])], false);
    let service = ScriptedService::new(|_, _| {
        Ok(json!({"noisy": true, "prerequisites": ["Baz"]}))
    });
    let classifier = PrerequisiteClassifier::new(&corpus, &service, ModelParams::default());

    let result = classifier.run().await;

    assert_eq!(service.calls().len(), 1);
    assert!(result.per_concept["Foo"].noisy);
    assert_eq!(result.noisy_concepts, vec!["Foo"]);
    assert!(result.edges.is_empty());
    assert!(result.meta.rechecked.is_empty());
}

#[tokio::test]
async fn test_recheck_can_confirm_noise() {
    let corpus = corpus(&[("Parsing", 0, &["Foo"])], true);
    let service = ScriptedService::new(|_, _| {
        Ok(json!({"noisy": "yes", "prerequisites": ["Baz"]}))
    });
    let classifier = PrerequisiteClassifier::new(&corpus, &service, ModelParams::default());

    let result = classifier.run().await;

    assert_eq!(service.calls().len(), 2);
    assert_eq!(result.noisy_concepts, vec!["Foo"]);
    assert!(result.edges.is_empty());
}

#[tokio::test]
async fn test_failures_are_counted_and_processing_continues() {
    let corpus = corpus(
        &[("Parsing", 0, &["Broken", "Parsers"]), ("Parsing", 1, &["Parsers"])],
        true,
    );
    let service = ScriptedService::new(|_, user| match concept_of(user) {
        "Broken" => Err(Error::HttpStatus {
            status: 400,
            body: "bad request".to_string(),
        }),
        _ => Ok(json!({"prerequisites": ["Grammars"]})),
    });
    let classifier = PrerequisiteClassifier::new(&corpus, &service, ModelParams::default());

    let result = classifier.run().await;

    assert_eq!(result.errors, 1);
    assert_eq!(result.per_concept["Broken"], PrereqRecord::empty("Broken"));
    assert_eq!(result.per_concept["Parsers"].prerequisites, vec!["Grammars"]);
    assert_eq!(result.edges, vec![Edge::new("Parsers", "Grammars")]);
}

#[tokio::test]
async fn test_recheck_failure_counts_and_clears_verdict() {
    let corpus = corpus(&[("Parsing", 0, &["Foo"])], true);
    let service = ScriptedService::new(|_, user| {
        if user.contains("CONTEXT:") {
            Err(Error::Transport {
                attempts: 5,
                message: "connection refused".to_string(),
            })
        } else {
            Ok(json!({"noisy": true}))
        }
    });
    let classifier = PrerequisiteClassifier::new(&corpus, &service, ModelParams::default());

    let result = classifier.run().await;

    assert_eq!(result.errors, 1);
    assert_eq!(result.per_concept["Foo"], PrereqRecord::empty("Foo"));
    assert!(result.noisy_concepts.is_empty());
    assert!(result.meta.rechecked.is_empty());
}

#[tokio::test]
async fn test_self_reference_and_duplicates_dropped() {
    let corpus = corpus(&[("Parsing", 0, &["Parsers"]), ("Parsing", 1, &["Parsers"])], true);
    let service = ScriptedService::new(|_, _| {
        Ok(json!({"prerequisites": ["parsers", "Grammars", "grammars", 3, "Automata"]}))
    });
    let classifier = PrerequisiteClassifier::new(&corpus, &service, ModelParams::default());

    let result = classifier.run().await;

    assert_eq!(
        result.per_concept["Parsers"].prerequisites,
        vec!["Grammars", "Automata"]
    );
}

#[tokio::test]
async fn test_concepts_processed_in_sorted_order() {
    let corpus = corpus(&[("B", 0, &["Zeta", "Alpha"]), ("A", 0, &["Mu"])], true);
    let service = ScriptedService::new(|_, _| Ok(Value::Null));
    let classifier = PrerequisiteClassifier::new(&corpus, &service, ModelParams::default())
        .with_options(ClassifierOptions {
            context_chars: 4,
            progress_every: 1,
        });

    let result = classifier.run().await;

    let order: Vec<String> = service
        .calls()
        .iter()
        .map(|c| concept_of(&c.user).to_string())
        .collect();
    assert_eq!(order, vec!["Alpha", "Mu", "Zeta"]);
    assert_eq!(result.per_concept.len(), 3);
    assert!(result.per_concept.values().all(|r| !r.noisy && r.prerequisites.is_empty()));
}

#[tokio::test]
async fn test_context_is_truncated() {
    let corpus = corpus(&[("Parsing", 0, &["Foo"])], true);
    let service = ScriptedService::new(|_, _| Ok(json!({"noisy": true})));
    let classifier = PrerequisiteClassifier::new(&corpus, &service, ModelParams::default())
        .with_options(ClassifierOptions {
            context_chars: 4,
            progress_every: 25,
        });

    classifier.run().await;

    assert_eq!(service.calls()[1].user, "CONCEPT: Foo\n\nCONTEXT:\nText");
}

#[tokio::test]
async fn test_meta_carries_counts() {
    let corpus = corpus(&[("Parsing", 0, &["Foo"]), ("Parsing", 1, &["foo"])], true);
    let service = ScriptedService::new(|_, _| Ok(json!({})));
    let result = PrerequisiteClassifier::new(&corpus, &service, ModelParams::default())
        .run()
        .await;

    assert_eq!(result.meta.counts.get("foo"), Some(&2));
}
