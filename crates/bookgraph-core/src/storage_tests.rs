//! Artifact store and pipeline stage tests

use serde_json::json;

use crate::commands::{self, graph::GraphQuery};
use crate::concepts::{ConceptData, Section};
use crate::error::Error;
use crate::extraction::ExtractionOptions;
use crate::graph::{Edge, KnowledgeGraph};
use crate::llm::ModelParams;
use crate::prereqs::ClassifierOptions;
use crate::storage::{ArtifactKind, ArtifactStore};
use crate::test_support::ScriptedService;

const BOOK: &str = "Intro to Algebra";

fn section(chapter: &str, index: usize, topic: &str) -> Section {
    Section {
        id: format!("{}-{}", chapter, index),
        book_title: BOOK.to_string(),
        chapter: chapter.to_string(),
        title: format!("Section {}", index),
        section_index: index,
        content: format!("{} ", topic).repeat(40),
    }
}

fn temp_store() -> (tempfile::TempDir, ArtifactStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path().join("results"));
    (dir, store)
}

#[test]
fn test_artifact_paths_use_slug() {
    let (dir, store) = temp_store();
    let path = store.path(ArtifactKind::Edges, BOOK);
    assert_eq!(path, dir.path().join("results/edges/intro-to-algebra.json"));
    assert!(!store.exists(ArtifactKind::Edges, BOOK));
}

#[test]
fn test_sections_round_trip() {
    let (_dir, store) = temp_store();
    let sections = vec![section("Basics", 0, "variables"), section("Basics", 1, "terms")];

    store.save_sections(BOOK, &sections).unwrap();

    assert!(store.exists(ArtifactKind::Sections, BOOK));
    assert_eq!(store.load_sections(BOOK).unwrap(), sections);
}

#[test]
fn test_edges_round_trip_keeps_orientation() {
    let (_dir, store) = temp_store();
    let edges = vec![Edge::new("Equations", "Variables")];

    let path = store.save_edges(BOOK, &edges).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(raw, json!([{"concept": "Equations", "prerequisite": "Variables"}]));
    assert_eq!(store.load_edges(BOOK).unwrap(), edges);
}

#[test]
fn test_graph_export_round_trip() {
    let (_dir, store) = temp_store();
    let graph = KnowledgeGraph::from_edges(&[
        Edge::new("Quadratics", "Equations"),
        Edge::new("Equations", "Variables"),
    ]);

    store.save_graph(BOOK, &graph.to_export()).unwrap();

    let export = store.load_graph(BOOK).unwrap();
    assert_eq!(export.nodes, vec!["Quadratics", "Equations", "Variables"]);
    assert_eq!(export.edges, vec![[0, 1], [1, 2]]);
}

#[test]
fn test_missing_artifact_is_reported() {
    let (_dir, store) = temp_store();

    let err = store.load_concepts(BOOK).unwrap_err();

    assert!(matches!(err, Error::ArtifactNotFound(_)));
    assert_eq!(err.suggestion(), Some("bookgraph concepts <book-title>".to_string()));
}

#[test]
fn test_malformed_sections_are_unsupported() {
    let (_dir, store) = temp_store();
    let path = store.path(ArtifactKind::Sections, BOOK);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();

    std::fs::write(&path, r#"{"sections": []}"#).unwrap();
    assert!(matches!(
        store.load_sections(BOOK).unwrap_err(),
        Error::UnsupportedFormat { .. }
    ));

    std::fs::write(&path, "[{").unwrap();
    assert!(matches!(
        store.load_sections(BOOK).unwrap_err(),
        Error::UnsupportedFormat { .. }
    ));
}

#[test]
fn test_unknown_concepts_format_is_unsupported() {
    let (_dir, store) = temp_store();
    let path = store.path(ArtifactKind::Concepts, BOOK);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{"format": "columnar"}"#).unwrap();

    let err = store.load_concepts(BOOK).unwrap_err();
    assert_eq!(err.code(), "E400");
}

#[test]
fn test_edges_stage_skips_noisy_concepts() {
    let (_dir, store) = temp_store();
    let result = crate::prereqs::PrereqResult {
        per_concept: [
            ("Equations", false, vec!["Variables", "Terms"]),
            ("Page 12", true, vec!["Variables"]),
        ]
        .into_iter()
        .map(|(concept, noisy, prereqs)| {
            (
                concept.to_string(),
                crate::prereqs::PrereqRecord {
                    concept: concept.to_string(),
                    noisy,
                    prerequisites: prereqs.into_iter().map(String::from).collect(),
                },
            )
        })
        .collect(),
        ..Default::default()
    };
    store.save_prereqs(BOOK, &result).unwrap();

    let summary = commands::edges::run(&store, BOOK).unwrap();

    assert_eq!(summary.nodes, 3);
    assert_eq!(summary.edges, 2);
    assert_eq!(
        store.load_edges(BOOK).unwrap(),
        vec![
            Edge::new("Equations", "Variables"),
            Edge::new("Equations", "Terms"),
        ]
    );
}

#[tokio::test]
async fn test_pipeline_end_to_end() {
    let (_dir, store) = temp_store();
    store
        .save_sections(
            BOOK,
            &[
                section("Equations", 0, "solving"),
                section("Equations", 1, "balancing"),
                section("Quadratics", 0, "factoring"),
            ],
        )
        .unwrap();

    let service = ScriptedService::new(|system, user| {
        if system.contains("\"concepts\"") {
            return Ok(if user.contains("factoring") {
                json!({"concepts": ["Quadratic equations", "Linear equations"]})
            } else {
                json!({"concepts": ["Linear equations", "Variables"]})
            });
        }
        Ok(match user.lines().next().unwrap_or("") {
            "CONCEPT: Quadratic equations" => json!({"prerequisites": ["Linear equations"]}),
            "CONCEPT: Linear equations" => json!({"prerequisites": ["Variables"]}),
            _ => json!({"noisy": false, "prerequisites": []}),
        })
    });
    let params = ModelParams::default();

    let concepts = commands::concepts::run(&store, BOOK, &service, &params, ExtractionOptions::default())
        .await
        .unwrap();
    assert_eq!(concepts.sections_parsed, 3);
    assert_eq!(concepts.unique_concepts, 3);
    assert_eq!(concepts.errors, 0);

    let loaded: ConceptData = store.load_concepts(BOOK).unwrap();
    assert_eq!(loaded.count("linear equations"), 3);

    let prereqs = commands::prereqs::run(&store, BOOK, &service, &params, ClassifierOptions::default())
        .await
        .unwrap();
    assert_eq!(prereqs.concepts, 3);
    assert_eq!(prereqs.edges, 2);
    assert_eq!(prereqs.noisy, 0);
    assert!(prereqs.with_context);

    let edges = commands::edges::run(&store, BOOK).unwrap();
    assert_eq!((edges.nodes, edges.edges), (3, 2));

    let report = commands::graph::run(
        &store,
        BOOK,
        &GraphQuery {
            concept: Some("quadratic equations".to_string()),
            transitive: true,
            dependents: Some("Variables".to_string()),
            ..GraphQuery::default()
        },
    )
    .unwrap();

    assert_eq!((report.added, report.skipped), (2, 0));
    assert_eq!(report.stats.longest_prereq_chain, 2);
    assert_eq!(report.stats.foundations, vec!["Variables"]);
    assert_eq!(
        report.prerequisites.unwrap().names,
        vec!["Linear equations", "Variables"]
    );
    assert_eq!(report.dependents.unwrap().names, vec!["Linear equations"]);
    assert!(store.exists(ArtifactKind::Graph, BOOK));
}

#[tokio::test]
async fn test_prereqs_stage_runs_without_sections() {
    let (_dir, store) = temp_store();
    let data = ConceptData::from_sections(
        [(
            crate::concepts::SectionKey::new(BOOK, "Equations", 0),
            vec!["Slope".to_string()],
        )]
        .into_iter()
        .collect(),
        1,
        0,
    );
    store.save_concepts(BOOK, &data).unwrap();

    let service = ScriptedService::new(|_, _| Ok(json!({"noisy": true})));
    let summary = commands::prereqs::run(
        &store,
        BOOK,
        &service,
        &ModelParams::default(),
        ClassifierOptions::default(),
    )
    .await
    .unwrap();

    assert!(!summary.with_context);
    assert_eq!(summary.noisy, 1);
    assert_eq!(summary.rechecked, 0);
    assert_eq!(service.calls().len(), 1);
}

#[tokio::test]
async fn test_concepts_stage_requires_sections() {
    let (_dir, store) = temp_store();
    let service = ScriptedService::new(|_, _| Ok(json!({})));

    let err = commands::concepts::run(
        &store,
        BOOK,
        &service,
        &ModelParams::default(),
        ExtractionOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::ArtifactNotFound(_)));
    assert!(service.calls().is_empty());
}
