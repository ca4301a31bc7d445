//! End-to-end retrieval pipeline tests: ingestion through hybrid and
//! graph search, resync, and snapshot persistence.

use std::sync::Arc;

use recall_embeddings::HashEmbedder;
use recall_engine::{EngineConfig, RetrievalEngine, SearchMode, SearchOptions};
use recall_graph::WalkConfig;
use recall_types::Document;
use recall_vector::HnswConfig;

fn corpus() -> Vec<Document> {
    vec![
        Document::new("d1", "Cats", "the cat sat on the mat"),
        Document::new("d2", "Dogs", "dogs are great pets"),
        Document::new("d3", "Both", "cats and dogs are both pets"),
    ]
}

fn seeded_engine() -> RetrievalEngine {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let provider = Arc::new(HashEmbedder::new(128));
    let config = EngineConfig::default()
        .with_hnsw(HnswConfig::new(128).with_seed(7))
        .with_walk(WalkConfig::default().with_seed(7));
    RetrievalEngine::new(provider, config).unwrap()
}

#[tokio::test]
async fn hybrid_search_over_small_corpus() {
    let engine = seeded_engine();
    for doc in corpus() {
        engine.add_document(&doc).await.unwrap();
    }

    let options = SearchOptions::default().with_alpha(0.5);
    let hits = engine.search("cat pets", &options).await.unwrap();

    assert!(!hits.is_empty());
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    // Every hit is hydrated with provenance
    for hit in &hits {
        assert!(!hit.title.is_empty());
        assert!(!hit.snippet.is_empty());
        assert!((0.0..=1.0).contains(&hit.score));
    }

    // Same query again returns the same ranking
    let again = engine.search("cat pets", &options).await.unwrap();
    let a: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    let b: Vec<&str> = again.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(a, b);
}

#[tokio::test]
async fn alpha_extremes_shift_ranking_source() {
    let engine = seeded_engine();
    for doc in corpus() {
        engine.add_document(&doc).await.unwrap();
    }

    let lexical = engine
        .search("cat pets", &SearchOptions::default().with_alpha(0.0))
        .await
        .unwrap();
    let vector = engine
        .search("cat pets", &SearchOptions::default().with_alpha(1.0))
        .await
        .unwrap();

    // Pure lexical only surfaces term matches; pure vector covers the
    // whole corpus neighborhood
    assert!(!lexical.is_empty());
    assert!(!vector.is_empty());
    assert!(lexical.iter().all(|h| h.lexical_score.is_some()));
}

#[tokio::test]
async fn graph_mode_reranks_with_walk() {
    let engine = seeded_engine();
    for doc in corpus() {
        engine.add_document(&doc).await.unwrap();
    }

    let options = SearchOptions::default()
        .with_mode(SearchMode::Graph)
        .with_limit(5);
    let hits = engine.search("cats and dogs", &options).await.unwrap();

    assert!(!hits.is_empty());
    assert!(hits.len() <= 5);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn resync_then_search_reflects_new_corpus() {
    let engine = seeded_engine();
    engine
        .add_document(&Document::new("stale", "Stale", "obsolete material"))
        .await
        .unwrap();

    let report = engine.sync_all(&corpus()).await.unwrap();
    assert_eq!(report.documents_indexed, 3);
    assert_eq!(report.documents_skipped, 0);

    let hits = engine
        .search("obsolete material", &SearchOptions::default())
        .await
        .unwrap();
    assert!(hits.iter().all(|h| !h.id.starts_with("stale::")));
    engine.verify().unwrap();
}

#[tokio::test]
async fn snapshot_round_trip_preserves_search() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recall.snapshot");

    let engine = seeded_engine();
    for doc in corpus() {
        engine.add_document(&doc).await.unwrap();
    }
    engine.save_snapshot(&path).unwrap();

    let restored = seeded_engine();
    restored.load_snapshot(&path).unwrap();
    restored.verify().unwrap();

    let options = SearchOptions::default();
    let before = engine.search("great pets", &options).await.unwrap();
    let after = restored.search("great pets", &options).await.unwrap();

    let a: Vec<&str> = before.iter().map(|h| h.id.as_str()).collect();
    let b: Vec<&str> = after.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(a, b);
}

#[tokio::test]
async fn document_lifecycle_keeps_indexes_consistent() {
    let engine = seeded_engine();
    for doc in corpus() {
        engine.add_document(&doc).await.unwrap();
    }

    // Update d2 with new content, then remove d3
    engine
        .add_document(&Document::new("d2", "Dogs", "golden retrievers fetch sticks"))
        .await
        .unwrap();
    assert!(engine.remove_document("d3"));

    assert_eq!(engine.document_count(), 2);
    let hits = engine
        .search("dogs are great pets", &SearchOptions::default().with_limit(20))
        .await
        .unwrap();
    assert!(hits.iter().all(|h| !h.id.starts_with("d3::")));

    let fetch = engine
        .search("retrievers fetch", &SearchOptions::default())
        .await
        .unwrap();
    assert!(fetch.iter().any(|h| h.id.starts_with("d2::")));
    engine.verify().unwrap();
}
