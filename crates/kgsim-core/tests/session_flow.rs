//! Integration tests for the session facade: membership routing between
//! the search results and the working set, and CSV export.

mod common;

use std::sync::Arc;
use std::time::Duration;

use kgsim_core::{Config, EmbeddingType, SimError, Session};

use common::{entity, StubScorer, StubSearcher};

fn one_type_config() -> Config {
    let mut config = Config::default();
    config.embedding_types = vec![EmbeddingType::new("ComplEx", "complex")];
    config
}

async fn seeded_session(
    searcher: Arc<StubSearcher>,
    scorer: Arc<StubScorer>,
    config: &Config,
) -> Session {
    searcher.set_results("adams", vec![entity("Q42"), entity("Q5")]);
    let session = Session::new(searcher, scorer, config);
    session.set_query("adams").await.unwrap();
    session.submit_query().await.unwrap();
    common::settle().await;
    session
}

#[tokio::test(start_paused = true)]
async fn test_qnode_lives_in_exactly_one_collection() {
    let searcher = Arc::new(StubSearcher::default());
    let scorer = Arc::new(StubScorer::new());
    let session = seeded_session(searcher, scorer, &one_type_config()).await;
    assert_eq!(session.search_snapshot().results.len(), 2);

    session.add_test_node("Q42").await.unwrap();
    common::settle().await;

    let results = session.search_snapshot().results;
    let nodes = session.comparison_snapshot().nodes;
    assert!(results.iter().all(|e| e.qnode != "Q42"));
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].qnode(), "Q42");

    // Adding an absent qnode is an error, not a silent no-op.
    let missing = session.add_test_node("Q42").await;
    assert!(matches!(missing, Err(SimError::EntityNotFound { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_remove_returns_entity_to_head_and_readd_resets_scores() {
    let searcher = Arc::new(StubSearcher::default());
    let scorer = Arc::new(StubScorer::new());
    scorer.set_score("Q1", "Q42", "complex", 0.8);
    let session = seeded_session(searcher, scorer, &one_type_config()).await;

    session.set_subject(entity("Q1")).await.unwrap();
    session.add_test_node("Q42").await.unwrap();
    common::settle().await;
    assert!(session
        .comparison_snapshot()
        .is_complete(session.embedding_types()));

    session.remove_test_node("Q42").await.unwrap();
    common::settle().await;

    // Back at the head of the results, unchanged.
    let results = session.search_snapshot().results;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], entity("Q42"));
    assert!(session.comparison_snapshot().nodes.is_empty());

    // Re-adding starts from an empty similarity map, then refetches.
    session.add_test_node("Q42").await.unwrap();
    common::settle().await;
    let nodes = session.comparison_snapshot().nodes;
    assert_eq!(nodes.len(), 1);
    assert!(nodes[0].cell("complex").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_select_subject_restarts_the_search_stage() {
    let searcher = Arc::new(StubSearcher::default());
    let scorer = Arc::new(StubScorer::new());
    let session = seeded_session(searcher, scorer, &one_type_config()).await;

    let subject = session.select_subject("Q42").await.unwrap();
    common::settle().await;

    assert_eq!(subject.qnode, "Q42");
    let search = session.search_snapshot();
    assert!(search.results.is_empty());
    assert!(search.query.is_empty());
    assert_eq!(
        session
            .comparison_snapshot()
            .subject
            .map(|s| s.qnode),
        Some("Q42".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_clear_subject_drops_scores_but_keeps_membership() {
    let searcher = Arc::new(StubSearcher::default());
    let scorer = Arc::new(StubScorer::new());
    scorer.set_score("Q1", "Q2", "complex", 0.8);
    let session = Session::new(searcher, scorer, &one_type_config());

    session.set_subject(entity("Q1")).await.unwrap();
    session.add_entity(entity("Q2")).await.unwrap();
    common::settle().await;
    assert!(session
        .comparison_snapshot()
        .is_complete(session.embedding_types()));

    session.clear_subject().await.unwrap();
    common::settle().await;

    let snapshot = session.comparison_snapshot();
    assert!(snapshot.subject.is_none());
    assert_eq!(snapshot.nodes.len(), 1);
    assert!(snapshot.nodes[0].similarity.is_empty());
    assert!(matches!(session.export_csv(), Err(SimError::Export(_))));
}

#[tokio::test(start_paused = true)]
async fn test_set_sort_key_rejects_unknown_type() {
    let searcher = Arc::new(StubSearcher::default());
    let scorer = Arc::new(StubScorer::new());
    let session = Session::new(searcher, scorer, &one_type_config());

    let result = session.set_sort_key("bogus").await;
    assert!(matches!(result, Err(SimError::Validation { .. })));
    assert!(session.set_sort_key("complex").await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_csv_export_matches_expected_bytes() {
    let searcher = Arc::new(StubSearcher::default());
    let scorer = Arc::new(StubScorer::new());
    scorer.set_score("Q1", "Q2", "complex", 0.5);
    let session = Session::new(searcher, scorer, &one_type_config());

    session.set_subject(entity("Q1")).await.unwrap();
    session.add_entity(entity("Q2")).await.unwrap();

    // Wait for the single cell to resolve.
    let mut updates = session.comparison_updates();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !session
        .comparison_snapshot()
        .is_complete(session.embedding_types())
    {
        tokio::select! {
            changed = updates.changed() => changed.unwrap(),
            _ = tokio::time::sleep_until(deadline) => panic!("scores never resolved"),
        }
    }

    let export = session.export_csv().unwrap();
    assert_eq!(export.filename, "Q1_similarity.csv");
    assert_eq!(export.content, "q1,q2,ComplEx\nQ1,Q2,0.5");
}

#[tokio::test(start_paused = true)]
async fn test_csv_export_requires_a_subject() {
    let searcher = Arc::new(StubSearcher::default());
    let scorer = Arc::new(StubScorer::new());
    let session = Session::new(searcher, scorer, &one_type_config());

    assert!(matches!(
        session.export_csv(),
        Err(SimError::Export(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_is_clean() {
    let searcher = Arc::new(StubSearcher::default());
    let scorer = Arc::new(StubScorer::new());
    let mut session = Session::new(searcher, scorer, &one_type_config());

    session.set_query("adams").await.unwrap();
    session.shutdown().await;

    // Commands after shutdown surface as channel-closed errors.
    assert!(matches!(
        session.set_query("again").await,
        Err(SimError::ChannelClosed(_))
    ));
}
