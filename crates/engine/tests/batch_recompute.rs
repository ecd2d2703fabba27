mod common;

use chrono::Duration;
use std::sync::Arc;
use tokio::sync::watch;

use common::{hot_lead, lead, scored_lead, start, FlakyLeadStore, Harness};
use lead_scoring_config::EngineConfig;
use lead_scoring_core::LeadId;
use lead_scoring_engine::BatchRequest;
use lead_scoring_persistence::InMemoryLeadStore;

fn ids(leads: &[&str]) -> Vec<LeadId> {
    leads.iter().map(|id| LeadId::from(*id)).collect()
}

#[tokio::test]
async fn test_empty_batch() {
    let h = Harness::new();
    let result = h.service.batch_recompute(BatchRequest::all()).await.unwrap();
    assert_eq!(result.processed, 0);
    assert_eq!(result.updated, 0);
    assert!(result.errors.is_empty());
    assert!(!result.cancelled);
}

#[tokio::test]
async fn test_only_stale_selects_old_scores() {
    let h = Harness::new();
    let now = start();
    h.add(scored_lead("old-1", 40, now - Duration::days(10)), vec![]).await;
    h.add(scored_lead("old-2", 40, now - Duration::days(10)), vec![]).await;
    for id in ["fresh-1", "fresh-2", "fresh-3"] {
        h.add(scored_lead(id, 40, now - Duration::days(1)), vec![]).await;
    }

    let result = h
        .service
        .batch_recompute(BatchRequest::stale(7))
        .await
        .unwrap();
    assert_eq!(result.processed, 2);
    assert_eq!(result.updated, 2);
    assert!(result.errors.is_empty());

    assert_eq!(h.stored("old-1").await.last_scored_at, Some(now));
    assert_eq!(h.stored("old-2").await.last_scored_at, Some(now));
    assert_eq!(
        h.stored("fresh-1").await.last_scored_at,
        Some(now - Duration::days(1))
    );
}

#[tokio::test]
async fn test_only_stale_includes_unscored() {
    let h = Harness::new();
    h.add(lead("never"), vec![]).await;
    h.add(scored_lead("recent", 10, start()), vec![]).await;

    let result = h
        .service
        .batch_recompute(BatchRequest::stale(7))
        .await
        .unwrap();
    assert_eq!(result.processed, 1);
    assert!(h.stored("never").await.is_scored());
}

#[tokio::test]
async fn test_explicit_ids_are_deduplicated() {
    let h = Harness::new();
    h.add(lead("a"), vec![]).await;
    h.add(lead("b"), vec![]).await;
    h.add(lead("c"), vec![]).await;

    let result = h
        .service
        .batch_recompute(BatchRequest::for_ids(ids(&["b", "a", "b"])))
        .await
        .unwrap();
    assert_eq!(result.processed, 2);
    assert_eq!(result.updated, 2);
    assert!(!h.stored("c").await.is_scored());
}

#[tokio::test]
async fn test_explicit_ids_with_only_stale() {
    let h = Harness::new();
    let now = start();
    h.add(scored_lead("old", 10, now - Duration::days(30)), vec![]).await;
    h.add(scored_lead("new", 10, now), vec![]).await;

    let request = BatchRequest {
        only_stale: true,
        ..BatchRequest::for_ids(ids(&["old", "new", "ghost"]))
    };
    let result = h.service.batch_recompute(request).await.unwrap();

    // "new" is filtered out; "ghost" stays in so it is reported
    assert_eq!(result.processed, 2);
    assert_eq!(result.updated, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].lead_id, LeadId::from("ghost"));
    assert_eq!(result.errors[0].kind, "not_found");
}

#[tokio::test]
async fn test_failed_write_leaves_lead_untouched() {
    let inner = InMemoryLeadStore::with_leads([lead("a"), lead("b"), lead("c")]);
    let store = Arc::new(FlakyLeadStore::new(inner).fail_save_for("b"));
    let h = Harness::with_lead_store(store, EngineConfig::default());

    let result = h.service.batch_recompute(BatchRequest::all()).await.unwrap();
    assert_eq!(result.processed, 3);
    assert_eq!(result.updated, 2);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].lead_id, LeadId::from("b"));
    assert_eq!(result.errors[0].kind, "persistence_error");
    assert_eq!(result.processed, result.updated + result.errors.len());

    assert!(h.stored("a").await.is_scored());
    assert!(h.stored("c").await.is_scored());

    let untouched = h.stored("b").await;
    assert!(untouched.last_scored_at.is_none());
    assert!(untouched.score_breakdown.is_none());
    assert_eq!(untouched.score, 0);
}

#[tokio::test]
async fn test_vanished_lead_is_reported() {
    let h = Harness::new();
    h.add(lead("a"), vec![]).await;
    h.add(lead("b"), vec![]).await;
    h.leads.delete(&LeadId::from("b")).await.unwrap();

    let result = h
        .service
        .batch_recompute(BatchRequest::for_ids(ids(&["a", "b"])))
        .await
        .unwrap();
    assert_eq!(result.processed, 2);
    assert_eq!(result.updated, 1);
    assert_eq!(result.errors[0].lead_id, LeadId::from("b"));
    assert_eq!(result.errors[0].kind, "not_found");
}

#[tokio::test]
async fn test_batch_counts_qualifications() {
    let h = Harness::new();
    let (hot, conversations) = hot_lead("hot");
    h.add(hot, conversations).await;
    h.add(lead("cold"), vec![]).await;

    let result = h.service.batch_recompute(BatchRequest::all()).await.unwrap();
    assert_eq!(result.updated, 2);
    assert_eq!(result.qualified, 1);

    let again = h.service.batch_recompute(BatchRequest::all()).await.unwrap();
    assert_eq!(again.qualified, 0);
    assert!(h.stored("hot").await.is_qualified);
}

#[tokio::test]
async fn test_limit_caps_targets() {
    let h = Harness::new();
    for id in ["e", "d", "c", "b", "a"] {
        h.add(lead(id), vec![]).await;
    }

    let request = BatchRequest {
        limit: Some(2),
        ..BatchRequest::all()
    };
    let result = h.service.batch_recompute(request).await.unwrap();
    assert_eq!(result.processed, 2);
    assert!(h.stored("a").await.is_scored());
    assert!(h.stored("b").await.is_scored());
    assert!(!h.stored("c").await.is_scored());
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let h = Harness::new();
    h.add(lead("a"), vec![]).await;

    let (tx, rx) = watch::channel(false);
    tx.send_replace(true);
    let result = h
        .service
        .batch_recompute_with_cancel(BatchRequest::all(), rx)
        .await
        .unwrap();
    assert!(result.cancelled);
    assert_eq!(result.processed, 0);
    assert!(!h.stored("a").await.is_scored());
}

#[tokio::test]
async fn test_cancelled_between_leads() {
    let (tx, rx) = watch::channel(false);
    let inner = InMemoryLeadStore::with_leads([lead("a"), lead("b"), lead("c")]);
    let store = Arc::new(FlakyLeadStore::new(inner).cancel_after_first_save(tx));
    let config = EngineConfig {
        batch_concurrency: 1,
        ..Default::default()
    };
    let h = Harness::with_lead_store(store, config);

    let result = h
        .service
        .batch_recompute_with_cancel(BatchRequest::all(), rx)
        .await
        .unwrap();
    assert!(result.cancelled);
    assert_eq!(result.processed, 1);
    assert_eq!(result.updated, 1);
    assert!(h.stored("a").await.is_scored());
    assert!(!h.stored("b").await.is_scored());
    assert!(!h.stored("c").await.is_scored());
}

#[tokio::test]
async fn test_signal_after_last_lead_is_not_cancellation() {
    let (tx, rx) = watch::channel(false);
    let inner = InMemoryLeadStore::with_leads([lead("a")]);
    let store = Arc::new(FlakyLeadStore::new(inner).cancel_after_first_save(tx));
    let h = Harness::with_lead_store(store, EngineConfig::default());

    let result = h
        .service
        .batch_recompute_with_cancel(BatchRequest::all(), rx)
        .await
        .unwrap();
    assert!(!result.cancelled);
    assert_eq!(result.processed, 1);
    assert_eq!(result.updated, 1);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let h = Harness::new();
    assert_eq!(
        h.service
            .batch_recompute(BatchRequest::stale(0))
            .await
            .unwrap_err()
            .kind(),
        "invalid_request"
    );

    let config = EngineConfig {
        max_batch_size: 2,
        ..Default::default()
    };
    let h = Harness::with_lead_store(Arc::new(InMemoryLeadStore::new()), config);
    let err = h
        .service
        .batch_recompute(BatchRequest::for_ids(ids(&["a", "b", "c"])))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_request");
}
