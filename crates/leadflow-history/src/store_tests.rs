use super::*;
use leadflow_store::MemoryKeyValueStore;
use serde_json::json;
use std::collections::HashSet;

fn new_store(cap: usize) -> (Arc<MemoryKeyValueStore>, HistoryStore) {
    let backing = Arc::new(MemoryKeyValueStore::new());
    let history = HistoryStore::with_cap(backing.clone(), cap);
    (backing, history)
}

fn interaction(target: &str, next_index: usize) -> NewInteraction {
    NewInteraction {
        target_id: target.to_string(),
        target_name: format!("Name {}", target),
        message_text: "Hello!".to_string(),
        next_index,
    }
}

#[tokio::test]
async fn test_fresh_scope_defaults() {
    let (_, history) = new_store(DEFAULT_HISTORY_CAP);

    let scope = history.get_scope_history("g1").await.unwrap();
    assert_eq!(scope.scope_id, "g1");
    assert_eq!(scope.last_index, 0);
    assert!(scope.records.is_empty());
    assert_eq!(history.get_last_index("g1").await.unwrap(), 0);
}

#[tokio::test]
async fn test_reads_never_persist() {
    let (backing, history) = new_store(DEFAULT_HISTORY_CAP);

    history.get_scope_history("g1").await.unwrap();
    history.get_last_index("g2").await.unwrap();
    history.get_stats().await.unwrap();
    history.recent("g1", 10).await.unwrap();

    assert!(backing.is_empty().await);
}

#[tokio::test]
async fn test_record_appends_and_advances() {
    let (_, history) = new_store(DEFAULT_HISTORY_CAP);

    let record = history.record("g1", interaction("u1", 1)).await.unwrap();
    assert_eq!(record.target_id, "u1");
    assert!(record.interaction_id.starts_with("g1-"));
    assert!(record.interaction_id.ends_with("-1"));

    let scope = history.get_scope_history("g1").await.unwrap();
    assert_eq!(scope.last_index, 1);
    assert_eq!(scope.records, vec![record]);
    assert_eq!(history.global().await.unwrap().total_interactions, 1);
}

#[tokio::test]
async fn test_last_index_never_moves_backwards() {
    let (_, history) = new_store(DEFAULT_HISTORY_CAP);

    history.record("g1", interaction("u5", 5)).await.unwrap();
    history.record("g1", interaction("u3", 3)).await.unwrap();

    assert_eq!(history.get_last_index("g1").await.unwrap(), 5);
}

#[tokio::test]
async fn test_fifo_eviction_keeps_most_recent() {
    let (_, history) = new_store(5);

    for i in 0..8 {
        history
            .record("g1", interaction(&format!("u{}", i), i + 1))
            .await
            .unwrap();
    }

    let scope = history.get_scope_history("g1").await.unwrap();
    let ids: Vec<_> = scope.records.iter().map(|r| r.target_id.clone()).collect();
    assert_eq!(ids, vec!["u3", "u4", "u5", "u6", "u7"]);
    assert_eq!(scope.last_index, 8);

    let global = history.global().await.unwrap();
    assert_eq!(global.total_interactions, 5);
    assert_eq!(global.total_interactions, global.record_count());
}

#[tokio::test]
async fn test_records_within_cap_are_all_kept() {
    let (_, history) = new_store(DEFAULT_HISTORY_CAP);

    for i in 0..12 {
        history
            .record("g1", interaction(&format!("u{}", i), i + 1))
            .await
            .unwrap();
    }
    assert_eq!(history.get_scope_history("g1").await.unwrap().records.len(), 12);
}

#[tokio::test]
async fn test_lowering_cap_evicts_existing_records() {
    let (_, history) = new_store(DEFAULT_HISTORY_CAP);

    for i in 0..5 {
        history
            .record("g1", interaction(&format!("u{}", i), i + 1))
            .await
            .unwrap();
    }
    history.record("g2", interaction("v0", 1)).await.unwrap();

    history.set_cap(2).await.unwrap();
    assert_eq!(history.cap(), 2);

    let stats = history.get_stats().await.unwrap();
    assert_eq!(stats.per_scope["g1"].count, 2);
    assert_eq!(stats.per_scope["g1"].last_index, 5);
    assert_eq!(stats.per_scope["g2"].count, 1);
    assert_eq!(stats.total_interactions, 3);

    let scope = history.get_scope_history("g1").await.unwrap();
    let ids: Vec<_> = scope.records.iter().map(|r| r.target_id.as_str()).collect();
    assert_eq!(ids, vec!["u3", "u4"]);
}

#[tokio::test]
async fn test_raising_cap_keeps_records() {
    let (backing, history) = new_store(3);
    for i in 0..3 {
        history.record("g1", interaction("u", i + 1)).await.unwrap();
    }

    // Nothing is rewritten, so a read-only store is fine.
    backing.set_read_only(true);
    history.set_cap(10).await.unwrap();
    assert_eq!(history.cap(), 10);
    assert_eq!(history.global().await.unwrap().total_interactions, 3);
}

#[tokio::test]
async fn test_interaction_ids_unique_in_rapid_succession() {
    let (_, history) = new_store(DEFAULT_HISTORY_CAP);

    let mut ids = HashSet::new();
    for i in 0..50 {
        let record = history.record("g1", interaction("u", i + 1)).await.unwrap();
        assert!(ids.insert(record.interaction_id));
    }
}

#[tokio::test]
async fn test_total_matches_sum_across_interleavings() {
    let (_, history) = new_store(4);

    let ops: &[(&str, Option<usize>)] = &[
        ("a", Some(1)),
        ("b", Some(1)),
        ("a", Some(2)),
        ("c", Some(1)),
        ("a", Some(3)),
        ("b", None),
        ("a", Some(4)),
        ("a", Some(5)),
        ("c", Some(2)),
        ("b", Some(1)),
        ("a", None),
        ("c", Some(3)),
    ];

    for (scope, op) in ops {
        match op {
            Some(next) => {
                history.record(scope, interaction("t", *next)).await.unwrap();
            }
            None => history.reset_scope(scope).await.unwrap(),
        }
        let global = history.global().await.unwrap();
        assert_eq!(global.total_interactions, global.record_count());
    }
}

#[tokio::test]
async fn test_reset_scope_leaves_others_untouched() {
    let (_, history) = new_store(DEFAULT_HISTORY_CAP);

    for i in 0..3 {
        history.record("g1", interaction("x", i + 1)).await.unwrap();
        history.record("g2", interaction("y", i + 1)).await.unwrap();
    }
    let g2_before = history.get_scope_history("g2").await.unwrap();

    history.reset_scope("g1").await.unwrap();

    let g1 = history.get_scope_history("g1").await.unwrap();
    assert_eq!(g1.last_index, 0);
    assert!(g1.records.is_empty());
    assert_eq!(history.get_scope_history("g2").await.unwrap(), g2_before);
    assert_eq!(history.global().await.unwrap().total_interactions, 3);
}

#[tokio::test]
async fn test_reset_unknown_scope_is_noop() {
    let (backing, history) = new_store(DEFAULT_HISTORY_CAP);
    history.reset_scope("nope").await.unwrap();
    assert!(backing.is_empty().await);
}

#[tokio::test]
async fn test_reset_all_after_three_scopes() {
    let (_, history) = new_store(DEFAULT_HISTORY_CAP);

    for scope in ["g1", "g2", "g3"] {
        for i in 0..5 {
            history.record(scope, interaction("t", i + 1)).await.unwrap();
        }
    }
    assert_eq!(history.global().await.unwrap().total_interactions, 15);

    history.reset_all().await.unwrap();

    let global = history.global().await.unwrap();
    assert_eq!(global.total_interactions, 0);
    assert!(global.scopes.is_empty());
}

#[tokio::test]
async fn test_failed_write_leaves_state_unchanged() {
    let (backing, history) = new_store(DEFAULT_HISTORY_CAP);
    history.record("g1", interaction("u1", 1)).await.unwrap();
    let before = history.global().await.unwrap();

    backing.set_read_only(true);
    let result = history.record("g1", interaction("u2", 2)).await;
    assert!(matches!(result, Err(HistoryError::Persistence(_))));
    assert!(history.reset_scope("g1").await.is_err());
    assert!(history.reset_all().await.is_err());

    assert_eq!(history.global().await.unwrap(), before);

    // Retrying after the store recovers succeeds exactly once.
    backing.set_read_only(false);
    history.record("g1", interaction("u2", 2)).await.unwrap();
    assert_eq!(history.global().await.unwrap().total_interactions, 2);
}

#[tokio::test]
async fn test_empty_scope_rejected() {
    let (_, history) = new_store(DEFAULT_HISTORY_CAP);
    let result = history.record("  ", interaction("u1", 1)).await;
    assert!(matches!(result, Err(HistoryError::InvalidScope(_))));
    assert!(HistoryStore::check_scope("").is_err());
    assert!(HistoryStore::check_scope("g1").is_ok());
}

#[tokio::test]
async fn test_stats() {
    let (_, history) = new_store(DEFAULT_HISTORY_CAP);
    history.record("g1", interaction("u1", 1)).await.unwrap();
    let last = history.record("g1", interaction("u2", 2)).await.unwrap();
    history.record("g2", interaction("u9", 7)).await.unwrap();

    let stats = history.get_stats().await.unwrap();
    assert_eq!(stats.total_interactions, 3);
    assert_eq!(stats.per_scope.len(), 2);

    let g1 = &stats.per_scope["g1"];
    assert_eq!(g1.count, 2);
    assert_eq!(g1.last_index, 2);
    assert_eq!(g1.last_interaction_timestamp, Some(last.timestamp));
    assert_eq!(stats.per_scope["g2"].last_index, 7);
}

#[tokio::test]
async fn test_recent_and_contacted() {
    let (_, history) = new_store(DEFAULT_HISTORY_CAP);
    for (i, id) in ["a", "b", "c"].iter().enumerate() {
        history.record("g1", interaction(id, i + 1)).await.unwrap();
    }

    let recent = history.recent("g1", 2).await.unwrap();
    let ids: Vec<_> = recent.iter().map(|r| r.target_id.as_str()).collect();
    assert_eq!(ids, vec!["c", "b"]);

    assert!(history.contacted("g1", "a").await.unwrap());
    assert!(!history.contacted("g1", "z").await.unwrap());
    assert!(!history.contacted("g2", "a").await.unwrap());
}

#[tokio::test]
async fn test_persisted_envelope_shape() {
    let (backing, history) = new_store(DEFAULT_HISTORY_CAP);
    history.record("g1", interaction("u1", 1)).await.unwrap();

    let raw = backing.get_one(keys::GLOBAL_HISTORY).await.unwrap().unwrap();
    assert_eq!(raw["schema_version"], json!(HISTORY_SCHEMA_VERSION));
    assert_eq!(raw["data"]["total_interactions"], json!(1));
    assert_eq!(raw["data"]["scopes"]["g1"]["last_index"], json!(1));
}

#[tokio::test]
async fn test_migrate_legacy_history() {
    let (backing, history) = new_store(2);
    backing
        .set_one(
            keys::LEGACY_HISTORY,
            json!({
                "totalInteractions": 42,
                "groups": {
                    "g1": {
                        "lastIndex": 3,
                        "records": [
                            {"targetId": "a", "targetName": "A", "messageText": "m",
                             "interactionId": "g1-1-1", "timestamp": "2024-01-01T00:00:00Z"},
                            {"targetId": "b", "targetName": "B", "messageText": "m",
                             "interactionId": "g1-2-2", "timestamp": "2024-01-01T00:01:00Z"},
                            {"targetId": "c", "targetName": "C", "messageText": "m",
                             "interactionId": "g1-3-3", "timestamp": "2024-01-01T00:02:00Z"}
                        ]
                    }
                }
            }),
        )
        .await
        .unwrap();

    let outcome = history.migrate().await.unwrap();
    assert_eq!(outcome, MigrationOutcome::Migrated);

    let global = history.global().await.unwrap();
    assert_eq!(global.total_interactions, 2);
    let g1 = &global.scopes["g1"];
    assert_eq!(g1.scope_id, "g1");
    assert_eq!(g1.last_index, 3);
    assert_eq!(g1.records[0].target_id, "b");
    assert!(backing.get_one(keys::LEGACY_HISTORY).await.unwrap().is_none());

    assert_eq!(history.migrate().await.unwrap(), MigrationOutcome::AlreadyCurrent);
}
