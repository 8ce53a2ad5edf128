//! Integration tests for the prompts registry lifecycle.

use promptvault::core::error::VaultError;
use promptvault::core::store::PromptStore;
use promptvault::plugins::prompts::{
    self, HISTORY_CAP, PROMOTION_MIN_RUNS, PromptStatus, RegistryState, derive_key,
};
use tempfile::TempDir;

fn test_store() -> (TempDir, PromptStore) {
    let tmp = TempDir::new().unwrap();
    let store = PromptStore::new(tmp.path());
    (tmp, store)
}

fn tags(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

#[test]
fn draft_curate_run_rollback_lifecycle() {
    let (_tmp, store) = test_store();
    let domains = tags(&["housing", "inflation"]);

    // First draft bootstraps the entry at v1.
    let v1 = prompts::save_draft(&store, &domains, "v1", "analyze housing", "synthesizer").unwrap();
    assert_eq!(v1.version, 1);
    assert_eq!(v1.status, PromptStatus::Draft);
    assert!(v1.history.is_empty());
    assert_eq!(v1.domains, vec!["housing", "inflation"]);

    // Second draft archives v1 and re-drafts at v2.
    let v2 = prompts::save_draft(&store, &domains, "v2", "analyze housing", "synthesizer").unwrap();
    assert_eq!(v2.version, 2);
    assert_eq!(v2.text, "v2");
    assert_eq!(v2.history.len(), 1);
    assert_eq!(v2.history[0].version, 1);
    assert_eq!(v2.history[0].text, "v1");

    // Human curation replaces the text and locks the entry at v3.
    let v3 = prompts::curate(&store, &domains, Some("v2-final"), "alice", "tightened").unwrap();
    assert_eq!(v3.version, 3);
    assert_eq!(v3.status, PromptStatus::Curated);
    assert_eq!(v3.text, "v2-final");
    assert_eq!(v3.curated_by.as_deref(), Some("alice"));
    assert_eq!(v3.human_notes, "tightened");

    // Twenty high-confidence runs: counters accrue, curated status holds.
    for _ in 0..PROMOTION_MIN_RUNS {
        prompts::log_run(&store, &domains, 0.8, "expansion", &[]).unwrap();
    }
    let after_runs = prompts::get_prompt(&store, &domains).unwrap().unwrap();
    assert_eq!(after_runs.status, PromptStatus::Curated);
    assert_eq!(after_runs.version, 3);
    assert_eq!(after_runs.performance.runs, PROMOTION_MIN_RUNS);
    assert!((after_runs.performance.avg_confidence - 0.8).abs() < 1e-9);

    // Rollback restores v1 content and status under a new version number.
    let v4 = prompts::rollback(&store, &domains, 1).unwrap();
    assert_eq!(v4.version, 4);
    assert_eq!(v4.text, "v1");
    assert_eq!(v4.status, PromptStatus::Draft);
    // Performance counters survive the rollback.
    assert_eq!(v4.performance.runs, PROMOTION_MIN_RUNS);
}

#[test]
fn domain_tags_are_order_case_and_whitespace_insensitive() {
    let (_tmp, store) = test_store();
    let saved = tags(&["Housing", "inflation"]);
    let lookup = tags(&["INFLATION ", " housing"]);

    prompts::save_draft(&store, &saved, "text", "", "synth").unwrap();
    let entry = prompts::get_prompt(&store, &lookup).unwrap().unwrap();
    assert_eq!(entry.text, "text");
    assert_eq!(entry.key, derive_key(&saved));
    assert_eq!(entry.key.len(), 12);
}

#[test]
fn curated_entries_resist_draft_overwrite() {
    let (_tmp, store) = test_store();
    let domains = tags(&["rates"]);

    prompts::save_draft(&store, &domains, "machine text", "", "synth").unwrap();
    prompts::curate(&store, &domains, None, "bob", "").unwrap();

    let unchanged = prompts::save_draft(&store, &domains, "newer machine text", "", "synth").unwrap();
    assert_eq!(unchanged.status, PromptStatus::Curated);
    assert_eq!(unchanged.version, 2);
    assert_eq!(unchanged.text, "machine text");

    // Persisted state matches the no-op return.
    let on_disk = prompts::get_prompt(&store, &domains).unwrap().unwrap();
    assert_eq!(on_disk.version, 2);
    assert_eq!(on_disk.text, "machine text");
    assert_eq!(on_disk.history.len(), 1);
}

#[test]
fn history_is_capped_and_evicts_oldest_first() {
    let (_tmp, store) = test_store();
    let domains = tags(&["fx"]);

    for i in 1..=(HISTORY_CAP as u32 + 2) {
        prompts::save_draft(&store, &domains, &format!("t{}", i), "", "synth").unwrap();
    }
    let entry = prompts::get_prompt(&store, &domains).unwrap().unwrap();
    assert_eq!(entry.version, HISTORY_CAP as u32 + 2);
    assert_eq!(entry.history.len(), HISTORY_CAP);
    // v1 fell off the ring; v2 is the oldest survivor.
    assert_eq!(entry.history[0].version, 2);

    let err = prompts::rollback(&store, &domains, 1).unwrap_err();
    assert!(matches!(
        err,
        VaultError::VersionNotFound { version: 1, .. }
    ));
    let restored = prompts::rollback(&store, &domains, 2).unwrap();
    assert_eq!(restored.text, "t2");
}

#[test]
fn failed_rollback_leaves_entry_untouched() {
    let (_tmp, store) = test_store();
    let domains = tags(&["credit"]);

    prompts::save_draft(&store, &domains, "only", "", "synth").unwrap();
    let before = prompts::get_prompt(&store, &domains).unwrap().unwrap();

    let err = prompts::rollback(&store, &domains, 99).unwrap_err();
    assert!(matches!(err, VaultError::VersionNotFound { .. }));

    let after = prompts::get_prompt(&store, &domains).unwrap().unwrap();
    assert_eq!(after.version, before.version);
    assert_eq!(after.text, before.text);
    assert_eq!(after.history.len(), before.history.len());
}

#[test]
fn average_confidence_is_an_incremental_mean() {
    let (_tmp, store) = test_store();
    let domains = tags(&["equities"]);
    prompts::save_draft(&store, &domains, "t", "", "synth").unwrap();

    prompts::log_run(&store, &domains, 0.5, "calm", &[]).unwrap();
    prompts::log_run(&store, &domains, 1.0, "calm", &[]).unwrap();
    prompts::log_run(&store, &domains, 0.75, "calm", &[]).unwrap();

    let perf = prompts::get_prompt(&store, &domains)
        .unwrap()
        .unwrap()
        .performance;
    assert_eq!(perf.runs, 3);
    assert!((perf.avg_confidence - 0.75).abs() < 1e-9);
}

#[test]
fn confidence_is_clamped_to_unit_interval() {
    let (_tmp, store) = test_store();
    let domains = tags(&["vol"]);
    prompts::save_draft(&store, &domains, "t", "", "synth").unwrap();

    prompts::log_run(&store, &domains, 1.5, "calm", &[]).unwrap();
    prompts::log_run(&store, &domains, -0.5, "calm", &[]).unwrap();

    let perf = prompts::get_prompt(&store, &domains)
        .unwrap()
        .unwrap()
        .performance;
    assert!((perf.avg_confidence - 0.5).abs() < 1e-9);
}

#[test]
fn regime_changes_and_conflicts_are_counted() {
    let (_tmp, store) = test_store();
    let domains = tags(&["macro"]);
    prompts::save_draft(&store, &domains, "t", "", "synth").unwrap();

    // First observed regime is not a change.
    prompts::log_run(&store, &domains, 0.7, "bull", &[]).unwrap();
    prompts::log_run(&store, &domains, 0.7, "bear", &["a-vs-b".to_string()]).unwrap();
    prompts::log_run(&store, &domains, 0.7, "bear", &[]).unwrap();

    let perf = prompts::get_prompt(&store, &domains)
        .unwrap()
        .unwrap()
        .performance;
    assert_eq!(perf.regime_changes, 1);
    // One run reported conflicts, regardless of how many it listed.
    assert_eq!(perf.conflicts_detected, 1);
    assert_eq!(perf.last_regime.as_deref(), Some("bear"));
    assert!(perf.last_run.is_some());
}

#[test]
fn draft_auto_promotes_at_threshold() {
    let (_tmp, store) = test_store();
    let domains = tags(&["commodities"]);
    prompts::save_draft(&store, &domains, "t", "", "synth").unwrap();

    for _ in 0..(PROMOTION_MIN_RUNS - 1) {
        prompts::log_run(&store, &domains, 0.9, "calm", &[]).unwrap();
    }
    let entry = prompts::get_prompt(&store, &domains).unwrap().unwrap();
    assert_eq!(entry.status, PromptStatus::Draft);

    prompts::log_run(&store, &domains, 0.9, "calm", &[]).unwrap();
    let entry = prompts::get_prompt(&store, &domains).unwrap().unwrap();
    assert_eq!(entry.status, PromptStatus::Evolving);
    // Status-only: no version bump, no history entry.
    assert_eq!(entry.version, 1);
    assert!(entry.history.is_empty());
}

#[test]
fn low_confidence_draft_never_promotes() {
    let (_tmp, store) = test_store();
    let domains = tags(&["bonds"]);
    prompts::save_draft(&store, &domains, "t", "", "synth").unwrap();

    for _ in 0..(PROMOTION_MIN_RUNS * 2) {
        prompts::log_run(&store, &domains, 0.5, "calm", &[]).unwrap();
    }
    let entry = prompts::get_prompt(&store, &domains).unwrap().unwrap();
    assert_eq!(entry.status, PromptStatus::Draft);
}

#[test]
fn log_run_against_missing_entry_is_a_silent_noop() {
    let (_tmp, store) = test_store();
    let domains = tags(&["ghost"]);

    prompts::log_run(&store, &domains, 0.9, "calm", &[]).unwrap();
    assert!(prompts::get_prompt(&store, &domains).unwrap().is_none());
}

#[test]
fn delete_reports_removal_and_next_draft_bootstraps_fresh() {
    let (_tmp, store) = test_store();
    let domains = tags(&["energy"]);

    prompts::save_draft(&store, &domains, "t", "", "synth").unwrap();
    prompts::log_run(&store, &domains, 0.9, "calm", &[]).unwrap();

    assert!(prompts::delete_prompt(&store, &domains).unwrap());
    assert!(!prompts::delete_prompt(&store, &domains).unwrap());
    assert!(prompts::get_prompt(&store, &domains).unwrap().is_none());

    let fresh = prompts::save_draft(&store, &domains, "t2", "", "synth").unwrap();
    assert_eq!(fresh.version, 1);
    assert_eq!(fresh.performance.runs, 0);
    assert!(fresh.history.is_empty());
}

#[test]
fn redraft_carries_counters_and_refreshes_provenance() {
    let (_tmp, store) = test_store();
    let domains = tags(&["labor"]);

    prompts::save_draft(&store, &domains, "t1", "intent", "synth-a").unwrap();
    for _ in 0..3 {
        prompts::log_run(&store, &domains, 0.6, "calm", &[]).unwrap();
    }
    let v2 = prompts::save_draft(&store, &domains, "t2", "intent", "synth-b").unwrap();
    assert_eq!(v2.version, 2);
    assert_eq!(v2.performance.runs, 3);
    assert_eq!(v2.generated_by, "synth-b");
}

#[test]
fn curate_missing_entry_is_not_found() {
    let (_tmp, store) = test_store();
    let err = prompts::curate(&store, &tags(&["void"]), None, "alice", "").unwrap_err();
    assert!(matches!(err, VaultError::NotFound(_)));
}

#[test]
fn empty_domain_list_is_rejected() {
    let (_tmp, store) = test_store();
    let err = prompts::save_draft(&store, &[], "t", "", "synth").unwrap_err();
    assert!(matches!(err, VaultError::ValidationError(_)));
    let err = prompts::save_draft(&store, &tags(&["  ", ""]), "t", "", "synth").unwrap_err();
    assert!(matches!(err, VaultError::ValidationError(_)));
}

#[test]
fn list_filters_by_status_and_orders_by_recency() {
    let (_tmp, store) = test_store();
    prompts::save_draft(&store, &tags(&["a"]), "t", "", "synth").unwrap();
    prompts::save_draft(&store, &tags(&["b"]), "t", "", "synth").unwrap();
    prompts::curate(&store, &tags(&["b"]), None, "alice", "").unwrap();

    let all = prompts::list_prompts(&store, None).unwrap();
    assert_eq!(all.len(), 2);
    let epochs: Vec<u64> = all
        .iter()
        .map(|e| e.updated_at.trim_end_matches('Z').parse::<u64>().unwrap())
        .collect();
    assert!(epochs[0] >= epochs[1]);

    let curated = prompts::list_prompts(&store, Some(PromptStatus::Curated)).unwrap();
    assert_eq!(curated.len(), 1);
    assert_eq!(curated[0].key, derive_key(&tags(&["b"])));

    let drafts = prompts::list_prompts(&store, Some(PromptStatus::Draft)).unwrap();
    assert_eq!(drafts.len(), 1);
}

#[test]
fn best_prompt_returns_text_of_any_status() {
    let (_tmp, store) = test_store();
    let domains = tags(&["crypto"]);
    assert!(prompts::get_best_prompt(&store, &domains).unwrap().is_none());

    prompts::save_draft(&store, &domains, "draft text", "", "synth").unwrap();
    assert_eq!(
        prompts::get_best_prompt(&store, &domains).unwrap().as_deref(),
        Some("draft text")
    );

    prompts::curate(&store, &domains, Some("curated text"), "alice", "").unwrap();
    assert_eq!(
        prompts::get_best_prompt(&store, &domains).unwrap().as_deref(),
        Some("curated text")
    );
}

#[test]
fn unknown_persisted_status_normalizes_to_draft() {
    let (_tmp, store) = test_store();
    let domains = tags(&["legacy"]);
    prompts::save_draft(&store, &domains, "t", "", "synth").unwrap();

    // Simulate a document written by an older/newer build with a status this
    // build does not know.
    let raw = std::fs::read_to_string(store.document_path()).unwrap();
    let mut doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let key = derive_key(&domains);
    doc["prompts"][&key]["status"] = serde_json::Value::String("experimental".to_string());
    std::fs::write(store.document_path(), doc.to_string()).unwrap();

    let entry = prompts::get_prompt(&store, &domains).unwrap().unwrap();
    assert_eq!(entry.status, PromptStatus::Draft);
}

#[test]
fn mutations_append_audit_events() {
    let (_tmp, store) = test_store();
    let domains = tags(&["audit"]);

    prompts::save_draft(&store, &domains, "t", "", "synth").unwrap();
    prompts::curate(&store, &domains, None, "alice", "").unwrap();
    let _ = prompts::rollback(&store, &domains, 99);

    let log = std::fs::read_to_string(store.events_path()).unwrap();
    let events: Vec<serde_json::Value> = log
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["op"], "prompts.save_draft");
    assert_eq!(events[0]["status"], "success");
    assert_eq!(events[1]["op"], "prompts.curate");
    assert_eq!(events[1]["actor"], "alice");
    assert_eq!(events[2]["op"], "prompts.rollback");
    assert_eq!(events[2]["status"], "error");
}

#[test]
fn document_survives_reload_across_store_handles() {
    let tmp = TempDir::new().unwrap();
    let domains = tags(&["persist"]);
    {
        let store = PromptStore::new(tmp.path());
        prompts::save_draft(&store, &domains, "t", "", "synth").unwrap();
    }
    let store = PromptStore::new(tmp.path());
    let state: RegistryState = store.load(RegistryState::bootstrap).unwrap();
    assert_eq!(state.prompts.len(), 1);
    assert!(!state.metadata.created.is_empty());
}
