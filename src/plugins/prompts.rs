//! Prompts plugin: versioned prompt registry with human-in-the-loop curation.
//!
//! One entry per domain-tag combination. Machine-generated text lands as a
//! draft, earns `evolving` status through logged run performance, and becomes
//! `curated` only through an explicit human approval. Curated entries are
//! never overwritten by automatic draft saves; rollback restores any version
//! still retained in the entry's bounded history.
//!
//! All mutations run through [`RegistryBroker`] as serialized
//! load–mutate–replace cycles over the whole document.

use crate::core::broker::RegistryBroker;
use crate::core::error::VaultError;
use crate::core::output::compact_line;
use crate::core::store::PromptStore;
use crate::core::time::{epoch_of, now_epoch_z};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Retained history snapshots per entry; the oldest is evicted first.
pub const HISTORY_CAP: usize = 10;

/// Runs required before a draft is eligible for auto-promotion.
pub const PROMOTION_MIN_RUNS: u64 = 20;

/// Average confidence a draft must exceed to auto-promote.
pub const PROMOTION_MIN_CONFIDENCE: f64 = 0.6;

/// Truncated key length, in hex characters.
const KEY_LEN: usize = 12;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Persisted lifecycle status. `none`/`fallback` are caller-side rendering
/// concerns and never stored. Unknown strings found on load normalize to
/// `Draft` rather than propagating.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum PromptStatus {
    Draft,
    Evolving,
    Curated,
}

impl PromptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Evolving => "evolving",
            Self::Curated => "curated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "evolving" => Some(Self::Evolving),
            "curated" => Some(Self::Curated),
            _ => None,
        }
    }
}

impl From<String> for PromptStatus {
    fn from(value: String) -> Self {
        Self::parse(value.trim()).unwrap_or(Self::Draft)
    }
}

impl From<PromptStatus> for String {
    fn from(value: PromptStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Aggregate run counters, maintained incrementally (never recomputed from
/// history).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PerformanceStats {
    pub runs: u64,
    pub avg_confidence: f64,
    pub regime_changes: u64,
    pub conflicts_detected: u64,
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default)]
    pub last_regime: Option<String>,
}

/// Pre-mutation archive of an entry, retained for rollback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub text: String,
    pub status: PromptStatus,
    pub saved_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptEntry {
    pub key: String,
    /// Normalized, sorted domain tags (kept for display/debug, not lookup).
    pub domains: Vec<String>,
    pub status: PromptStatus,
    pub text: String,
    pub version: u32,
    pub intent: String,
    pub generated_by: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub curated_at: Option<String>,
    #[serde(default)]
    pub curated_by: Option<String>,
    #[serde(default)]
    pub human_notes: String,
    #[serde(default)]
    pub performance: PerformanceStats,
    #[serde(default)]
    pub history: Vec<Snapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub created: String,
}

/// The persisted document: process-wide metadata plus the key→entry map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryState {
    pub metadata: StoreMetadata,
    pub prompts: BTreeMap<String, PromptEntry>,
}

impl RegistryState {
    pub fn bootstrap() -> Self {
        Self {
            metadata: StoreMetadata {
                created: now_epoch_z(),
            },
            prompts: BTreeMap::new(),
        }
    }
}

// ============================================================================
// KEY DERIVATION
// ============================================================================

/// Normalize one domain tag: trim, lowercase, collapse internal whitespace
/// to a single underscore. Returns `None` for tags that normalize to empty.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let collapsed = tag
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Normalize and sort a domain-tag list. Order and casing of the input do
/// not matter; empty tags are dropped.
pub fn normalize_domains(domains: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = domains.iter().filter_map(|d| normalize_tag(d)).collect();
    tags.sort();
    tags
}

/// Derive the stable identifier for a domain-tag set: normalized sorted tags
/// joined with `|`, SHA-256 hashed, truncated to 12 hex chars. Pure and
/// deterministic; truncation collisions between distinct domain sets are an
/// accepted theoretical risk (the entry keeps its `domains` for inspection).
pub fn derive_key(domains: &[String]) -> String {
    let joined = normalize_domains(domains).join("|");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest.chars().take(KEY_LEN).collect()
}

fn keyed_domains(domains: &[String]) -> Result<(String, Vec<String>), VaultError> {
    let tags = normalize_domains(domains);
    if tags.is_empty() {
        return Err(VaultError::ValidationError(
            "at least one non-empty domain tag is required".to_string(),
        ));
    }
    let key = derive_key(domains);
    Ok((key, tags))
}

// ============================================================================
// ENTRY LIFECYCLE
// ============================================================================

/// Archive the entry's current state into its history before a content
/// mutation, evicting the oldest snapshot past the cap.
fn archive_snapshot(entry: &mut PromptEntry) {
    entry.history.push(Snapshot {
        version: entry.version,
        text: entry.text.clone(),
        status: entry.status,
        saved_at: now_epoch_z(),
    });
    if entry.history.len() > HISTORY_CAP {
        let excess = entry.history.len() - HISTORY_CAP;
        entry.history.drain(..excess);
    }
}

/// Save machine-generated text as a draft. Creates the entry at version 1 if
/// none exists. A curated entry is protected: the call is a no-op returning
/// the existing entry verbatim. Otherwise the current state is archived and
/// the entry re-drafted at the next version, carrying performance counters
/// and curator notes forward.
pub fn save_draft(
    store: &PromptStore,
    domains: &[String],
    text: &str,
    intent: &str,
    generated_by: &str,
) -> Result<PromptEntry, VaultError> {
    let (key, tags) = keyed_domains(domains)?;
    RegistryBroker::with_state(
        store,
        generated_by,
        "prompts.save_draft",
        &key,
        RegistryState::bootstrap,
        |state: &mut RegistryState| {
            let now = now_epoch_z();
            match state.prompts.get_mut(&key) {
                None => {
                    let entry = PromptEntry {
                        key: key.clone(),
                        domains: tags.clone(),
                        status: PromptStatus::Draft,
                        text: text.to_string(),
                        version: 1,
                        intent: intent.to_string(),
                        generated_by: generated_by.to_string(),
                        created_at: now.clone(),
                        updated_at: now,
                        curated_at: None,
                        curated_by: None,
                        human_notes: String::new(),
                        performance: PerformanceStats::default(),
                        history: Vec::new(),
                    };
                    state.prompts.insert(key.clone(), entry.clone());
                    Ok(entry)
                }
                Some(entry) if entry.status == PromptStatus::Curated => Ok(entry.clone()),
                Some(entry) => {
                    archive_snapshot(entry);
                    entry.version += 1;
                    entry.text = text.to_string();
                    entry.status = PromptStatus::Draft;
                    entry.generated_by = generated_by.to_string();
                    entry.updated_at = now;
                    Ok(entry.clone())
                }
            }
        },
    )
}

/// Human approval: archives the current state, optionally replaces the text,
/// and marks the entry curated at the next version. Non-empty notes replace
/// the prior curator notes.
pub fn curate(
    store: &PromptStore,
    domains: &[String],
    edited_text: Option<&str>,
    curator: &str,
    notes: &str,
) -> Result<PromptEntry, VaultError> {
    let (key, tags) = keyed_domains(domains)?;
    RegistryBroker::with_state(
        store,
        curator,
        "prompts.curate",
        &key,
        RegistryState::bootstrap,
        |state: &mut RegistryState| {
            let entry = state.prompts.get_mut(&key).ok_or_else(|| {
                VaultError::NotFound(format!("no prompt for domains {:?}", tags))
            })?;
            archive_snapshot(entry);
            if let Some(text) = edited_text {
                entry.text = text.to_string();
            }
            let now = now_epoch_z();
            entry.status = PromptStatus::Curated;
            entry.version += 1;
            entry.curated_at = Some(now.clone());
            entry.curated_by = Some(curator.to_string());
            entry.updated_at = now;
            if !notes.trim().is_empty() {
                entry.human_notes = notes.to_string();
            }
            Ok(entry.clone())
        },
    )
}

/// Record one analysis run against the entry's performance counters.
///
/// Telemetry is best-effort: logging against a missing key is a silent no-op
/// (it may race with deletion), never an error. A draft that has accumulated
/// [`PROMOTION_MIN_RUNS`] runs with mean confidence above
/// [`PROMOTION_MIN_CONFIDENCE`] auto-promotes to `evolving` — a status-only
/// change that bumps neither version nor history.
pub fn log_run(
    store: &PromptStore,
    domains: &[String],
    confidence: f64,
    regime: &str,
    conflicts: &[String],
) -> Result<(), VaultError> {
    let (key, _) = keyed_domains(domains)?;
    RegistryBroker::with_state(
        store,
        "telemetry",
        "prompts.log_run",
        &key,
        RegistryState::bootstrap,
        |state: &mut RegistryState| {
            let Some(entry) = state.prompts.get_mut(&key) else {
                return Ok(());
            };
            let confidence = confidence.clamp(0.0, 1.0);
            let perf = &mut entry.performance;
            perf.runs += 1;
            perf.avg_confidence += (confidence - perf.avg_confidence) / perf.runs as f64;
            if let Some(last) = perf.last_regime.as_deref() {
                if last != regime {
                    perf.regime_changes += 1;
                }
            }
            perf.last_regime = Some(regime.to_string());
            if !conflicts.is_empty() {
                perf.conflicts_detected += 1;
            }
            perf.last_run = Some(now_epoch_z());

            if entry.status == PromptStatus::Draft
                && perf.runs >= PROMOTION_MIN_RUNS
                && perf.avg_confidence > PROMOTION_MIN_CONFIDENCE
            {
                entry.status = PromptStatus::Evolving;
            }
            Ok(())
        },
    )
}

/// Restore the text and status of a version still retained in history. The
/// current state is archived first, and the entry always moves to a new
/// version number (never back to `to_version`).
pub fn rollback(
    store: &PromptStore,
    domains: &[String],
    to_version: u32,
) -> Result<PromptEntry, VaultError> {
    let (key, tags) = keyed_domains(domains)?;
    RegistryBroker::with_state(
        store,
        "promptvault",
        "prompts.rollback",
        &key,
        RegistryState::bootstrap,
        |state: &mut RegistryState| {
            let entry = state.prompts.get_mut(&key).ok_or_else(|| {
                VaultError::NotFound(format!("no prompt for domains {:?}", tags))
            })?;
            let snapshot = entry
                .history
                .iter()
                .find(|s| s.version == to_version)
                .cloned()
                .ok_or(VaultError::VersionNotFound {
                    key: key.clone(),
                    version: to_version,
                })?;
            archive_snapshot(entry);
            entry.text = snapshot.text;
            entry.status = snapshot.status;
            entry.version += 1;
            entry.updated_at = now_epoch_z();
            Ok(entry.clone())
        },
    )
}

/// Remove the entry entirely, history included. Returns whether a removal
/// occurred. No tombstone is kept; the next draft save bootstraps fresh.
pub fn delete_prompt(store: &PromptStore, domains: &[String]) -> Result<bool, VaultError> {
    let (key, _) = keyed_domains(domains)?;
    RegistryBroker::with_state(
        store,
        "promptvault",
        "prompts.delete",
        &key,
        RegistryState::bootstrap,
        |state: &mut RegistryState| Ok(state.prompts.remove(&key).is_some()),
    )
}

// ============================================================================
// REGISTRY API (reads)
// ============================================================================

/// Direct lookup by derived key. Absence is a normal state, not an error.
pub fn get_prompt(
    store: &PromptStore,
    domains: &[String],
) -> Result<Option<PromptEntry>, VaultError> {
    let (key, _) = keyed_domains(domains)?;
    let state: RegistryState = store.load(RegistryState::bootstrap)?;
    Ok(state.prompts.get(&key).cloned())
}

/// Text of the entry for these domains, whatever its persisted status.
/// `None` means the caller should fall back to its own bootstrap prompt.
pub fn get_best_prompt(
    store: &PromptStore,
    domains: &[String],
) -> Result<Option<String>, VaultError> {
    Ok(get_prompt(store, domains)?.map(|e| e.text))
}

/// All entries, optionally filtered to one status, most recently touched
/// first. Ties on `updated_at` break deterministically by key.
pub fn list_prompts(
    store: &PromptStore,
    status: Option<PromptStatus>,
) -> Result<Vec<PromptEntry>, VaultError> {
    let state: RegistryState = store.load(RegistryState::bootstrap)?;
    let mut entries: Vec<PromptEntry> = state
        .prompts
        .into_values()
        .filter(|e| status.is_none_or(|s| e.status == s))
        .collect();
    entries.sort_by(|a, b| {
        epoch_of(&b.updated_at)
            .cmp(&epoch_of(&a.updated_at))
            .then_with(|| a.key.cmp(&b.key))
    });
    Ok(entries)
}

// ============================================================================
// HEALTH ASSESSMENT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub grade: String,
    pub avg_confidence: f64,
    pub conflict_rate: f64,
    pub regime_change_rate: f64,
    pub issues: Vec<String>,
}

/// Grade an entry's run performance. Low confidence, frequent agent
/// conflicts, and unstable regimes each raise an issue; the grade degrades
/// with the number of issues raised.
pub fn assess_health(perf: &PerformanceStats) -> HealthReport {
    if perf.runs == 0 {
        return HealthReport {
            grade: "new".to_string(),
            avg_confidence: 0.0,
            conflict_rate: 0.0,
            regime_change_rate: 0.0,
            issues: vec!["No runs yet".to_string()],
        };
    }

    let runs = perf.runs as f64;
    let conflict_rate = perf.conflicts_detected as f64 / runs;
    let regime_change_rate = perf.regime_changes as f64 / runs;

    let mut issues = Vec::new();
    if perf.avg_confidence < 0.4 {
        issues.push("Low confidence - prompt may be too vague".to_string());
    }
    if conflict_rate > 0.5 {
        issues.push("High conflict rate - agents frequently disagree".to_string());
    }
    if regime_change_rate > 0.3 {
        issues.push("Frequent regime changes - possible noise".to_string());
    }

    let grade = match issues.len() {
        0 => "healthy",
        1 => "needs_attention",
        _ => "needs_review",
    };

    HealthReport {
        grade: grade.to_string(),
        avg_confidence: round3(perf.avg_confidence),
        conflict_rate: round3(conflict_rate),
        regime_change_rate: round3(regime_change_rate),
        issues,
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

// ============================================================================
// SCHEMA INFO
// ============================================================================

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "prompts",
        "version": "0.3.0",
        "description": "Versioned prompt registry with curation, rollback, and performance-weighted promotion",
        "commands": [
            { "name": "list", "description": "List all prompt entries", "parameters": ["status?", "format"] },
            { "name": "show", "description": "Show the full entry for a domain combination", "parameters": ["domain", "format"] },
            { "name": "best", "description": "Print the active prompt text for a domain combination", "parameters": ["domain"] },
            { "name": "draft", "description": "Save machine-generated text as a draft", "parameters": ["domain", "text", "intent", "generated-by"] },
            { "name": "curate", "description": "Approve (and optionally edit) the entry as curated", "parameters": ["domain", "edited-text?", "curator", "notes?"] },
            { "name": "log-run", "description": "Record one analysis run against the entry", "parameters": ["domain", "confidence", "regime", "conflict*"] },
            { "name": "rollback", "description": "Restore a version retained in history", "parameters": ["domain", "version"] },
            { "name": "delete", "description": "Remove the entry and its history", "parameters": ["domain"] },
            { "name": "performance", "description": "Health report for the entry's run performance", "parameters": ["domain", "format"] }
        ],
        "storage": ["prompts.json", "prompts.events.jsonl"],
        "statuses": ["draft", "evolving", "curated"],
        "promotion": { "min_runs": PROMOTION_MIN_RUNS, "min_avg_confidence": PROMOTION_MIN_CONFIDENCE },
        "history_cap": HISTORY_CAP
    })
}

// ============================================================================
// CLI TYPES AND HANDLERS
// ============================================================================

#[derive(clap::Args, Debug)]
pub struct PromptsCli {
    #[clap(subcommand)]
    pub command: PromptsCommand,
}

#[derive(clap::Subcommand, Debug)]
pub enum PromptsCommand {
    /// List all prompt entries, most recently touched first
    List {
        /// Filter by status (draft|evolving|curated)
        #[clap(long)]
        status: Option<String>,
        /// Output format: 'text' or 'json'
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Show the full entry for a domain combination
    Show {
        /// Domain tags (repeatable and/or comma-separated)
        #[clap(long = "domain", value_delimiter = ',')]
        domains: Vec<String>,
        /// Output format: 'text' or 'json'
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Print the active prompt text for a domain combination
    Best {
        /// Domain tags (repeatable and/or comma-separated)
        #[clap(long = "domain", value_delimiter = ',')]
        domains: Vec<String>,
    },
    /// Save machine-generated text as a draft
    Draft {
        /// Domain tags (repeatable and/or comma-separated)
        #[clap(long = "domain", value_delimiter = ',')]
        domains: Vec<String>,
        /// Prompt text
        #[clap(long)]
        text: String,
        /// Why this prompt was requested
        #[clap(long, default_value = "")]
        intent: String,
        /// Provenance tag of the creator
        #[clap(long, default_value = "cli")]
        generated_by: String,
    },
    /// Approve (and optionally edit) the entry as curated
    Curate {
        /// Domain tags (repeatable and/or comma-separated)
        #[clap(long = "domain", value_delimiter = ',')]
        domains: Vec<String>,
        /// Replacement text (keeps current text if omitted)
        #[clap(long)]
        edited_text: Option<String>,
        /// Curator identity
        #[clap(long, default_value = "human")]
        curator: String,
        /// Curator notes (non-empty notes replace prior notes)
        #[clap(long, default_value = "")]
        notes: String,
    },
    /// Record one analysis run against the entry
    LogRun {
        /// Domain tags (repeatable and/or comma-separated)
        #[clap(long = "domain", value_delimiter = ',')]
        domains: Vec<String>,
        /// Run confidence in [0,1]
        #[clap(long)]
        confidence: f64,
        /// Observed regime label
        #[clap(long)]
        regime: String,
        /// Conflicts reported by the run (repeatable)
        #[clap(long = "conflict")]
        conflicts: Vec<String>,
    },
    /// Restore a version retained in history
    Rollback {
        /// Domain tags (repeatable and/or comma-separated)
        #[clap(long = "domain", value_delimiter = ',')]
        domains: Vec<String>,
        /// Target version to restore
        #[clap(long)]
        version: u32,
    },
    /// Remove the entry and its history
    Delete {
        /// Domain tags (repeatable and/or comma-separated)
        #[clap(long = "domain", value_delimiter = ',')]
        domains: Vec<String>,
    },
    /// Health report for the entry's run performance
    Performance {
        /// Domain tags (repeatable and/or comma-separated)
        #[clap(long = "domain", value_delimiter = ',')]
        domains: Vec<String>,
        /// Output format: 'text' or 'json'
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Print the plugin's machine-readable schema
    Schema,
}

pub fn run_prompts_cli(store: &PromptStore, cli: PromptsCli) -> Result<(), VaultError> {
    use colored::Colorize;

    match cli.command {
        PromptsCommand::List { status, format } => {
            let filter = match status.as_deref() {
                None => None,
                Some(raw) => Some(PromptStatus::parse(raw.trim()).ok_or_else(|| {
                    VaultError::ValidationError(format!(
                        "unknown status '{}' (expected draft|evolving|curated)",
                        raw
                    ))
                })?),
            };
            let entries = list_prompts(store, filter)?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&entries).unwrap());
            } else if entries.is_empty() {
                println!("No prompts recorded yet.");
            } else {
                println!("{} prompt(s):", entries.len());
                for entry in entries {
                    println!(
                        "  [{}] {} v{} {} - {}",
                        entry.key,
                        render_status(entry.status),
                        entry.version,
                        entry.domains.join(","),
                        compact_line(&entry.text, 60)
                    );
                    println!(
                        "      runs: {} | avg confidence: {:.3} | updated: {}",
                        entry.performance.runs,
                        entry.performance.avg_confidence,
                        entry.updated_at
                    );
                }
            }
        }
        PromptsCommand::Show { domains, format } => match get_prompt(store, &domains)? {
            Some(entry) => {
                if format == "json" {
                    println!("{}", serde_json::to_string_pretty(&entry).unwrap());
                } else {
                    render_entry(&entry);
                }
            }
            None => {
                println!(
                    "No prompt exists yet for {:?}. It will be drafted on the next synthesis run.",
                    normalize_domains(&domains)
                );
            }
        },
        PromptsCommand::Best { domains } => match get_best_prompt(store, &domains)? {
            Some(text) => println!("{}", text),
            None => println!("No prompt exists yet for {:?}.", normalize_domains(&domains)),
        },
        PromptsCommand::Draft {
            domains,
            text,
            intent,
            generated_by,
        } => {
            let entry = save_draft(store, &domains, &text, &intent, &generated_by)?;
            if entry.status == PromptStatus::Curated {
                println!(
                    "{} Entry is curated (v{}); draft save skipped.",
                    "✗".bright_yellow(),
                    entry.version
                );
            } else {
                println!(
                    "{} Draft saved: {} v{}",
                    "✓".bright_green(),
                    entry.key,
                    entry.version
                );
            }
        }
        PromptsCommand::Curate {
            domains,
            edited_text,
            curator,
            notes,
        } => {
            let entry = curate(store, &domains, edited_text.as_deref(), &curator, &notes)?;
            println!(
                "{} Curated: {} v{} by {}",
                "✓".bright_green(),
                entry.key,
                entry.version,
                curator
            );
        }
        PromptsCommand::LogRun {
            domains,
            confidence,
            regime,
            conflicts,
        } => {
            log_run(store, &domains, confidence, &regime, &conflicts)?;
            println!("✓ Run logged.");
        }
        PromptsCommand::Rollback { domains, version } => {
            let entry = rollback(store, &domains, version)?;
            println!(
                "{} Rolled back to content of v{}; entry is now {} v{}",
                "✓".bright_green(),
                version,
                render_status(entry.status),
                entry.version
            );
        }
        PromptsCommand::Delete { domains } => {
            if delete_prompt(store, &domains)? {
                println!("✓ Prompt deleted. The next draft save bootstraps a fresh entry.");
            } else {
                println!("No prompt found to delete.");
            }
        }
        PromptsCommand::Performance { domains, format } => match get_prompt(store, &domains)? {
            Some(entry) => {
                let report = assess_health(&entry.performance);
                if format == "json" {
                    let out = serde_json::json!({
                        "key": entry.key,
                        "status": entry.status,
                        "version": entry.version,
                        "performance": entry.performance,
                        "health": report,
                    });
                    println!("{}", serde_json::to_string_pretty(&out).unwrap());
                } else {
                    println!(
                        "{} v{} - grade: {}",
                        entry.key,
                        entry.version,
                        render_grade(&report.grade)
                    );
                    println!(
                        "  runs: {} | avg confidence: {:.3} | conflict rate: {:.3} | regime change rate: {:.3}",
                        entry.performance.runs,
                        report.avg_confidence,
                        report.conflict_rate,
                        report.regime_change_rate
                    );
                    for issue in &report.issues {
                        println!("  {} {}", "▸".bright_yellow(), issue);
                    }
                }
            }
            None => {
                println!("No prompt exists yet for {:?}.", normalize_domains(&domains));
            }
        },
        PromptsCommand::Schema => {
            println!("{}", serde_json::to_string_pretty(&schema()).unwrap());
        }
    }

    Ok(())
}

fn render_status(status: PromptStatus) -> String {
    use colored::Colorize;
    match status {
        PromptStatus::Draft => "draft".bright_yellow().to_string(),
        PromptStatus::Evolving => "evolving".bright_cyan().to_string(),
        PromptStatus::Curated => "curated".bright_green().to_string(),
    }
}

fn render_grade(grade: &str) -> String {
    use colored::Colorize;
    match grade {
        "healthy" => grade.bright_green().to_string(),
        "needs_attention" => grade.bright_yellow().to_string(),
        "needs_review" => grade.bright_red().to_string(),
        _ => grade.to_string(),
    }
}

fn render_entry(entry: &PromptEntry) {
    println!("Key:       {}", entry.key);
    println!("Domains:   {}", entry.domains.join(", "));
    println!("Status:    {}", render_status(entry.status));
    println!("Version:   {}", entry.version);
    if !entry.intent.is_empty() {
        println!("Intent:    {}", entry.intent);
    }
    println!("Generated: {}", entry.generated_by);
    println!("Created:   {}", entry.created_at);
    println!("Updated:   {}", entry.updated_at);
    if let (Some(at), Some(by)) = (&entry.curated_at, &entry.curated_by) {
        println!("Curated:   {} by {}", at, by);
    }
    if !entry.human_notes.is_empty() {
        println!("Notes:     {}", compact_line(&entry.human_notes, 120));
    }
    println!(
        "Runs:      {} (avg confidence {:.3})",
        entry.performance.runs, entry.performance.avg_confidence
    );
    if !entry.history.is_empty() {
        println!("History:");
        for snap in &entry.history {
            println!(
                "  v{} [{}] saved {} - {}",
                snap.version,
                snap.status.as_str(),
                snap.saved_at,
                compact_line(&snap.text, 48)
            );
        }
    }
    println!();
    println!("{}", entry.text);
}
