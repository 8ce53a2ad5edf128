//! Shared timestamp/event helpers for deterministic envelopes.

use ulid::Ulid;

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{}Z", secs)
}

/// Parses a `now_epoch_z` timestamp back to epoch seconds. Unparseable
/// input sorts first (treated as 0).
pub fn epoch_of(ts: &str) -> u64 {
    ts.trim_end_matches('Z').parse::<u64>().unwrap_or(0)
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}
