//! promptvault — a versioned, file-backed registry of prompt artifacts.
//!
//! Prompts are keyed by the domain-tag combination they serve. Machine
//! synthesis saves drafts, logged run telemetry promotes drafts that perform,
//! and humans curate the entries that matter. Every content change archives
//! the prior state into a bounded history, so any retained version can be
//! rolled back to.
//!
//! Architecture:
//! - `core/` — store, broker, config, errors, time, output helpers
//! - `plugins/` — subsystems; each owns its schema and its CLI surface
//!
//! The store is a single JSON document replaced atomically on every
//! mutation; mutations additionally append to a JSONL audit log.

mod cli;
pub mod core;
pub mod plugins;

use crate::cli::{Cli, Command};
use crate::core::config;
use crate::core::error::VaultError;
use crate::core::store::PromptStore;
use crate::plugins::prompts;

use clap::Parser;
use std::fs;

/// Parse arguments, resolve the store root, and dispatch the command.
pub fn run() -> Result<(), VaultError> {
    let cli = Cli::parse();

    let root = match cli.store {
        Some(path) => path,
        None => {
            let cwd = std::env::current_dir()?;
            config::resolve_store_root(&cwd)?
        }
    };
    fs::create_dir_all(&root)?;
    let store = PromptStore::new(root);

    match cli.command {
        Command::Prompts(prompts_cli) => prompts::run_prompts_cli(&store, prompts_cli),
        Command::Audit { last } => run_audit(&store, last),
        Command::Version => {
            println!("promptvault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_audit(store: &PromptStore, last: usize) -> Result<(), VaultError> {
    let path = store.events_path();
    if !path.exists() {
        println!("No audit events recorded yet.");
        return Ok(());
    }
    let raw = fs::read_to_string(&path)?;
    let lines: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = if last > 0 && last < lines.len() {
        lines.len() - last
    } else {
        0
    };
    for line in &lines[start..] {
        println!("{}", line);
    }
    Ok(())
}
