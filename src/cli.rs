//! CLI struct definitions for the promptvault command-line interface.
//!
//! All top-level clap-derived types live here. Subsystem-specific CLI types
//! live alongside their subsystem (see [`crate::plugins::prompts`]).

use crate::plugins::prompts;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "promptvault",
    version = env!("CARGO_PKG_VERSION"),
    about = "Versioned prompt registry: machine drafts earn promotion through logged performance, humans curate, rollback restores retained history.",
    disable_version_flag = true
)]
pub(crate) struct Cli {
    /// Store root directory (overrides config and environment)
    #[clap(long, global = true)]
    pub store: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Versioned prompt registry
    #[clap(name = "prompts", visible_alias = "p")]
    Prompts(prompts::PromptsCli),

    /// Show the brokered mutation audit log
    #[clap(name = "audit")]
    Audit {
        /// Number of trailing events to show (0 = all)
        #[clap(long, default_value_t = 0)]
        last: usize,
    },

    /// Show version information
    #[clap(name = "version")]
    Version,
}
