// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines subcommands and global flags

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "crosspost")]
#[command(about = "Mirror Nostr text notes to X", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Comma-separated npubs or hex pubkeys to mirror (overrides NOSTR_NPUBS)
    #[arg(long, global = true)]
    pub npubs: Option<String>,

    /// Comma-separated relay URLs (overrides NOSTR_RELAYS)
    #[arg(long, global = true)]
    pub relays: Option<String>,

    /// Checkpoint file path
    #[arg(long, global = true, default_value = "sync_state.json")]
    pub state_file: PathBuf,

    /// Log intended posts without calling X; the checkpoint is left alone
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Fetch new notes and publish them (default)
    Sync,

    /// Show checkpoint state
    Status,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Sync)
    }
}
