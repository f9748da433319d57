//! CLI parse: clap types for the sequencer. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Activity sequencer - replay and inspect sequencing sessions
#[derive(Parser)]
#[command(name = "sequencer")]
#[command(about = "Hierarchical state-machine orchestrator for learning activities")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (holds config/config.toml)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a replay script against a deterministic session
    Replay {
        /// Path to the TOML replay script
        script: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Validate the effective configuration
    ValidateConfig,
    /// Print the effective configuration as TOML
    ShowConfig,
}
