//! CLI route: single route table and run context.

use crate::cli::parse::Commands;
use crate::config::{validation_failure, ConfigLoader, SequencerConfig};
use crate::error::SequencerError;
use crate::script::{ReplayReport, ReplayScript};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use std::path::{Path, PathBuf};
use tracing::info;

/// Runtime context for CLI execution: the loaded configuration.
pub struct RunContext {
    config: SequencerConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, SequencerError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Ok(Self { config })
    }

    pub fn from_config(config: SequencerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<String, SequencerError> {
        match command {
            Commands::Replay { script, format } => self.handle_replay(script, format),
            Commands::ValidateConfig => self.handle_validate_config(),
            Commands::ShowConfig => toml::to_string_pretty(&self.config)
                .map_err(|e| SequencerError::Config(format!("Failed to render config: {}", e))),
        }
    }

    fn handle_replay(&self, path: &Path, format: &str) -> Result<String, SequencerError> {
        self.config
            .validate()
            .map_err(|errors| validation_failure(&errors))?;
        let script = ReplayScript::load(path)?;
        let report = script.run(&self.config)?;
        info!(script = %path.display(), steps = report.steps.len(), "Replay finished");
        match format {
            "json" => serde_json::to_string_pretty(&report)
                .map_err(|e| SequencerError::Script(format!("Failed to render report: {}", e))),
            "text" => Ok(format_report_text(&report)),
            other => Err(SequencerError::Script(format!(
                "Unknown output format '{}' (must be 'text' or 'json')",
                other
            ))),
        }
    }

    fn handle_validate_config(&self) -> Result<String, SequencerError> {
        match self.config.validate() {
            Ok(()) => Ok("Configuration is valid".to_string()),
            Err(errors) => Err(validation_failure(&errors)),
        }
    }
}

/// Format a replay report as a step table plus a one-line summary.
fn format_report_text(report: &ReplayReport) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Step", "Navigation", "Generation", "Activity"]);
    for record in &report.steps {
        table.add_row(vec![
            record.index.to_string(),
            record.step.to_string(),
            record.snapshot.navigation.clone(),
            record.snapshot.generation.clone(),
            record.snapshot.activity.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    let last = &report.final_snapshot;
    format!(
        "{}\nfinal: navigation={} generation={} selected={} outbound={}",
        table,
        last.navigation,
        last.generation,
        last.selected.len(),
        report.outbound.len()
    )
}
