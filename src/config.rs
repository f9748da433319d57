//! Configuration System
//!
//! Layered configuration for sequencing sessions: merge-policy defaults, the
//! global user file, workspace files and `SEQUENCER__*` environment variables.
//! Lesson metadata loaded at session start overrides the session defaults.

use crate::error::SequencerError;
use crate::fyd::FydConfig;
use crate::logging::LoggingConfig;
use crate::provider::QuestionOrder;
use crate::types::{TimerScope, TimerType};
use crate::warning::WarningMode;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequencerConfig {
    /// Session defaults applied when a lesson does not set its own
    #[serde(default)]
    pub session: SessionConfig,

    /// Find-your-difficulty antagonizer heuristics
    #[serde(default)]
    pub fyd: FydConfig,

    /// Next-item provider settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults for a sequencing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of activities in the session; unlimited when unset.
    pub limit: Option<usize>,
    pub question_order: String,
    pub tick_interval_ms: u64,
    pub timer_type: TimerType,
    pub timer_scope: TimerScope,
    pub duration_secs: Option<u64>,
    pub warning_mode: WarningMode,
    /// Navigation starts disabled until the child sends `ENABLE_NAV`.
    pub nav_disabled_on_start: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            limit: None,
            question_order: "random".to_string(),
            tick_interval_ms: 250,
            timer_type: TimerType::None,
            timer_scope: TimerScope::Session,
            duration_secs: None,
            warning_mode: WarningMode::Timer,
            nav_disabled_on_start: true,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than zero".to_string());
        }
        if self.limit == Some(0) {
            return Err("limit must be greater than zero when set".to_string());
        }
        if self.question_order.parse::<QuestionOrder>().is_err() {
            return Err(format!("Unknown question_order '{}'", self.question_order));
        }
        if self.timer_type != TimerType::None && self.duration_secs.unwrap_or(0) == 0 {
            return Err("A timer needs a non-zero duration_secs".to_string());
        }
        Ok(())
    }
}

/// Settings for the built-in pool provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Fixed seed for reproducible random ordering.
    pub seed: Option<u64>,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Session(String),
    Fyd(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Session(msg) => write!(f, "Session: {}", msg),
            ValidationError::Fyd(msg) => write!(f, "FYD: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SequencerConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.session.validate() {
            errors.push(ValidationError::Session(e));
        }

        if self.fyd.package_size == 0 {
            errors.push(ValidationError::Fyd(
                "package_size must be greater than zero".to_string(),
            ));
        }

        if self.logging.format != "json" && self.logging.format != "text" {
            errors.push(ValidationError::Logging(format!(
                "Invalid format '{}' (must be 'json' or 'text')",
                self.logging.format
            )));
        }
        if !matches!(self.logging.output.as_str(), "stdout" | "stderr" | "file") {
            errors.push(ValidationError::Logging(format!(
                "Invalid output '{}'",
                self.logging.output
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Joins validation errors into a single configuration error.
pub fn validation_failure(errors: &[ValidationError]) -> SequencerError {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    SequencerError::Config(format!(
        "Configuration validation failed:\n{}",
        messages.join("\n")
    ))
}

/// Configuration manager for runtime updates
pub struct ConfigManager {
    config: Arc<RwLock<SequencerConfig>>,
}

impl ConfigManager {
    pub fn new(config: SequencerConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Reload configuration from files. The previous configuration stays in
    /// place when loading or validation fails.
    pub fn reload(&self, workspace_root: &Path) -> Result<(), SequencerError> {
        let new_config = ConfigLoader::load(workspace_root)?;
        new_config.validate().map_err(|errors| validation_failure(&errors))?;
        *self.config.write() = new_config;
        Ok(())
    }

    /// Get current configuration (read-only)
    pub fn get(&self) -> SequencerConfig {
        self.config.read().clone()
    }
}
