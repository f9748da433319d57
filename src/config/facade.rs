//! Single entry point for loading configuration.

use super::merge::merge_policy;
use super::sources::global_file;
use super::SequencerConfig;
use crate::error::SequencerError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`SequencerConfig`] from the layered sources.
///
/// Precedence, lowest first: merge-policy defaults, the global user file,
/// `config/config.toml`, `config/{SEQUENCER_ENV}.toml`, then `SEQUENCER__*`
/// environment variables.
pub struct ConfigLoader;

/// Selects the environment-specific workspace file.
pub const ENV_VAR: &str = "SEQUENCER_ENV";
const DEFAULT_ENV: &str = "development";

impl ConfigLoader {
    pub fn load(workspace_root: &Path) -> Result<SequencerConfig, SequencerError> {
        let mut builder = global_file::add_to_builder(merge_policy::builder_with_defaults()?)?;
        for path in Self::workspace_files(workspace_root) {
            debug!(config_path = %path.display(), "Adding workspace configuration");
            builder = builder.add_source(File::from(path).required(false));
        }
        let config = builder.add_source(merge_policy::environment()).build()?;
        debug!(workspace_root = %workspace_root.display(), "Configuration loaded");
        Ok(config.try_deserialize()?)
    }

    /// Existing workspace files, base first: `config/config.toml`, then
    /// `config/{SEQUENCER_ENV}.toml`.
    pub fn workspace_files(workspace_root: &Path) -> Vec<PathBuf> {
        let dir = workspace_root.join("config");
        let env = std::env::var(ENV_VAR).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        [dir.join("config.toml"), dir.join(format!("{}.toml", env))]
            .into_iter()
            .filter(|path| path.exists())
            .collect()
    }

    /// Load an explicit file instead of the global and workspace files.
    pub fn load_from_file(path: &Path) -> Result<SequencerConfig, SequencerError> {
        if !path.exists() {
            return Err(SequencerError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true))
            .add_source(merge_policy::environment())
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
