//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("session.question_order", "random")?
        .set_default("session.tick_interval_ms", 250)?
        .set_default("session.timer_type", "none")?
        .set_default("session.timer_scope", "session")?
        .set_default("session.warning_mode", "timer")?
        .set_default("session.nav_disabled_on_start", true)
}

/// Environment overrides, highest precedence: `SEQUENCER__SESSION__LIMIT=10`.
pub fn environment() -> Environment {
    Environment::with_prefix("SEQUENCER")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
