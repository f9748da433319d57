//! Error types for the activity sequencer.

use thiserror::Error;

/// Errors surfaced by the sequencer outside of the state machine itself.
///
/// The machine never fails a transition: blocked navigation is ignored and an
/// exhausted phase simply advances. These variants cover the collaborators
/// around it (resolver, provider, teardown hooks, configuration, scripts).
#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("No more activities available.")]
    NoMoreActivities,

    #[error("Unknown child activity: {0}")]
    UnknownChild(String),

    #[error("Next-item provider error: {0}")]
    Provider(String),

    #[error("Content resolver error: {0}")]
    Resolver(String),

    #[error("Teardown failed: {0}")]
    Teardown(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Replay script error: {0}")]
    Script(String),

    #[error("Session is closed")]
    SessionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for SequencerError {
    fn from(err: config::ConfigError) -> Self {
        SequencerError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for SequencerError {
    fn from(err: toml::de::Error) -> Self {
        SequencerError::Script(err.to_string())
    }
}
