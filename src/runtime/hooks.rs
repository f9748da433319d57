//! Teardown hook run when navigation enters `final`.

use crate::error::SequencerError;
use crate::machine::Snapshot;
use async_trait::async_trait;

/// Persists or reports the session before it finishes.
///
/// Failures are reported back as `TEARDOWN_DONE` with an error and logged;
/// the session finishes either way.
#[async_trait]
pub trait TeardownHook: Send + Sync {
    async fn teardown(&self, snapshot: Snapshot) -> Result<(), SequencerError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTeardown;

#[async_trait]
impl TeardownHook for NoopTeardown {
    async fn teardown(&self, _snapshot: Snapshot) -> Result<(), SequencerError> {
        Ok(())
    }
}
