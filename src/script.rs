//! Replay scripts: a session's content plus a list of steps, run through the
//! [`SessionHarness`] with a manual clock.
//!
//! ```toml
//! seed = 7
//!
//! [args]
//! course = "c"
//! lesson = "l1"
//!
//! [[steps]]
//! step = "send"
//! event = { type = "READY" }
//!
//! [[steps]]
//! step = "expect"
//! navigation = "activity.timerReady"
//! ```

use crate::config::{SequencerConfig, SessionConfig};
use crate::error::SequencerError;
use crate::harness::SessionHarness;
use crate::machine::{Effect, Event, Snapshot};
use crate::provider::PoolProvider;
use crate::resolver::InMemoryResolver;
use crate::session::SessionArgs;
use crate::types::Phase;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    /// Seed for the pool provider's random ordering. Falls back to
    /// `provider.seed` from the configuration.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Overrides the configured session defaults.
    #[serde(default)]
    pub session: Option<SessionConfig>,
    /// Clock value when the session is loaded.
    #[serde(default)]
    pub start_millis: u64,
    pub args: SessionArgs,
    #[serde(default)]
    pub content: InMemoryResolver,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Send { event: Event },
    Advance { ms: u64 },
    /// Submit a sent answer for the current activity.
    Answer { correct: bool },
    Expect {
        #[serde(default)]
        navigation: Option<String>,
        /// Activity id of the current activity.
        #[serde(default)]
        activity: Option<String>,
        #[serde(default)]
        mode: Option<Phase>,
    },
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Send { .. } => "send",
            Step::Advance { .. } => "advance",
            Step::Answer { .. } => "answer",
            Step::Expect { .. } => "expect",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub step: &'static str,
    pub snapshot: Snapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepRecord>,
    pub outbound: Vec<Effect>,
    #[serde(rename = "final")]
    pub final_snapshot: Snapshot,
}

impl std::str::FromStr for ReplayScript {
    type Err = SequencerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self, SequencerError> {
        let text = std::fs::read_to_string(path)?;
        text.parse()
    }

    /// Run every step. An `expect` step that does not hold stops the replay
    /// with [`SequencerError::Script`].
    pub fn run(&self, config: &SequencerConfig) -> Result<ReplayReport, SequencerError> {
        let settings = self.session.clone().unwrap_or_else(|| config.session.clone());
        let mut harness = SessionHarness::new(settings, config.fyd.clone(), Arc::new(self.content.clone()))
            .with_provider(Arc::new(PoolProvider::new(self.seed.or(config.provider.seed))))
            .starting_at(self.start_millis);

        harness.load(self.args.clone());
        info!(lesson = %self.args.lesson, steps = self.steps.len(), "Replaying script");

        let mut records = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            debug!(index, step = step.name(), "Replay step");
            match step {
                Step::Send { event } => {
                    harness.send(event.clone());
                }
                Step::Advance { ms } => {
                    harness.advance(*ms);
                }
                Step::Answer { correct } => {
                    harness
                        .answer_current(*correct)
                        .map_err(|e| SequencerError::Script(format!("step {}: {}", index, e)))?;
                }
                Step::Expect {
                    navigation,
                    activity,
                    mode,
                } => check(index, &harness, navigation.as_deref(), activity.as_deref(), *mode)?,
            }
            records.push(StepRecord {
                index,
                step: step.name(),
                snapshot: harness.snapshot(),
            });
        }

        Ok(ReplayReport {
            steps: records,
            outbound: harness.take_outbound(),
            final_snapshot: harness.snapshot(),
        })
    }
}

fn check(
    index: usize,
    harness: &SessionHarness,
    navigation: Option<&str>,
    activity: Option<&str>,
    mode: Option<Phase>,
) -> Result<(), SequencerError> {
    let orchestrator = harness.orchestrator();
    if let Some(expected) = navigation {
        let found = orchestrator.navigation().to_string();
        if found != expected {
            return Err(SequencerError::Script(format!(
                "step {}: expected navigation '{}', found '{}'",
                index, expected, found
            )));
        }
    }
    if let Some(expected) = activity {
        let found = orchestrator.context().current().map(|a| a.id.as_str());
        if found != Some(expected) {
            return Err(SequencerError::Script(format!(
                "step {}: expected activity '{}', found {:?}",
                index, expected, found
            )));
        }
    }
    if let Some(expected) = mode {
        if orchestrator.context().mode != Some(expected) {
            return Err(SequencerError::Script(format!(
                "step {}: expected mode '{}', found {:?}",
                index,
                expected,
                orchestrator.context().mode
            )));
        }
    }
    Ok(())
}
