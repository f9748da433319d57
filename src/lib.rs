//! Activity Sequencer: hierarchical state-machine orchestration of learning activities
//!
//! A session runs two parallel regions over one shared context. The
//! generation region picks the next activity phase by phase (preparatory,
//! activities, supplemental); the navigation region presents it, gates
//! navigation commands, runs the timer and forwards commands to child
//! activities. Replies travel back to children along an explicit return path.

pub mod children;
pub mod cli;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod fyd;
pub mod harness;
pub mod logging;
pub mod machine;
pub mod provider;
pub mod resolver;
pub mod runtime;
pub mod script;
pub mod session;
pub mod types;
pub mod warning;

pub use error::SequencerError;
pub use harness::SessionHarness;
pub use machine::{Effect, Event, Orchestrator};
pub use runtime::{SessionHandle, SessionRuntime};
