//! Outbound messages produced by transitions.
//!
//! Effects are commands: the machine decides, the driver (async runtime or
//! synchronous harness) carries them out and feeds any result back in as an
//! event.

use crate::children::ReturnPath;
use crate::context::answers::Answer;
use crate::provider::NextItemRequest;
use crate::session::SessionArgs;
use crate::types::{ActivityRef, Phase};
use serde::{Deserialize, Serialize};

/// Messages addressed to a single child activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChildMessage {
    Next,
    Previous,
    Exit,
    Timeout,
    SendReply { targets: ReturnPath, answer: Answer },
}

/// Context attached to an answer relayed to the parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerMetadata {
    pub lesson: String,
    pub activity: Option<ActivityRef>,
    pub activity_index: Option<usize>,
    pub question_number: Option<usize>,
    pub mode: Option<Phase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    // ═══════════════════════════════════════════════════════════════════════
    // Delegated work (result returns as an event)
    // ═══════════════════════════════════════════════════════════════════════
    /// Resolve pools for the session. Returns `Event::Preload`.
    Preload { args: SessionArgs },

    /// Ask the next-item provider. Returns `Event::ServiceResponse`.
    RequestNextItem(NextItemRequest),

    /// Run teardown hooks. Returns `Event::TeardownDone`.
    StartTeardown,

    // ═══════════════════════════════════════════════════════════════════════
    // Timers
    // ═══════════════════════════════════════════════════════════════════════
    /// Start the periodic tick process. Replaces a running one.
    StartTicker { interval_ms: u64 },

    StopTicker,

    // ═══════════════════════════════════════════════════════════════════════
    // Children
    // ═══════════════════════════════════════════════════════════════════════
    ToChild {
        session_id: String,
        message: ChildMessage,
    },

    BroadcastTimeout { session_ids: Vec<String> },

    DestroyChildren { session_ids: Vec<String> },

    // ═══════════════════════════════════════════════════════════════════════
    // Parent notifications
    // ═══════════════════════════════════════════════════════════════════════
    SendParent {
        answer: Answer,
        metadata: AnswerMetadata,
    },

    UpdateBundle {
        lesson: String,
        mode: Phase,
        limit: Option<usize>,
    },

    PhaseChanged { phase: Phase },

    ActivityChanged { activity: ActivityRef, index: usize },

    SessionFinished,
}

impl Effect {
    /// Bundle key the phase is stored under.
    pub fn bundle_key(lesson: &str) -> String {
        format!("lessonMode.{}", lesson)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Effect::Preload { .. } => "preload",
            Effect::RequestNextItem(_) => "request_next_item",
            Effect::StartTeardown => "start_teardown",
            Effect::StartTicker { .. } => "start_ticker",
            Effect::StopTicker => "stop_ticker",
            Effect::ToChild { .. } => "to_child",
            Effect::BroadcastTimeout { .. } => "broadcast_timeout",
            Effect::DestroyChildren { .. } => "destroy_children",
            Effect::SendParent { .. } => "send_parent",
            Effect::UpdateBundle { .. } => "update_bundle",
            Effect::PhaseChanged { .. } => "phase_changed",
            Effect::ActivityChanged { .. } => "activity_changed",
            Effect::SessionFinished => "session_finished",
        }
    }
}
