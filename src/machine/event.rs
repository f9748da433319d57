//! Events the orchestrator consumes.
//!
//! Events are passive data describing something that happened. External
//! events come from the embedding application, child activities, the
//! provider and the ticker; internal events are raised by actions and are
//! drained before the next external event is accepted.

use crate::children::{ChildHandle, NavCommand, ReturnPath};
use crate::context::answers::Answer;
use crate::provider::NextItemResponse;
use crate::resolver::PreloadData;
use crate::session::SessionArgs;
use crate::types::ActivityRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════
    /// Open a session. Any previous session state is discarded.
    Load {
        args: SessionArgs,
        #[serde(default)]
        force_goto: bool,
    },

    /// Resolver output for the session opened by `LOAD`.
    Preload(Box<PreloadData>),

    /// Pools changed underneath the session; pick again.
    Update,

    /// A child activity machine was spawned.
    Launch { handle: ChildHandle },

    /// A child reported a new capability snapshot.
    ChildUpdate {
        activity_id: String,
        capabilities: BTreeSet<NavCommand>,
    },

    /// A child activity machine stopped.
    Kill { activity_id: String },

    /// Tear the session down; `session_ids` are the children to destroy.
    Destroy {
        #[serde(default)]
        session_ids: Vec<String>,
    },

    FinalExit,

    /// The embedding application closed the session window.
    Expire,

    // ═══════════════════════════════════════════════════════════════════════
    // Navigation
    // ═══════════════════════════════════════════════════════════════════════
    Next {
        #[serde(default)]
        from_child: bool,
        #[serde(default)]
        only_if: bool,
    },

    Previous {
        #[serde(default)]
        from_child: bool,
        #[serde(default)]
        only_if: bool,
    },

    Exit {
        #[serde(default)]
        from_child: bool,
        #[serde(default)]
        only_if: bool,
    },

    /// The current child finished loading and is on screen.
    Ready,

    EnableNav,

    DisableNav,

    /// Learner asked to move on from an answered activity.
    Continue,

    ShowedWarning,

    HandleFyd { ask_fyd_questions: bool },

    PauseTimer,

    ResumeTimer,

    Tick,

    // ═══════════════════════════════════════════════════════════════════════
    // Request/reply
    // ═══════════════════════════════════════════════════════════════════════
    /// An answer submitted by the current activity, relayed upward.
    Send { answer: Answer },

    /// The graded reply, routed back down along `targets`.
    SendReply {
        #[serde(default)]
        targets: ReturnPath,
        answer: Answer,
    },

    ServiceResponse(NextItemResponse),

    TeardownDone {
        #[serde(default)]
        error: Option<String>,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Internal
    // ═══════════════════════════════════════════════════════════════════════
    /// Regeneration request. `goto` moves the current position onto the
    /// result; `target` names the exact entry to move to.
    Generate {
        goto: bool,
        #[serde(default)]
        target: Option<ActivityRef>,
    },

    /// Generation placed a candidate (or resumed the current one).
    Generated { moved: bool },

    /// The finished phase produced nothing further.
    Exhausted,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Load { .. } => "LOAD",
            Event::Preload(_) => "PRELOAD",
            Event::Update => "UPDATE",
            Event::Launch { .. } => "LAUNCH",
            Event::ChildUpdate { .. } => "CHILD_UPDATE",
            Event::Kill { .. } => "KILL",
            Event::Destroy { .. } => "DESTROY",
            Event::FinalExit => "FINAL_EXIT",
            Event::Expire => "EXPIRE",
            Event::Next { .. } => "NEXT",
            Event::Previous { .. } => "PREVIOUS",
            Event::Exit { .. } => "EXIT",
            Event::Ready => "READY",
            Event::EnableNav => "ENABLE_NAV",
            Event::DisableNav => "DISABLE_NAV",
            Event::Continue => "CONTINUE",
            Event::ShowedWarning => "SHOWED_WARNING",
            Event::HandleFyd { .. } => "HANDLE_FYD",
            Event::PauseTimer => "PAUSE_TIMER",
            Event::ResumeTimer => "RESUME_TIMER",
            Event::Tick => "TICK",
            Event::Send { .. } => "SEND",
            Event::SendReply { .. } => "SEND_REPLY",
            Event::ServiceResponse(_) => "SERVICE_RESPONSE",
            Event::TeardownDone { .. } => "TEARDOWN_DONE",
            Event::Generate { .. } => "GENERATE",
            Event::Generated { .. } => "GENERATED",
            Event::Exhausted => "EXHAUSTED",
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Event::Generate { .. } | Event::Generated { .. } | Event::Exhausted
        )
    }

    /// The navigation command this event carries.
    pub fn nav_command(&self) -> Option<NavRequest> {
        let (command, from_child, only_if) = match self {
            Event::Next { from_child, only_if } => (NavCommand::Next, from_child, only_if),
            Event::Previous { from_child, only_if } => (NavCommand::Previous, from_child, only_if),
            Event::Exit { from_child, only_if } => (NavCommand::Exit, from_child, only_if),
            _ => return None,
        };
        Some(NavRequest {
            command,
            from_child: *from_child,
            only_if: *only_if,
        })
    }

    pub fn next() -> Self {
        Event::Next {
            from_child: false,
            only_if: false,
        }
    }

    pub fn previous() -> Self {
        Event::Previous {
            from_child: false,
            only_if: false,
        }
    }

    pub fn exit() -> Self {
        Event::Exit {
            from_child: false,
            only_if: false,
        }
    }

    /// A command sent back up by the child that owns it.
    pub fn from_child(command: NavCommand) -> Self {
        Self::nav(command, true, false)
    }

    /// A command the child only receives while navigation is open.
    pub fn only_if(command: NavCommand) -> Self {
        Self::nav(command, false, true)
    }

    fn nav(command: NavCommand, from_child: bool, only_if: bool) -> Self {
        match command {
            NavCommand::Next => Event::Next { from_child, only_if },
            NavCommand::Previous => Event::Previous { from_child, only_if },
            NavCommand::Exit => Event::Exit { from_child, only_if },
        }
    }
}

/// A `NEXT` / `PREVIOUS` / `EXIT` with its routing flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavRequest {
    pub command: NavCommand,
    /// Sent back by the child that owns the command; never forwarded again.
    pub from_child: bool,
    /// Forward to the child only while every navigation gate is open.
    pub only_if: bool,
}
