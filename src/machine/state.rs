//! State enums for both regions and the transition record.

use super::actions::Action;
use crate::types::Phase;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inner selection pipeline, run identically in every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GenerationStep {
    Idle,
    GoNextBegin,
    GoNextNavigate,
    GoNextPull,
    InvokeGetNext,
    GoNextFinalize,
}

impl GenerationStep {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationStep::Idle => "idle",
            GenerationStep::GoNextBegin => "goNextBegin",
            GenerationStep::GoNextNavigate => "goNextNavigate",
            GenerationStep::GoNextPull => "goNextPull",
            GenerationStep::InvokeGetNext => "invokeGetNext",
            GenerationStep::GoNextFinalize => "goNextFinalize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationState {
    Uninitialized,
    Phase(Phase, GenerationStep),
}

impl GenerationState {
    pub fn phase(self) -> Option<Phase> {
        match self {
            GenerationState::Uninitialized => None,
            GenerationState::Phase(phase, _) => Some(phase),
        }
    }

    pub fn step(self) -> Option<GenerationStep> {
        match self {
            GenerationState::Uninitialized => None,
            GenerationState::Phase(_, step) => Some(step),
        }
    }

    pub fn is_idle(self) -> bool {
        self.step() == Some(GenerationStep::Idle)
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationState::Uninitialized => f.write_str("uninitialized"),
            GenerationState::Phase(phase, step) => write!(f, "{}.{}", phase, step.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerSubstate {
    TimerStopped,
    TimerReady,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationState {
    Initial,
    Activity(TimerSubstate),
    GoNext,
    GoPrevious,
    ShowWarning,
    ShowFydAntagonizer,
    Final,
    Finished,
}

/// Tags UI layers query instead of matching on states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateTag {
    Visible,
    ShowWarning,
    Fyd,
}

impl NavigationState {
    pub fn tags(self) -> Vec<StateTag> {
        match self {
            NavigationState::Activity(_)
            | NavigationState::GoNext
            | NavigationState::GoPrevious
            | NavigationState::Final => vec![StateTag::Visible],
            NavigationState::ShowWarning => vec![StateTag::Visible, StateTag::ShowWarning],
            NavigationState::ShowFydAntagonizer => vec![StateTag::Fyd],
            NavigationState::Initial | NavigationState::Finished => Vec::new(),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, NavigationState::Final | NavigationState::Finished)
    }

    pub fn timer(self) -> Option<TimerSubstate> {
        match self {
            NavigationState::Activity(sub) => Some(sub),
            _ => None,
        }
    }
}

impl fmt::Display for NavigationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NavigationState::Initial => "initial",
            NavigationState::Activity(TimerSubstate::TimerStopped) => "activity.timerStopped",
            NavigationState::Activity(TimerSubstate::TimerReady) => "activity.timerReady",
            NavigationState::Activity(TimerSubstate::Completed) => "activity.completed",
            NavigationState::GoNext => "goNext",
            NavigationState::GoPrevious => "goPrevious",
            NavigationState::ShowWarning => "showWarning",
            NavigationState::ShowFydAntagonizer => "showFydAntagonizer",
            NavigationState::Final => "final",
            NavigationState::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// A table row's outcome: where to go and what to run on the way.
///
/// A `None` target is an internal transition: actions run, no exit or entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    pub target: Option<S>,
    pub actions: Vec<Action>,
}

impl<S> Transition<S> {
    pub fn to(target: S, actions: Vec<Action>) -> Self {
        Self {
            target: Some(target),
            actions,
        }
    }

    pub fn internal(actions: Vec<Action>) -> Self {
        Self {
            target: None,
            actions,
        }
    }

    /// Consume the event without doing anything.
    pub fn ignore() -> Self {
        Self::internal(Vec::new())
    }
}
