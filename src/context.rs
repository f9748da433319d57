//! The shared session record threaded through every transition.
//!
//! Only machine actions mutate a [`Context`]. Guards and the functions in
//! [`views`] read it.

pub mod answers;
pub mod gates;
pub mod timer;
pub mod views;

use crate::children::ChildRegistry;
use crate::fyd::FydConfig;
use crate::session::{ActivityLink, LessonElement, SessionArgs};
use crate::types::{ActivityRef, Freshness, Phase, SelectionQuery, END_OF_SEQUENCE};
use crate::warning::WarningState;
use answers::AnswerLog;
use gates::NavGates;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use timer::SegmentTimer;

/// A pending regeneration request received while another attempt was running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub goto: bool,
    pub target: Option<ActivityRef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Context {
    pub args: SessionArgs,
    pub lesson: Option<LessonElement>,
    pub lesson_ids: Vec<String>,

    /// Every activity of the lesson, in pool order.
    pub activities: Vec<ActivityRef>,
    /// Queued for presentation. Append-only except for FYD replacement.
    pub selected: Vec<ActivityRef>,
    /// Main-pool candidates not yet queued.
    pub available: Vec<ActivityRef>,
    pub collection_activities: Vec<ActivityRef>,
    pub selection_queries: Vec<SelectionQuery>,
    pub navigation_stack: VecDeque<ActivityRef>,
    pub links: Vec<ActivityLink>,

    pub activity_id: Option<ActivityRef>,
    pub activity_index: Option<usize>,

    pub picked_next: Option<ActivityRef>,
    pub picked_next_new: Option<Freshness>,
    pub picked_next_retry: bool,
    /// Explicit target of the running generation attempt.
    pub goto_target: Option<ActivityRef>,
    /// The running attempt moves the current position when it finalizes.
    pub generate_goto: bool,
    pub deferred_generate: Option<GenerateRequest>,
    /// Resume the current activity instead of picking on the first attempt.
    pub resume_current: bool,
    /// `__FINISHED__` was reached; the main sequence takes no more items.
    pub sequence_closed: bool,
    pub outstanding_request: Option<u64>,

    pub gates: NavGates,
    pub timer: SegmentTimer,
    pub mode: Option<Phase>,
    pub limit: Option<usize>,
    pub question_order: String,

    pub fyd_config: FydConfig,
    /// Submitted-answer count when the antagonizer last ran.
    pub fyd_last_asked: Option<usize>,
    pub fyd_last_asked_time: Option<u64>,

    pub children: ChildRegistry,
    pub answers: AnswerLog,
    pub warning: WarningState,

    pub expired: bool,
    pub finished: bool,
}

impl Context {
    pub fn new(args: SessionArgs) -> Self {
        Self {
            lesson_ids: args.lesson_ids(),
            args,
            question_order: "sequential".to_string(),
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<&ActivityRef> {
        self.activity_index
            .and_then(|i| self.selected.get(i))
            .or(self.activity_id.as_ref())
    }

    pub fn current_answered(&self) -> bool {
        self.current()
            .map(|a| self.answers.is_answered(a))
            .unwrap_or(false)
    }

    pub fn position_of(&self, activity: &ActivityRef) -> Option<usize> {
        self.selected.iter().position(|a| a.same_entry(activity))
    }

    pub fn is_selected(&self, activity: &ActivityRef) -> bool {
        self.position_of(activity).is_some()
    }

    /// Move the current position. Out-of-range indices clear it.
    pub fn set_position(&mut self, index: Option<usize>) {
        match index.and_then(|i| self.selected.get(i).map(|a| (i, a.clone()))) {
            Some((i, activity)) => {
                self.activity_index = Some(i);
                self.activity_id = Some(activity);
            }
            None => {
                self.activity_index = None;
                self.activity_id = None;
            }
        }
    }

    /// Keep `activity_index` valid after `selected` shrinks.
    pub fn clamp_position(&mut self) {
        if self.selected.is_empty() {
            self.set_position(None);
        } else if let Some(i) = self.activity_index {
            self.set_position(Some(i.min(self.selected.len() - 1)));
        }
    }

    pub fn limit_reached(&self) -> bool {
        self.limit.map(|l| self.selected.len() >= l).unwrap_or(false)
    }

    /// Activities eligible for this session in the given phase pool.
    pub fn pool(&self, phase: Phase) -> impl Iterator<Item = &ActivityRef> {
        let filter = self.args.activity_filter.as_ref();
        self.activities.iter().filter(move |a| {
            a.pool() == phase
                && !a.disable
                && self.args.admits(a)
                && filter.map(|f| f.matches(a)).unwrap_or(true)
        })
    }

    pub fn first_unselected(&self, phase: Phase) -> Option<ActivityRef> {
        self.pool(phase).find(|a| !self.is_selected(a)).cloned()
    }

    /// Rebuild `available` from the main pool minus what is queued.
    pub fn refresh_available(&mut self) {
        let available: Vec<ActivityRef> = self
            .pool(Phase::Activities)
            .filter(|a| !self.is_selected(a))
            .cloned()
            .collect();
        self.available = available;
    }

    /// Collection activities not yet queued.
    pub fn remaining_collection(&self) -> Vec<ActivityRef> {
        self.collection_activities
            .iter()
            .filter(|a| !a.disable && !self.is_selected(a))
            .cloned()
            .collect()
    }

    /// Resolve an id from `ask_before` / `ask_after` / `success_after`.
    pub fn resolve_link(&self, id: &str) -> Option<ActivityRef> {
        self.activities
            .iter()
            .chain(self.collection_activities.iter())
            .find(|a| a.id == id)
            .cloned()
    }

    /// Push a forced successor. The end marker closes the main sequence instead.
    pub fn push_forced(&mut self, id: &str) {
        if id == END_OF_SEQUENCE {
            self.sequence_closed = true;
            return;
        }
        if let Some(activity) = self.resolve_link(id) {
            if !self.navigation_stack.iter().any(|a| a.same_entry(&activity)) {
                self.navigation_stack.push_front(activity);
            }
        }
    }

    /// Unselected pool item declaring `ask_before` for this candidate.
    pub fn ask_before_for(&self, candidate: &ActivityRef) -> Option<ActivityRef> {
        self.activities
            .iter()
            .filter(|a| !a.disable && !self.is_selected(a))
            .find(|a| a.ask_before.as_deref() == Some(candidate.id.as_str()))
            .cloned()
    }

    /// Count of queued activities carrying `tag`.
    pub fn selected_with_tag(&self, tag: &str) -> usize {
        self.selected.iter().filter(|a| a.has_tag(tag)).count()
    }

    pub fn lesson_key(&self) -> String {
        self.lesson_ids
            .last()
            .cloned()
            .unwrap_or_else(|| self.args.lesson.clone())
    }
}
