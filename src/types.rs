//! Core value types shared by the context, the resolver and the state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker used in `ask_after` / `success_after` to close the main sequence.
pub const END_OF_SEQUENCE: &str = "__FINISHED__";

/// Macro-stage of generation. Visited strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Preparatory,
    Activities,
    Supplemental,
    Finished,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Preparatory => "preparatory",
            Phase::Activities => "activities",
            Phase::Supplemental => "supplemental",
            Phase::Finished => "finished",
        }
    }

    /// The phase visited after this one is exhausted. `Finished` has no successor.
    pub fn successor(self) -> Option<Phase> {
        match self {
            Phase::Preparatory => Some(Phase::Activities),
            Phase::Activities => Some(Phase::Supplemental),
            Phase::Supplemental => Some(Phase::Finished),
            Phase::Finished => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Freshness tag of an in-flight candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Picked fresh from a pool or the provider.
    New,
    /// Pulled off the navigation stack and not yet queued.
    NewNavigation,
    /// Already queued in `selected`.
    Navigation,
    /// Generation must stop and the current item is displayed as-is.
    Suspend,
}

/// How the per-activity countdown behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerType {
    #[default]
    None,
    Countdown,
    /// Countdown the learner may suspend from the UI.
    Pausable,
}

/// What running out of time ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerScope {
    /// Elapsed time past the duration expires the whole session.
    #[default]
    Session,
    /// Elapsed time past the duration only stops the current segment.
    Activity,
}

/// Identity of an activity independent of per-session decoration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActivityKey {
    pub course_id: String,
    pub kind: String,
    pub id: String,
}

impl fmt::Display for ActivityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.course_id, self.kind, self.id)
    }
}

/// Reference to a learning activity as queued in a session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub course_id: String,
    pub id: String,
    /// Retake index (starting at 1) when the activity is asked again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redo_count: Option<u32>,
    #[serde(default)]
    pub disable: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Phase pool this activity belongs to; `None` means the main pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask_before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_after: Option<String>,
    /// One of trivial, easy, standard, hard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_condition: Option<String>,
}

impl ActivityRef {
    pub fn new(kind: impl Into<String>, course_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            course_id: course_id.into(),
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn question(course_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new("question", course_id, id)
    }

    pub fn key(&self) -> ActivityKey {
        ActivityKey {
            course_id: self.course_id.clone(),
            kind: self.kind.clone(),
            id: self.id.clone(),
        }
    }

    pub fn with_mode(mut self, mode: Phase) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_question(&self) -> bool {
        self.kind == "question"
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Same queued entry: identity plus retake index.
    pub fn same_entry(&self, other: &ActivityRef) -> bool {
        self.id == other.id
            && self.kind == other.kind
            && self.course_id == other.course_id
            && self.redo_count == other.redo_count
    }

    /// Which phase pool the activity is drawn from.
    pub fn pool(&self) -> Phase {
        match self.mode {
            Some(Phase::Preparatory) => Phase::Preparatory,
            Some(Phase::Supplemental) => Phase::Supplemental,
            _ => Phase::Activities,
        }
    }

    /// Score needed for an answer to count as correct.
    pub fn success_threshold(&self) -> f64 {
        match self.success_condition.as_deref() {
            Some("easy") => 0.5,
            Some("trivial") => 0.25,
            Some("hard") => 0.95,
            _ => 0.8,
        }
    }

    /// Overlay pool data onto this reference, keeping per-session fields.
    pub fn hydrate_from(&self, record: &ActivityRef) -> ActivityRef {
        ActivityRef {
            redo_count: self.redo_count,
            disable: self.disable || record.disable,
            mode: self.mode.or(record.mode),
            ..record.clone()
        }
    }
}

/// Tag/kind filter applied to candidate pools before the provider sees them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityFilter {
    #[serde(default)]
    pub include_tags: Vec<String>,
    #[serde(default)]
    pub exclude_tags: Vec<String>,
    #[serde(default)]
    pub kinds: Vec<String>,
}

impl ActivityFilter {
    pub fn is_empty(&self) -> bool {
        self.include_tags.is_empty() && self.exclude_tags.is_empty() && self.kinds.is_empty()
    }

    pub fn matches(&self, activity: &ActivityRef) -> bool {
        if !self.kinds.is_empty() && !self.kinds.iter().any(|k| *k == activity.kind) {
            return false;
        }
        if self.exclude_tags.iter().any(|t| activity.has_tag(t)) {
            return false;
        }
        self.include_tags.is_empty() || self.include_tags.iter().any(|t| activity.has_tag(t))
    }
}

/// Quota of tagged activities a session must contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionQuery {
    pub tag: String,
    pub count: usize,
}
