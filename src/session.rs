//! Session arguments and lesson metadata handed to the orchestrator at load.

use crate::types::{ActivityFilter, ActivityRef, TimerScope, TimerType};
use crate::warning::WarningMode;
use serde::{Deserialize, Serialize};

/// How the learner entered the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    #[default]
    Learn,
    /// Preview of a single activity.
    View,
    /// Exam mode: the full lesson pool is available regardless of history.
    Test,
}

/// Arguments the embedding application opened the session with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionArgs {
    pub course: String,
    /// Lesson path; nested lessons are separated by `/`.
    pub lesson: String,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub kind: SessionKind,
    #[serde(default)]
    pub is_fyd: bool,
    #[serde(default)]
    pub restart: bool,
    #[serde(default)]
    pub is_assignment: bool,
    #[serde(default)]
    pub activity_filter: Option<ActivityFilter>,
}

impl SessionArgs {
    pub fn new(course: impl Into<String>, lesson: impl Into<String>) -> Self {
        Self {
            course: course.into(),
            lesson: lesson.into(),
            ..Self::default()
        }
    }

    /// All lesson ids on the path, outermost first.
    pub fn lesson_ids(&self) -> Vec<String> {
        self.lesson
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The lesson the session is about: the innermost one on the path.
    pub fn selected_lesson_id(&self) -> Option<String> {
        self.lesson_ids().pop()
    }

    /// In a single-activity preview only that activity is eligible.
    pub fn admits(&self, activity: &ActivityRef) -> bool {
        match (&self.kind, &self.activity) {
            (SessionKind::View, Some(id)) => activity.kind != "activity" || activity.id == *id,
            _ => true,
        }
    }
}

/// Timer settings attached to a lesson.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LessonTimer {
    #[serde(default)]
    pub timer_type: TimerType,
    #[serde(default)]
    pub scope: TimerScope,
    pub duration_secs: Option<u64>,
}

/// Lesson metadata supplied by the content resolver.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LessonElement {
    pub id: String,
    pub course_id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Lesson opens at this instant (ms since epoch).
    #[serde(default)]
    pub start_millis: Option<u64>,
    /// Lesson closes at this instant; past it the session is expired.
    #[serde(default)]
    pub end_millis: Option<u64>,
    #[serde(default)]
    pub timer: Option<LessonTimer>,
    #[serde(default)]
    pub question_order: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub warning_mode: Option<WarningMode>,
    #[serde(default)]
    pub ask_before: Option<String>,
    #[serde(default)]
    pub ask_after: Option<String>,
    #[serde(default)]
    pub success_after: Option<String>,
    /// Overall lessons aggregate every activity of the course.
    #[serde(default)]
    pub overall: bool,
}

impl LessonElement {
    pub fn new(course_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            course_id: course_id.into(),
            ..Self::default()
        }
    }
}

/// Link to a lesson's before/after material, resolved at preload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLink {
    pub name: String,
    pub label: String,
    pub value: ActivityRef,
}
