//! Content resolution consumed during `PRELOAD`.
//!
//! The resolver turns a session's lesson path into the pools and history the
//! orchestrator needs. Short references (course, type, id) stored with earlier
//! sessions are hydrated against those pools here, before the state machine
//! ever sees them.

use crate::context::answers::Answer;
use crate::error::SequencerError;
use crate::session::{ActivityLink, LessonElement, SessionArgs};
use crate::types::{ActivityRef, SelectionQuery};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

pub trait ContentResolver: Send + Sync {
    /// Full activity records of a lesson, in pool order.
    fn activities(&self, lesson_id: &str) -> Result<Vec<ActivityRef>, SequencerError>;

    /// Activities a previous session already queued, as short references.
    fn selected_activities(&self, lesson_id: &str, is_fyd: bool) -> Result<Vec<ActivityRef>, SequencerError>;

    fn collection_activities(&self) -> Result<Vec<ActivityRef>, SequencerError>;

    fn selection_queries(&self) -> Result<Vec<SelectionQuery>, SequencerError>;

    fn lesson(&self, lesson_id: &str) -> Result<Option<LessonElement>, SequencerError>;

    fn answer_history(&self, lesson_id: &str) -> Result<Vec<Answer>, SequencerError>;
}

/// Everything `PRELOAD` hydrates the context with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreloadData {
    pub lesson: Option<LessonElement>,
    pub activities: Vec<ActivityRef>,
    pub selected: Vec<ActivityRef>,
    pub collection_activities: Vec<ActivityRef>,
    pub selection_queries: Vec<SelectionQuery>,
    pub answers: Vec<Answer>,
    pub links: Vec<ActivityLink>,
}

fn hydrate(short: &ActivityRef, pools: &[&[ActivityRef]]) -> Option<ActivityRef> {
    pools
        .iter()
        .flat_map(|pool| pool.iter())
        .find(|record| record.key() == short.key())
        .map(|record| short.hydrate_from(record))
}

/// Fetch and hydrate everything the session needs.
pub fn preload(resolver: &dyn ContentResolver, args: &SessionArgs) -> Result<PreloadData, SequencerError> {
    let lesson_id = args
        .selected_lesson_id()
        .ok_or_else(|| SequencerError::Resolver(format!("Empty lesson path: '{}'", args.lesson)))?;

    let lesson = resolver.lesson(&lesson_id)?;
    let collection_activities = resolver.collection_activities()?;
    let activities = match &lesson {
        Some(l) if l.overall => collection_activities.clone(),
        _ => resolver.activities(&lesson_id)?,
    };

    let selected = if args.restart {
        Vec::new()
    } else {
        let pools: [&[ActivityRef]; 2] = [&activities, &collection_activities];
        resolver
            .selected_activities(&lesson_id, args.is_fyd)?
            .iter()
            .filter_map(|short| {
                let hydrated = hydrate(short, &pools);
                if hydrated.is_none() {
                    warn!(activity = %short.key(), "Dropping unresolvable selected activity");
                }
                hydrated
            })
            .collect()
    };

    let links = lesson
        .as_ref()
        .map(|l| {
            [
                ("askBefore", "Before", &l.ask_before),
                ("askAfter", "After", &l.ask_after),
                ("successAfter", "On success", &l.success_after),
            ]
            .into_iter()
            .filter_map(|(name, label, id)| {
                let id = id.as_deref()?;
                let value = activities
                    .iter()
                    .chain(collection_activities.iter())
                    .find(|a| a.id == id)?
                    .clone();
                Some(ActivityLink {
                    name: name.to_string(),
                    label: label.to_string(),
                    value,
                })
            })
            .collect()
        })
        .unwrap_or_default();

    let data = PreloadData {
        lesson,
        selected,
        selection_queries: resolver.selection_queries()?,
        answers: resolver.answer_history(&lesson_id)?,
        activities,
        collection_activities,
        links,
    };
    debug!(
        lesson = %lesson_id,
        activities = data.activities.len(),
        selected = data.selected.len(),
        answers = data.answers.len(),
        "Preload resolved"
    );
    Ok(data)
}

/// Resolver backed by in-memory tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryResolver {
    #[serde(default)]
    pub lessons: HashMap<String, LessonElement>,
    #[serde(default)]
    pub activities: HashMap<String, Vec<ActivityRef>>,
    #[serde(default)]
    pub selected: HashMap<String, Vec<ActivityRef>>,
    #[serde(default)]
    pub fyd_selected: HashMap<String, Vec<ActivityRef>>,
    #[serde(default)]
    pub collection: Vec<ActivityRef>,
    #[serde(default)]
    pub queries: Vec<SelectionQuery>,
    #[serde(default)]
    pub answers: HashMap<String, Vec<Answer>>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lesson(mut self, lesson: LessonElement, activities: Vec<ActivityRef>) -> Self {
        self.activities.insert(lesson.id.clone(), activities);
        self.lessons.insert(lesson.id.clone(), lesson);
        self
    }

    pub fn with_selected(mut self, lesson_id: &str, selected: Vec<ActivityRef>) -> Self {
        self.selected.insert(lesson_id.to_string(), selected);
        self
    }

    pub fn with_collection(mut self, collection: Vec<ActivityRef>) -> Self {
        self.collection = collection;
        self
    }

    pub fn with_queries(mut self, queries: Vec<SelectionQuery>) -> Self {
        self.queries = queries;
        self
    }

    pub fn with_answers(mut self, lesson_id: &str, answers: Vec<Answer>) -> Self {
        self.answers.insert(lesson_id.to_string(), answers);
        self
    }
}

impl ContentResolver for InMemoryResolver {
    fn activities(&self, lesson_id: &str) -> Result<Vec<ActivityRef>, SequencerError> {
        self.activities
            .get(lesson_id)
            .cloned()
            .ok_or_else(|| SequencerError::Resolver(format!("Unknown lesson: {}", lesson_id)))
    }

    fn selected_activities(&self, lesson_id: &str, is_fyd: bool) -> Result<Vec<ActivityRef>, SequencerError> {
        let table = if is_fyd { &self.fyd_selected } else { &self.selected };
        Ok(table.get(lesson_id).cloned().unwrap_or_default())
    }

    fn collection_activities(&self) -> Result<Vec<ActivityRef>, SequencerError> {
        Ok(self.collection.clone())
    }

    fn selection_queries(&self) -> Result<Vec<SelectionQuery>, SequencerError> {
        Ok(self.queries.clone())
    }

    fn lesson(&self, lesson_id: &str) -> Result<Option<LessonElement>, SequencerError> {
        Ok(self.lessons.get(lesson_id).cloned())
    }

    fn answer_history(&self, lesson_id: &str) -> Result<Vec<Answer>, SequencerError> {
        Ok(self.answers.get(lesson_id).cloned().unwrap_or_default())
    }
}
