//! Shared builders for integration tests.

#![allow(dead_code)]

use activity_sequencer::config::SessionConfig;
use activity_sequencer::fyd::FydConfig;
use activity_sequencer::harness::SessionHarness;
use activity_sequencer::machine::Effect;
use activity_sequencer::resolver::InMemoryResolver;
use activity_sequencer::session::{LessonElement, SessionArgs};
use activity_sequencer::types::ActivityRef;
use std::sync::Arc;

pub fn q(id: &str) -> ActivityRef {
    ActivityRef::question("c", id)
}

pub fn questions(ids: &[&str]) -> Vec<ActivityRef> {
    ids.iter().map(|id| q(id)).collect()
}

pub fn lesson_content(ids: &[&str]) -> InMemoryResolver {
    InMemoryResolver::new().with_lesson(LessonElement::new("c", "l1"), questions(ids))
}

/// Sequential ordering and navigation open from the start.
pub fn settings() -> SessionConfig {
    SessionConfig {
        question_order: "sequential".to_string(),
        nav_disabled_on_start: false,
        ..SessionConfig::default()
    }
}

pub fn harness(content: InMemoryResolver) -> SessionHarness {
    harness_with(settings(), FydConfig::default(), content)
}

pub fn harness_with(settings: SessionConfig, fyd: FydConfig, content: InMemoryResolver) -> SessionHarness {
    SessionHarness::new(settings, fyd, Arc::new(content))
}

pub fn args() -> SessionArgs {
    SessionArgs::new("c", "l1")
}

pub fn current_id(harness: &SessionHarness) -> String {
    harness.expect_current().unwrap().id.clone()
}

pub fn index(harness: &SessionHarness) -> Option<usize> {
    harness.orchestrator().context().activity_index
}

pub fn count_requests(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::RequestNextItem(_)))
        .count()
}
