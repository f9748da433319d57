//! Navigation commands, gates and the warning screen.

use super::test_utils::*;
use activity_sequencer::children::NavCommand;
use activity_sequencer::machine::{
    Event, GenerationState, GenerationStep, NavigationState, StateTag, TimerSubstate,
};
use activity_sequencer::resolver::InMemoryResolver;
use activity_sequencer::session::LessonElement;
use activity_sequencer::types::{ActivityRef, Phase};
use activity_sequencer::warning::WarningMode;

const STOPPED: NavigationState = NavigationState::Activity(TimerSubstate::TimerStopped);

#[test]
fn test_resumed_session_navigates_to_queued_item() {
    let content = lesson_content(&["q1", "q2", "q3"]).with_selected("l1", questions(&["q1", "q2"]));
    let mut harness = harness(content);
    harness.load(args());

    assert_eq!(harness.orchestrator().navigation(), STOPPED);
    assert_eq!(index(&harness), Some(0));
    assert_eq!(current_id(&harness), "q1");

    harness.send(Event::next());
    assert_eq!(index(&harness), Some(1));
    assert_eq!(current_id(&harness), "q2");
    assert_eq!(harness.orchestrator().context().selected.len(), 2);
    assert_eq!(count_requests(harness.effects()), 0);
}

#[test]
fn test_next_at_end_asks_provider() {
    let mut harness = harness(lesson_content(&["q1", "q2"])).manual_provider();
    harness.load(args());
    assert_eq!(harness.pending_requests().len(), 1);
    assert_eq!(harness.orchestrator().navigation(), NavigationState::Initial);

    harness.respond(Some(q("q1"))).unwrap();
    assert_eq!(index(&harness), Some(0));
    assert_eq!(harness.orchestrator().navigation(), STOPPED);

    harness.send(Event::next());
    assert_eq!(harness.orchestrator().navigation(), NavigationState::GoNext);
    assert_eq!(
        harness.orchestrator().generation(),
        GenerationState::Phase(Phase::Activities, GenerationStep::InvokeGetNext)
    );
    let request = &harness.pending_requests()[0];
    assert_eq!(request.selected.len(), 1);
    assert_eq!(request.current.as_ref().map(|a| a.id.as_str()), Some("q1"));
    assert_eq!(request.question_order, "sequential");

    harness.respond(Some(q("q2"))).unwrap();
    assert_eq!(index(&harness), Some(1));
    assert_eq!(harness.orchestrator().navigation(), STOPPED);
}

#[test]
fn test_previous_returns_to_earlier_item() {
    let content = lesson_content(&["q1", "q2"]).with_selected("l1", questions(&["q1", "q2"]));
    let mut harness = harness(content);
    harness.load(args());
    harness.send(Event::next());
    assert_eq!(index(&harness), Some(1));

    harness.send(Event::previous());
    assert_eq!(index(&harness), Some(0));

    // Nothing before the first item.
    harness.send(Event::previous());
    assert_eq!(index(&harness), Some(0));
    assert_eq!(harness.orchestrator().navigation(), STOPPED);
}

#[test]
fn test_child_gate_blocks_external_commands_only() {
    let content = lesson_content(&["q1", "q2"]).with_selected("l1", questions(&["q1", "q2"]));
    let mut harness = harness(content);
    harness.load(args());

    harness.send(Event::DisableNav);
    assert!(harness.orchestrator().context().gates.nav_disabled);
    harness.send(Event::next());
    assert_eq!(index(&harness), Some(0));

    harness.send(Event::from_child(NavCommand::Next));
    assert_eq!(index(&harness), Some(1));

    harness.send(Event::EnableNav);
    harness.send(Event::previous());
    assert_eq!(index(&harness), Some(0));
}

#[test]
fn test_navigation_starts_disabled_by_default() {
    let content = lesson_content(&["q1", "q2"]).with_selected("l1", questions(&["q1", "q2"]));
    let mut harness = harness_with(
        activity_sequencer::config::SessionConfig {
            question_order: "sequential".to_string(),
            ..Default::default()
        },
        Default::default(),
        content,
    );
    harness.load(args());
    assert!(harness.orchestrator().context().gates.nav_disabled);
    harness.send(Event::next());
    assert_eq!(index(&harness), Some(0));

    harness.send(Event::EnableNav);
    harness.send(Event::next());
    assert_eq!(index(&harness), Some(1));
    // Every newly shown activity starts locked again.
    assert!(harness.orchestrator().context().gates.nav_disabled);
}

#[test]
fn test_continue_requires_an_answer() {
    let content = lesson_content(&["q1", "q2"]).with_selected("l1", questions(&["q1", "q2"]));
    let mut harness = harness(content);
    harness.load(args());

    harness.send(Event::Continue);
    assert_eq!(index(&harness), Some(0));

    harness.answer_current(true).unwrap();
    assert_eq!(
        harness.orchestrator().navigation(),
        NavigationState::Activity(TimerSubstate::Completed)
    );
    harness.send(Event::Continue);
    assert_eq!(index(&harness), Some(1));
}

#[test]
fn test_media_warning_holds_until_acknowledged() {
    let mut lesson = LessonElement::new("c", "l1");
    lesson.warning_mode = Some(WarningMode::Media);
    let content = InMemoryResolver::new().with_lesson(
        lesson,
        vec![
            ActivityRef::new("video", "c", "v1").with_tags(["video"]),
            q("q2"),
        ],
    );
    let mut harness = harness(content);
    harness.load(args());

    assert_eq!(harness.orchestrator().navigation(), NavigationState::ShowWarning);
    assert!(harness.orchestrator().has_tag(StateTag::ShowWarning));
    assert!(harness.orchestrator().has_tag(StateTag::Visible));
    assert!(harness.orchestrator().context().gates.nav_self_disabled);

    harness.send(Event::next());
    assert_eq!(harness.orchestrator().navigation(), NavigationState::ShowWarning);

    harness.send(Event::ShowedWarning);
    assert_eq!(harness.orchestrator().navigation(), STOPPED);
    assert!(!harness.orchestrator().context().gates.nav_self_disabled);
}

#[test]
fn test_exit_from_warning_finishes_session() {
    let mut lesson = LessonElement::new("c", "l1");
    lesson.warning_mode = Some(WarningMode::Always);
    let content = InMemoryResolver::new().with_lesson(
        lesson,
        vec![ActivityRef::new("video", "c", "v1").with_tags(["video"])],
    );
    let mut harness = harness(content);
    harness.load(args());
    assert_eq!(harness.orchestrator().navigation(), NavigationState::ShowWarning);

    harness.send(Event::exit());
    assert_eq!(harness.orchestrator().navigation(), NavigationState::Finished);
}
