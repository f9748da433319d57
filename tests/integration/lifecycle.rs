//! Child registration, teardown and reloads.

use super::test_utils::*;
use activity_sequencer::children::{ChildHandle, NavCommand};
use activity_sequencer::machine::{ChildMessage, Effect, Event, NavigationState, TimerSubstate};
use std::collections::BTreeSet;

const STOPPED: NavigationState = NavigationState::Activity(TimerSubstate::TimerStopped);

fn launch_child(harness: &mut activity_sequencer::SessionHarness, caps: &[NavCommand]) -> String {
    let key = harness.expect_current().unwrap().key().to_string();
    harness.send(Event::Launch {
        handle: ChildHandle::new(key.clone(), "s1").with_capabilities(caps.iter().copied()),
    });
    key
}

#[test]
fn test_child_claims_next_until_capabilities_change() {
    let mut harness = harness(lesson_content(&["q1", "q2"]));
    harness.load(args());
    let key = launch_child(&mut harness, &[NavCommand::Next]);

    let effects = harness.send(Event::next());
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::ToChild {
            message: ChildMessage::Next,
            ..
        }
    )));
    assert_eq!(index(&harness), Some(0));

    // The child decides it is done and hands NEXT back.
    harness.send(Event::from_child(NavCommand::Next));
    assert_eq!(current_id(&harness), "q2");

    harness.send(Event::previous());
    assert_eq!(current_id(&harness), "q1");
    harness.send(Event::ChildUpdate {
        activity_id: key,
        capabilities: BTreeSet::new(),
    });
    let effects = harness.send(Event::next());
    assert!(!effects.iter().any(|e| matches!(e, Effect::ToChild { .. })));
    assert_eq!(current_id(&harness), "q2");
}

#[test]
fn test_child_receives_next_while_its_navigation_is_disabled() {
    // Navigation starts disabled for every activity.
    let mut harness = harness_with(
        activity_sequencer::config::SessionConfig {
            question_order: "sequential".to_string(),
            ..Default::default()
        },
        Default::default(),
        lesson_content(&["q1", "q2"]),
    );
    harness.load(args());
    assert!(harness.orchestrator().context().gates.nav_disabled);
    launch_child(&mut harness, &[NavCommand::Next]);

    let is_forward = |e: &Effect| {
        matches!(
            e,
            Effect::ToChild {
                message: ChildMessage::Next,
                ..
            }
        )
    };
    let effects = harness.send(Event::next());
    assert!(effects.iter().any(is_forward));

    // A conditional NEXT respects the closed gate.
    let effects = harness.send(Event::only_if(NavCommand::Next));
    assert!(!effects.iter().any(is_forward));
    assert_eq!(current_id(&harness), "q1");

    harness.send(Event::from_child(NavCommand::Next));
    assert_eq!(current_id(&harness), "q2");
}

#[test]
fn test_kill_removes_child() {
    let mut harness = harness(lesson_content(&["q1", "q2"]));
    harness.load(args());
    let key = launch_child(&mut harness, &[NavCommand::Next]);
    assert_eq!(harness.orchestrator().context().children.len(), 1);

    harness.send(Event::Kill { activity_id: key });
    assert!(harness.orchestrator().context().children.is_empty());
    harness.send(Event::next());
    assert_eq!(current_id(&harness), "q2");
}

#[test]
fn test_destroy_closes_session() {
    let mut harness = harness(lesson_content(&["q1", "q2"]));
    harness.load(args());
    launch_child(&mut harness, &[]);

    let effects = harness.send(Event::Destroy {
        session_ids: vec!["s1".to_string()],
    });
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::DestroyChildren { session_ids } if session_ids == &vec!["s1".to_string()]
    )));
    assert!(harness.orchestrator().is_closed());
    assert!(harness.orchestrator().context().children.is_empty());

    assert!(harness.send(Event::next()).is_empty());
    assert_eq!(index(&harness), Some(0));
}

#[test]
fn test_expire_broadcasts_to_children() {
    let mut harness = harness(lesson_content(&["q1"]));
    harness.load(args());
    launch_child(&mut harness, &[]);

    harness.send(Event::Expire);
    assert!(harness.outbound().iter().any(|e| matches!(
        e,
        Effect::BroadcastTimeout { session_ids } if session_ids == &vec!["s1".to_string()]
    )));
    assert_eq!(harness.orchestrator().navigation(), NavigationState::Finished);
}

#[test]
fn test_load_after_finish_starts_over() {
    let mut harness = harness(lesson_content(&["q1", "q2"]));
    harness.load(args());
    harness.send(Event::next());
    harness.send(Event::exit());
    assert_eq!(harness.orchestrator().navigation(), NavigationState::Finished);

    harness.load(args());
    assert_eq!(harness.orchestrator().navigation(), STOPPED);
    assert_eq!(index(&harness), Some(0));
    assert_eq!(current_id(&harness), "q1");
    assert!(!harness.orchestrator().context().finished);
}
