//! Find-your-difficulty interception of NEXT.

use super::test_utils::*;
use activity_sequencer::context::answers::Answer;
use activity_sequencer::fyd::FydConfig;
use activity_sequencer::harness::SessionHarness;
use activity_sequencer::machine::{Event, NavigationState, StateTag};
use activity_sequencer::session::SessionArgs;
use activity_sequencer::types::Phase;

/// q1 was answered wrong in an earlier session; q2 is queued and unanswered.
fn fyd_harness() -> SessionHarness {
    let content = lesson_content(&["q1", "q2", "q3"])
        .with_selected("l1", questions(&["q1", "q2"]))
        .with_answers("l1", vec![Answer::for_activity(&q("q1")).sent(false, 0)]);
    let fyd = FydConfig {
        min_question_answered: 1,
        correct_answer_streak: 1,
        ..FydConfig::default()
    };
    harness_with(settings(), fyd, content)
}

/// Answer q2 correctly so q3 is pre-generated behind it, then press NEXT.
fn reach_antagonizer(harness: &mut SessionHarness) {
    harness.load(args());
    assert_eq!(current_id(harness), "q2");
    harness.answer_current(true).unwrap();
    let selected: Vec<String> = harness
        .orchestrator()
        .context()
        .selected
        .iter()
        .map(|a| a.id.clone())
        .collect();
    assert_eq!(selected, vec!["q1", "q2", "q3"]);
    assert_eq!(index(harness), Some(1));

    harness.send(Event::next());
    assert_eq!(
        harness.orchestrator().navigation(),
        NavigationState::ShowFydAntagonizer
    );
    assert!(harness.orchestrator().has_tag(StateTag::Fyd));
}

#[test]
fn test_accepting_fyd_replaces_pregenerated_item() {
    let mut harness = fyd_harness();
    reach_antagonizer(&mut harness);

    harness.send(Event::HandleFyd {
        ask_fyd_questions: true,
    });
    let context = harness.orchestrator().context();
    let selected: Vec<String> = context.selected.iter().map(|a| a.id.clone()).collect();
    assert_eq!(selected, vec!["q1", "q2", "q1"]);
    assert_eq!(context.activity_index, Some(2));

    let current = harness.expect_current().unwrap();
    assert_eq!(current.id, "q1");
    assert_eq!(current.redo_count, Some(1));
    assert_eq!(current.mode, Some(Phase::Supplemental));
    assert_eq!(context.fyd_last_asked, Some(2));
}

#[test]
fn test_declining_fyd_continues_normally() {
    let mut harness = fyd_harness();
    reach_antagonizer(&mut harness);

    harness.send(Event::HandleFyd {
        ask_fyd_questions: false,
    });
    assert_eq!(current_id(&harness), "q3");
    assert_eq!(index(&harness), Some(2));
    assert_eq!(harness.orchestrator().context().fyd_last_asked, Some(2));
    assert!(!harness.orchestrator().has_tag(StateTag::Fyd));
}

#[test]
fn test_exit_from_antagonizer_finishes() {
    let mut harness = fyd_harness();
    reach_antagonizer(&mut harness);
    harness.send(Event::exit());
    assert_eq!(harness.orchestrator().navigation(), NavigationState::Finished);
}

#[test]
fn test_fyd_session_is_never_antagonized() {
    let mut harness = fyd_harness();
    harness.load(SessionArgs {
        is_fyd: true,
        ..args()
    });
    harness.send(Event::next());
    assert_ne!(
        harness.orchestrator().navigation(),
        NavigationState::ShowFydAntagonizer
    );
}

#[test]
fn test_after_completion_replaces_finished_item() {
    let content = lesson_content(&["q1", "q2"])
        .with_selected("l1", questions(&["q1", "q2"]))
        .with_answers("l1", vec![Answer::for_activity(&q("q1")).sent(false, 0)]);
    let mut harness = harness_with(settings(), FydConfig::default(), content);
    harness.load(args());
    assert_eq!(current_id(&harness), "q2");

    // Nothing left to pre-generate: the lesson is complete.
    harness.answer_current(true).unwrap();
    assert_eq!(harness.orchestrator().context().mode, Some(Phase::Finished));

    harness.send(Event::next());
    assert_eq!(
        harness.orchestrator().navigation(),
        NavigationState::ShowFydAntagonizer
    );
    harness.send(Event::HandleFyd {
        ask_fyd_questions: true,
    });

    let context = harness.orchestrator().context();
    let selected: Vec<String> = context.selected.iter().map(|a| a.id.clone()).collect();
    assert_eq!(selected, vec!["q1", "q1"]);
    assert_eq!(context.activity_index, Some(1));
    assert_eq!(harness.expect_current().unwrap().redo_count, Some(1));
}
