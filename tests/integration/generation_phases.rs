//! Phase ordering, caps, prerequisites and deferred requests.

use super::test_utils::*;
use activity_sequencer::machine::{
    Effect, Event, GenerationState, GenerationStep, NavigationState, TimerSubstate,
};
use activity_sequencer::provider::NextItemResponse;
use activity_sequencer::resolver::InMemoryResolver;
use activity_sequencer::session::LessonElement;
use activity_sequencer::types::{ActivityRef, Phase};

fn phased_content() -> InMemoryResolver {
    InMemoryResolver::new().with_lesson(
        LessonElement::new("c", "l1"),
        vec![
            q("p1").with_mode(Phase::Preparatory),
            q("q1"),
            q("q2"),
            q("s1").with_mode(Phase::Supplemental),
        ],
    )
}

fn phases(effects: &[Effect]) -> Vec<Phase> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::PhaseChanged { phase } => Some(*phase),
            _ => None,
        })
        .collect()
}

#[test]
fn test_phases_are_visited_in_order() {
    let mut harness = harness(phased_content());
    harness.load(args());
    assert_eq!(current_id(&harness), "p1");
    assert_eq!(harness.orchestrator().context().mode, Some(Phase::Preparatory));

    let mut seen = Vec::new();
    for _ in 0..3 {
        harness.send(Event::next());
        seen.push(current_id(&harness));
    }
    assert_eq!(seen, vec!["q1", "q2", "s1"]);
    assert_eq!(harness.orchestrator().context().mode, Some(Phase::Supplemental));

    // Supplemental exhausted: generation finishes, the last item stays shown.
    harness.send(Event::next());
    assert_eq!(harness.orchestrator().context().mode, Some(Phase::Finished));
    assert_eq!(
        harness.orchestrator().generation(),
        GenerationState::Phase(Phase::Finished, GenerationStep::Idle)
    );
    assert_eq!(
        harness.orchestrator().navigation(),
        NavigationState::Activity(TimerSubstate::TimerStopped)
    );
    assert_eq!(current_id(&harness), "s1");

    // Nothing left: NEXT has no capability any more.
    harness.send(Event::next());
    assert_eq!(index(&harness), Some(3));

    assert_eq!(
        phases(harness.effects()),
        vec![
            Phase::Preparatory,
            Phase::Activities,
            Phase::Supplemental,
            Phase::Finished
        ]
    );
}

#[test]
fn test_phase_change_updates_bundle() {
    let mut harness = harness(phased_content());
    harness.load(args());
    let bundle = harness.outbound().iter().find_map(|e| match e {
        Effect::UpdateBundle { lesson, mode, .. } => Some((lesson.clone(), *mode)),
        _ => None,
    });
    assert_eq!(bundle, Some(("l1".to_string(), Phase::Preparatory)));
    assert_eq!(Effect::bundle_key("l1"), "lessonMode.l1");
}

#[test]
fn test_limit_short_circuits_provider() {
    let mut lesson = LessonElement::new("c", "l1");
    lesson.limit = Some(1);
    let content = InMemoryResolver::new().with_lesson(lesson, questions(&["q1", "q2", "q3"]));
    let mut harness = harness(content);
    harness.load(args());
    assert_eq!(current_id(&harness), "q1");

    harness.send(Event::next());
    assert_eq!(count_requests(harness.effects()), 1);
    assert_eq!(harness.orchestrator().context().selected.len(), 1);
    assert_eq!(harness.orchestrator().context().mode, Some(Phase::Finished));
}

#[test]
fn test_prerequisite_is_presented_first() {
    let mut intro = q("intro");
    intro.ask_before = Some("q1".to_string());
    let content = InMemoryResolver::new().with_lesson(LessonElement::new("c", "l1"), vec![q("q1"), intro]);
    let mut harness = harness(content);
    harness.load(args());
    assert_eq!(current_id(&harness), "intro");

    harness.send(Event::next());
    assert_eq!(current_id(&harness), "q1");
    assert_eq!(index(&harness), Some(1));
    assert_eq!(count_requests(harness.effects()), 1);
}

#[test]
fn test_end_of_sequence_marker_closes_activities() {
    let mut q1 = q("q1");
    q1.ask_after = Some("__FINISHED__".to_string());
    let content = InMemoryResolver::new()
        .with_lesson(LessonElement::new("c", "l1"), vec![q1, q("q2"), q("s1").with_mode(Phase::Supplemental)]);
    let mut harness = harness(content);
    harness.load(args());
    assert_eq!(current_id(&harness), "q1");
    assert!(harness.orchestrator().context().sequence_closed);

    harness.send(Event::next());
    assert_eq!(current_id(&harness), "s1");
    assert_eq!(count_requests(harness.effects()), 1);
}

#[test]
fn test_requests_while_busy_are_deferred() {
    let mut harness = harness(lesson_content(&["q1", "q2"])).manual_provider();
    harness.load(args());
    assert_eq!(harness.pending_requests().len(), 1);

    // Arrives mid-request; served once the pipeline is idle again.
    harness.send(Event::Update);
    assert!(harness.orchestrator().context().deferred_generate.is_some());

    harness.respond(Some(q("q1"))).unwrap();
    assert_eq!(index(&harness), Some(0));
    assert_eq!(harness.pending_requests().len(), 1);
    assert!(harness.orchestrator().context().gates.nav_gen_disabled);

    harness.respond(Some(q("q2"))).unwrap();
    assert_eq!(index(&harness), Some(1));
    assert!(!harness.orchestrator().context().gates.nav_gen_disabled);
}

#[test]
fn test_stale_provider_reply_is_ignored() {
    let mut harness = harness(lesson_content(&["q1"])).manual_provider();
    harness.load(args());
    let request_id = harness.pending_requests()[0].request_id;

    harness.send(Event::ServiceResponse(NextItemResponse {
        request_id: request_id + 1,
        item: Some(q("q1")),
    }));
    assert!(harness.orchestrator().context().selected.is_empty());
    assert_eq!(harness.orchestrator().generation().step(), Some(GenerationStep::InvokeGetNext));

    harness.respond(Some(q("q1"))).unwrap();
    assert_eq!(current_id(&harness), "q1");
}

#[test]
fn test_answer_pregenerates_without_moving() {
    let mut harness = harness(lesson_content(&["q1", "q2"]));
    harness.load(args());
    harness.answer_current(true).unwrap();

    let context = harness.orchestrator().context();
    assert_eq!(context.selected.len(), 2);
    assert_eq!(context.activity_index, Some(0));
    assert_eq!(
        harness.orchestrator().navigation(),
        NavigationState::Activity(TimerSubstate::Completed)
    );

    harness.send(Event::next());
    assert_eq!(current_id(&harness), "q2");
    assert_eq!(count_requests(harness.effects()), 2);
}

#[test]
fn test_success_successor_is_queued_on_correct_answer() {
    let mut q1 = q("q1");
    q1.success_after = Some("bonus".to_string());
    let content = InMemoryResolver::new()
        .with_lesson(LessonElement::new("c", "l1"), vec![q1, q("q2"), ActivityRef::question("c", "bonus")]);
    let mut harness = harness(content);
    harness.load(args());
    assert_eq!(current_id(&harness), "q1");

    harness.answer_current(true).unwrap();
    harness.send(Event::next());
    assert_eq!(current_id(&harness), "bonus");
}

#[test]
fn test_follow_up_is_asked_right_after() {
    let mut q1 = q("q1");
    q1.ask_after = Some("q3".to_string());
    let content =
        InMemoryResolver::new().with_lesson(LessonElement::new("c", "l1"), vec![q1, q("q2"), q("q3")]);
    let mut harness = harness(content);
    harness.load(args());
    assert_eq!(current_id(&harness), "q1");

    harness.answer_current(true).unwrap();
    harness.send(Event::next());
    assert_eq!(current_id(&harness), "q3");
    // The follow-up came off the navigation stack, not the provider.
    assert_eq!(count_requests(harness.effects()), 1);

    harness.send(Event::next());
    assert_eq!(current_id(&harness), "q2");
}

#[test]
fn test_follow_up_already_selected_returns_to_it() {
    let mut q2 = q("q2");
    q2.ask_after = Some("q1".to_string());
    let content =
        InMemoryResolver::new().with_lesson(LessonElement::new("c", "l1"), vec![q("q1"), q2]);
    let mut harness = harness(content);
    harness.load(args());
    harness.send(Event::next());
    assert_eq!(current_id(&harness), "q2");
    assert_eq!(harness.orchestrator().context().navigation_stack.len(), 1);

    // q1 is already queued: generation suspends and shows it again.
    harness.send(Event::next());
    assert_eq!(current_id(&harness), "q1");
    assert_eq!(index(&harness), Some(0));
    assert_eq!(harness.orchestrator().context().selected.len(), 2);
    assert!(harness.orchestrator().context().navigation_stack.is_empty());
    assert_eq!(count_requests(harness.effects()), 2);
    assert_eq!(
        harness.orchestrator().navigation(),
        NavigationState::Activity(TimerSubstate::TimerStopped)
    );
}
