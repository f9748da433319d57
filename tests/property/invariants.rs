//! Property-based tests for session invariants under arbitrary command sequences

use activity_sequencer::children::NavCommand;
use activity_sequencer::config::SessionConfig;
use activity_sequencer::context::answers::Answer;
use activity_sequencer::context::gates::NavGates;
use activity_sequencer::fyd::FydConfig;
use activity_sequencer::harness::SessionHarness;
use activity_sequencer::machine::{Event, NavigationState, TimerSubstate};
use activity_sequencer::resolver::InMemoryResolver;
use activity_sequencer::session::{LessonElement, SessionArgs};
use activity_sequencer::types::{ActivityRef, TimerScope, TimerType};
use activity_sequencer::warning::WarningMode;
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Next,
    Previous,
    ChildNext,
    Answer(bool),
    Send,
    Ready,
    Pause,
    Resume,
    EnableNav,
    DisableNav,
    Advance(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Next),
        2 => Just(Op::Previous),
        1 => Just(Op::ChildNext),
        3 => any::<bool>().prop_map(Op::Answer),
        1 => Just(Op::Send),
        2 => Just(Op::Ready),
        1 => Just(Op::Pause),
        1 => Just(Op::Resume),
        1 => Just(Op::EnableNav),
        1 => Just(Op::DisableNav),
        2 => (0u64..5_000).prop_map(Op::Advance),
    ]
}

fn session(question_count: usize, order: &str, timer: Option<TimerType>) -> SessionHarness {
    let ids: Vec<ActivityRef> = (0..question_count)
        .map(|i| ActivityRef::question("c", format!("q{}", i)))
        .collect();
    let content = InMemoryResolver::new().with_lesson(LessonElement::new("c", "l1"), ids);
    let mut settings = SessionConfig {
        question_order: order.to_string(),
        nav_disabled_on_start: false,
        warning_mode: WarningMode::Never,
        ..SessionConfig::default()
    };
    if let Some(timer_type) = timer {
        settings.timer_type = timer_type;
        settings.timer_scope = TimerScope::Session;
        settings.duration_secs = Some(3_600);
    }
    let mut harness = SessionHarness::new(settings, FydConfig::default(), Arc::new(content));
    harness.load(SessionArgs::new("c", "l1"));
    harness
}

fn apply(harness: &mut SessionHarness, op: &Op) {
    match op {
        Op::Next => {
            harness.send(Event::next());
        }
        Op::Previous => {
            harness.send(Event::previous());
        }
        Op::ChildNext => {
            harness.send(Event::from_child(NavCommand::Next));
        }
        Op::Answer(correct) => {
            // No current activity is a valid state to be in.
            let _ = harness.answer_current(*correct);
        }
        Op::Send => {
            let answer = match harness.expect_current() {
                Ok(current) => Answer::for_activity(current),
                Err(_) => return,
            };
            harness.send(Event::Send { answer });
        }
        Op::Ready => {
            harness.send(Event::Ready);
        }
        Op::Pause => {
            harness.send(Event::PauseTimer);
        }
        Op::Resume => {
            harness.send(Event::ResumeTimer);
        }
        Op::EnableNav => {
            harness.send(Event::EnableNav);
        }
        Op::DisableNav => {
            harness.send(Event::DisableNav);
        }
        Op::Advance(ms) => {
            harness.advance(*ms);
        }
    }
}

/// The position always points into `selected` and names the same entry.
#[test]
fn test_position_stays_in_range() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(1usize..6, prop::collection::vec(op(), 0..40), any::<bool>()),
            |(count, ops, sequential)| {
                let order = if sequential { "sequential" } else { "random" };
                let mut harness = session(count, order, None);
                for op in &ops {
                    apply(&mut harness, op);
                    let ctx = harness.orchestrator().context();
                    if let Some(i) = ctx.activity_index {
                        prop_assert!(i < ctx.selected.len());
                        prop_assert_eq!(ctx.activity_id.as_ref(), Some(&ctx.selected[i]));
                    }
                    prop_assert!(ctx.selected.len() <= count);
                }
                Ok(())
            },
        )
        .unwrap();
}

/// With an inline provider, generation always comes back to idle with
/// nothing deferred before the next external event.
#[test]
fn test_generation_returns_to_idle() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(1usize..6, prop::collection::vec(op(), 0..40)),
            |(count, ops)| {
                let mut harness = session(count, "sequential", None);
                for op in &ops {
                    apply(&mut harness, op);
                    let orchestrator = harness.orchestrator();
                    prop_assert!(orchestrator.generation().is_idle());
                    prop_assert!(orchestrator.context().deferred_generate.is_none());
                    prop_assert!(orchestrator.context().outstanding_request.is_none());
                }
                Ok(())
            },
        )
        .unwrap();
}

/// A closed gate swallows external navigation commands without a trace.
#[test]
fn test_closed_gates_block_external_commands() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                prop::collection::vec(op(), 0..20),
                any::<(bool, bool, bool)>(),
                0usize..3,
            ),
            |(ops, (child, own, generation), command)| {
                prop_assume!(child || own || generation);
                let mut harness = session(4, "sequential", None);
                for op in &ops {
                    apply(&mut harness, op);
                }
                prop_assume!(matches!(
                    harness.orchestrator().navigation(),
                    NavigationState::Activity(_)
                ));

                let context = harness.orchestrator_mut().context_mut();
                context.gates = NavGates {
                    nav_disabled: child,
                    nav_self_disabled: own,
                    nav_gen_disabled: generation,
                };
                // The antagonizer runs ahead of the gates.
                context.fyd_config.package_size = 0;
                let navigation = harness.orchestrator().navigation();
                let index = harness.orchestrator().context().activity_index;

                let event = match command {
                    0 => Event::next(),
                    1 => Event::previous(),
                    _ => Event::exit(),
                };
                harness.send(event);
                prop_assert_eq!(harness.orchestrator().navigation(), navigation);
                prop_assert_eq!(harness.orchestrator().context().activity_index, index);
                Ok(())
            },
        )
        .unwrap();
}

/// Remaining time never grows and elapsed time never shrinks.
#[test]
fn test_timer_is_monotonic() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(prop::collection::vec(op(), 0..60), any::<bool>()),
            |(ops, pausable)| {
                let timer_type = if pausable {
                    TimerType::Pausable
                } else {
                    TimerType::Countdown
                };
                let mut harness = session(3, "sequential", Some(timer_type));
                let mut last_elapsed = 0u64;
                let mut last_remaining = u64::MAX;
                for op in &ops {
                    apply(&mut harness, op);
                    let timer = &harness.orchestrator().context().timer;
                    let elapsed = timer.elapsed(harness.now());
                    prop_assert!(elapsed >= last_elapsed);
                    if let Some(remaining) = timer.remaining {
                        prop_assert!(remaining <= last_remaining);
                        last_remaining = remaining;
                    }
                    last_elapsed = elapsed;
                    if harness.orchestrator().navigation()
                        == NavigationState::Activity(TimerSubstate::TimerStopped)
                    {
                        prop_assert!(!harness.ticker_running());
                    }
                }
                Ok(())
            },
        )
        .unwrap();
}
