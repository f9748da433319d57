//! Generation region: picks the next activity.
//!
//! Each phase runs the same pipeline:
//! `idle → goNextBegin → goNextNavigate → [goNextPull → invokeGetNext] → goNextFinalize`.
//! Only `idle` waits for an event; `invokeGetNext` waits for the provider.
//! Every other step resolves through eventless transitions.

use super::actions::Action;
use super::event::Event;
use super::guards;
use super::state::{GenerationState, GenerationStep, Transition};
use crate::context::Context;
use crate::types::Phase;
use tracing::debug;

type Row = Transition<GenerationState>;

fn step(phase: Phase, step: GenerationStep) -> GenerationState {
    GenerationState::Phase(phase, step)
}

/// Event-driven rows. `None` means the region does not consume the event.
pub fn on_event(state: GenerationState, event: &Event, ctx: &Context) -> Option<Row> {
    use GenerationStep::*;

    match (state, event) {
        (GenerationState::Uninitialized, Event::Generate { .. }) => Some(Row::to(
            step(Phase::Preparatory, GoNextBegin),
            vec![Action::StoreGenerate, Action::GenDisableNav],
        )),

        (GenerationState::Phase(phase, Idle), Event::Generate { .. }) => {
            if guards::needs_generate(ctx, Some(event)) {
                Some(Row::to(
                    step(phase, GoNextBegin),
                    vec![Action::StoreGenerate, Action::GenDisableNav],
                ))
            } else {
                debug!("Regeneration not needed");
                Some(Row::ignore())
            }
        }

        (GenerationState::Phase(_, _), Event::Generate { .. }) => {
            Some(Row::internal(vec![Action::DeferGenerate]))
        }

        (GenerationState::Phase(phase, InvokeGetNext), Event::ServiceResponse(response)) => {
            if guards::is_outstanding(ctx, response.request_id) {
                Some(Row::to(
                    step(phase, GoNextFinalize),
                    vec![Action::AssignServiceResult],
                ))
            } else {
                debug!(request_id = response.request_id, "Ignoring stale provider reply");
                Some(Row::ignore())
            }
        }

        (_, Event::ServiceResponse(response)) => {
            debug!(request_id = response.request_id, "Ignoring unexpected provider reply");
            Some(Row::ignore())
        }

        _ => None,
    }
}

/// Eventless rows, evaluated until the region is stable.
pub fn always(state: GenerationState, ctx: &Context) -> Option<Row> {
    use GenerationStep::*;

    let GenerationState::Phase(phase, current) = state else {
        return None;
    };
    match current {
        Idle => {
            if guards::has_deferred(ctx) {
                Some(Row::to(
                    step(phase, GoNextBegin),
                    vec![Action::TakeDeferred, Action::GenDisableNav],
                ))
            } else if guards::needs_generate_again(ctx) {
                Some(Row::to(step(phase, GoNextBegin), vec![Action::GenDisableNav]))
            } else {
                None
            }
        }
        GoNextBegin => {
            if guards::has_candidate(ctx) {
                Some(Row::to(step(phase, GoNextFinalize), Vec::new()))
            } else {
                Some(Row::to(step(phase, GoNextNavigate), Vec::new()))
            }
        }
        GoNextNavigate => {
            if guards::is_suspended(ctx) {
                Some(Row::to(
                    step(phase, Idle),
                    vec![Action::ClearRetry, Action::RaiseGenerated],
                ))
            } else if guards::has_candidate(ctx) {
                Some(Row::to(step(phase, GoNextFinalize), Vec::new()))
            } else {
                Some(Row::to(step(phase, GoNextPull), Vec::new()))
            }
        }
        GoNextPull => {
            if guards::has_candidate(ctx)
                || phase != Phase::Activities
                || guards::provider_short_circuit(ctx)
            {
                Some(Row::to(step(phase, GoNextFinalize), Vec::new()))
            } else {
                Some(Row::to(step(phase, InvokeGetNext), Vec::new()))
            }
        }
        InvokeGetNext => None,
        GoNextFinalize => {
            if guards::has_candidate(ctx) {
                Some(Row::to(
                    step(phase, Idle),
                    vec![
                        Action::FinalizeCandidate,
                        Action::ClearRetry,
                        Action::RaiseGenerated,
                    ],
                ))
            } else {
                match phase.successor() {
                    Some(next) => Some(Row::to(step(next, GoNextBegin), Vec::new())),
                    None => Some(Row::to(
                        step(phase, Idle),
                        vec![Action::ClearRetry, Action::RaiseExhausted],
                    )),
                }
            }
        }
    }
}

/// Entry actions of a pipeline step.
pub fn entry(state: GenerationState) -> Vec<Action> {
    match state.step() {
        Some(GenerationStep::Idle) => vec![Action::ClearPicked, Action::GenEnableNav],
        Some(GenerationStep::GoNextBegin) => vec![Action::PickExplicitTarget],
        Some(GenerationStep::GoNextNavigate) => vec![Action::PullNavigationStack],
        Some(GenerationStep::GoNextPull) => vec![Action::QueryLocal],
        Some(GenerationStep::InvokeGetNext) => vec![Action::RequestNextItem],
        Some(GenerationStep::GoNextFinalize) | None => Vec::new(),
    }
}

pub fn exit(state: GenerationState) -> Vec<Action> {
    match state.step() {
        Some(GenerationStep::InvokeGetNext) => vec![Action::ClearOutstanding],
        _ => Vec::new(),
    }
}

/// Entry actions of a phase, run before the entered step's own.
pub fn phase_entry(phase: Phase) -> Vec<Action> {
    vec![Action::SetMode(phase), Action::UpdateBundle]
}
