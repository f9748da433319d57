//! Navigation region: presents the current activity and routes commands.
//!
//! `NEXT` / `PREVIOUS` / `EXIT` are resolved in priority order: session
//! expiry, then (for `NEXT`) the FYD antagonizer, then the current child if it
//! claims the command, then the local capability guard. The navigation gates
//! only bind the local move and conditional forwards.

use super::actions::Action;
use super::event::{Event, NavRequest};
use super::guards;
use super::state::{NavigationState, TimerSubstate, Transition};
use crate::children::NavCommand;
use crate::context::Context;
use tracing::debug;

type Row = Transition<NavigationState>;

const STOPPED: NavigationState = NavigationState::Activity(TimerSubstate::TimerStopped);

fn to_final(actions: Vec<Action>) -> Row {
    Row::to(NavigationState::Final, actions)
}

fn route_command(request: NavRequest, ctx: &Context, now: u64) -> Row {
    let NavRequest {
        command, from_child, ..
    } = request;
    if guards::is_expired(ctx, now) {
        return to_final(vec![Action::BroadcastTimeout]);
    }
    if command == NavCommand::Next && guards::should_fyd_antagonize(ctx, now) {
        return Row::to(NavigationState::ShowFydAntagonizer, Vec::new());
    }
    if guards::should_forward(ctx, request) {
        return Row::internal(vec![Action::ForwardToChild(command)]);
    }
    match command {
        NavCommand::Next if guards::has_next(ctx, from_child) => Row::to(NavigationState::GoNext, Vec::new()),
        NavCommand::Previous if guards::has_previous(ctx, from_child) => {
            Row::to(NavigationState::GoPrevious, Vec::new())
        }
        NavCommand::Exit if guards::has_exit(ctx, from_child) => to_final(Vec::new()),
        _ => {
            debug!(?command, gates = ?ctx.gates, "Navigation blocked or unavailable");
            Row::ignore()
        }
    }
}

fn on_tick(ctx: &Context, now: u64) -> Row {
    if guards::is_expired(ctx, now) {
        to_final(vec![Action::SetTimedOut, Action::BroadcastTimeout])
    } else {
        Row::ignore()
    }
}

/// Event-driven rows. `None` means the region does not consume the event.
pub fn on_event(state: NavigationState, event: &Event, ctx: &Context, now: u64) -> Option<Row> {
    use NavigationState::*;

    if state.is_terminal() {
        return match (state, event) {
            (Final, Event::TeardownDone { .. }) => Some(Row::to(
                Finished,
                vec![Action::SelfEnableNav, Action::LogTeardown],
            )),
            (_, Event::Next { .. } | Event::Previous { .. } | Event::Exit { .. })
            | (_, Event::FinalExit | Event::Tick | Event::Continue | Event::Ready) => Some(Row::ignore()),
            _ => None,
        };
    }

    if let Event::FinalExit = event {
        return Some(to_final(Vec::new()));
    }

    match (state, event) {
        (Initial | GoNext | GoPrevious, Event::Generated { moved: true }) => {
            Some(Row::to(ShowWarning, Vec::new()))
        }
        (Initial | GoNext | GoPrevious, Event::Exhausted) => Some(Row::to(STOPPED, Vec::new())),
        (Initial, Event::Exit { .. }) => Some(to_final(Vec::new())),

        (ShowWarning, Event::ShowedWarning) => Some(Row::to(
            STOPPED,
            vec![Action::AcknowledgeWarning, Action::SelfEnableNav],
        )),
        (ShowWarning, Event::Exit { .. }) => {
            let forward = event
                .nav_command()
                .map(|request| guards::should_forward(ctx, request))
                .unwrap_or(false);
            if forward {
                Some(Row::to(
                    STOPPED,
                    vec![Action::ForwardToChild(NavCommand::Exit), Action::SelfEnableNav],
                ))
            } else {
                Some(to_final(Vec::new()))
            }
        }

        (ShowFydAntagonizer, Event::HandleFyd { ask_fyd_questions }) => {
            let mut actions = Vec::new();
            if *ask_fyd_questions {
                actions.push(Action::SpliceFyd);
            }
            actions.extend([Action::MarkFydAsked, Action::SelfEnableNav]);
            Some(Row::to(GoNext, actions))
        }
        (ShowFydAntagonizer, Event::Exit { .. }) => Some(to_final(Vec::new())),

        (Activity(sub), _) => on_activity_event(sub, event, ctx, now),

        _ => None,
    }
}

fn on_activity_event(sub: TimerSubstate, event: &Event, ctx: &Context, now: u64) -> Option<Row> {
    use TimerSubstate::*;

    if let Some(request) = event.nav_command() {
        return Some(route_command(request, ctx, now));
    }

    match (sub, event) {
        (_, Event::Generated { moved: true }) => Some(Row::to(NavigationState::ShowWarning, Vec::new())),
        (_, Event::Continue) => {
            if guards::has_finished(ctx) {
                Some(Row::to(NavigationState::GoNext, Vec::new()))
            } else {
                Some(Row::ignore())
            }
        }
        (TimerStopped, Event::Ready | Event::ResumeTimer) => {
            if guards::can_start_timer(ctx, now) {
                Some(Row::to(NavigationState::Activity(TimerReady), Vec::new()))
            } else {
                Some(Row::ignore())
            }
        }
        (TimerReady, Event::Tick) => {
            if guards::is_expired(ctx, now) {
                Some(to_final(vec![Action::SetTimedOut, Action::BroadcastTimeout]))
            } else if guards::activity_timed_out(ctx, now) {
                Some(Row::to(
                    NavigationState::Activity(TimerStopped),
                    vec![Action::SetTimedOut, Action::BroadcastTimeout],
                ))
            } else {
                Some(Row::internal(vec![Action::RefreshRemaining]))
            }
        }
        (TimerReady, Event::PauseTimer) => {
            if guards::can_ui_stop(ctx) {
                Some(Row::to(NavigationState::Activity(TimerStopped), Vec::new()))
            } else {
                Some(Row::ignore())
            }
        }
        (_, Event::Tick) => Some(on_tick(ctx, now)),
        _ => None,
    }
}

/// Eventless rows, evaluated until the region is stable.
pub fn always(state: NavigationState, ctx: &Context) -> Option<Row> {
    match state {
        NavigationState::ShowWarning if !guards::should_warn(ctx) => {
            Some(Row::to(STOPPED, vec![Action::SelfEnableNav]))
        }
        NavigationState::Activity(TimerSubstate::TimerStopped | TimerSubstate::TimerReady)
            if guards::has_finished(ctx) =>
        {
            Some(Row::to(NavigationState::Activity(TimerSubstate::Completed), Vec::new()))
        }
        _ => None,
    }
}

pub fn entry(state: NavigationState) -> Vec<Action> {
    match state {
        NavigationState::ShowWarning => vec![Action::AnnounceActivity, Action::SelfDisableNav],
        NavigationState::Activity(TimerSubstate::TimerReady) => vec![Action::StartTimerSegment],
        NavigationState::GoNext => vec![Action::RequestNext],
        NavigationState::GoPrevious => vec![Action::RequestPrevious],
        NavigationState::ShowFydAntagonizer => vec![Action::SelfDisableNav],
        NavigationState::Final => vec![Action::LockNavigation, Action::Cleanup, Action::StartTeardown],
        NavigationState::Finished => vec![Action::AnnounceFinished],
        _ => Vec::new(),
    }
}

pub fn exit(state: NavigationState) -> Vec<Action> {
    match state {
        NavigationState::Activity(TimerSubstate::TimerReady) => vec![Action::StopTimerSegment],
        _ => Vec::new(),
    }
}
