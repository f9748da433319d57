//! Pure transition predicates.

use super::event::{Event, NavRequest};
use crate::children::NavCommand;
use crate::context::Context;
use crate::fyd;
use crate::types::{Freshness, Phase};
use crate::warning::resolve_should_warn;

/// Session is over: flagged, lesson closed, or session countdown spent.
pub fn is_expired(ctx: &Context, now: u64) -> bool {
    ctx.expired
        || ctx
            .lesson
            .as_ref()
            .and_then(|l| l.end_millis)
            .map(|end| end <= now)
            .unwrap_or(false)
        || ctx.timer.session_expired(now)
}

pub fn has_next(ctx: &Context, from_child: bool) -> bool {
    if !ctx.gates.permits(from_child) {
        return false;
    }
    let next = ctx.activity_index.map(|i| i + 1).unwrap_or(0);
    next < ctx.selected.len()
        || matches!(ctx.mode, Some(mode) if mode != Phase::Finished)
}

pub fn has_previous(ctx: &Context, from_child: bool) -> bool {
    ctx.gates.permits(from_child) && ctx.activity_index.map(|i| i > 0).unwrap_or(false)
}

pub fn has_exit(ctx: &Context, from_child: bool) -> bool {
    ctx.gates.permits(from_child)
}

/// The current activity's child claims the command for itself.
pub fn child_can_handle(ctx: &Context, command: NavCommand) -> bool {
    ctx.current()
        .and_then(|a| ctx.children.get(&a.key().to_string()))
        .map(|child| child.can_handle(command))
        .unwrap_or(false)
}

/// Hand the command to the current child. Conditional (`only_if`) commands
/// reach the child only while every gate is open.
pub fn should_forward(ctx: &Context, request: NavRequest) -> bool {
    !request.from_child
        && child_can_handle(ctx, request.command)
        && !(request.only_if && ctx.gates.blocked())
}

pub fn has_finished(ctx: &Context) -> bool {
    ctx.current_answered()
}

pub fn can_start_timer(ctx: &Context, now: u64) -> bool {
    ctx.timer.can_start(now) && !is_expired(ctx, now)
}

pub fn can_ui_stop(ctx: &Context) -> bool {
    ctx.timer.can_ui_stop()
}

/// Activity-scoped countdown ran out without ending the session.
pub fn activity_timed_out(ctx: &Context, now: u64) -> bool {
    ctx.timer.has_timer() && ctx.timer.did_timeout(now)
}

pub fn should_warn(ctx: &Context) -> bool {
    !resolve_should_warn(ctx.warning.mode, ctx.current(), &ctx.timer, &ctx.warning.shown).is_empty()
}

pub fn should_fyd_antagonize(ctx: &Context, now: u64) -> bool {
    fyd::should_fyd_antagonize(ctx, now)
}

/// The position is at (or past) the end of `selected` and the cap allows more.
fn at_sequence_end(ctx: &Context) -> bool {
    let at_end = match ctx.activity_index {
        Some(i) => i + 1 >= ctx.selected.len(),
        None => true,
    };
    at_end && ctx.limit.map(|l| l > ctx.selected.len()).unwrap_or(true)
}

pub fn needs_generate(ctx: &Context, event: Option<&Event>) -> bool {
    match event {
        Some(Event::Generate { goto: true, .. }) => true,
        _ => at_sequence_end(ctx),
    }
}

/// Idle was re-entered with a retry pending that nothing else will serve.
pub fn needs_generate_again(ctx: &Context) -> bool {
    ctx.picked_next_retry
        && ctx
            .selected
            .last()
            .map(|a| a.success_after.is_none())
            .unwrap_or(true)
        && needs_generate(ctx, None)
}

pub fn has_candidate(ctx: &Context) -> bool {
    ctx.picked_next.is_some()
}

pub fn is_suspended(ctx: &Context) -> bool {
    ctx.picked_next_new == Some(Freshness::Suspend)
}

/// Provider queries are pointless: cap reached or sequence closed.
pub fn provider_short_circuit(ctx: &Context) -> bool {
    ctx.limit_reached() || ctx.sequence_closed
}

pub fn has_deferred(ctx: &Context) -> bool {
    ctx.deferred_generate.is_some()
}

pub fn is_outstanding(ctx: &Context, request_id: u64) -> bool {
    ctx.outstanding_request == Some(request_id)
}
