//! Named context transforms run by transitions.
//!
//! Actions are the only code that mutates a [`Context`]. They read the event
//! that triggered the transition from [`ActionEnv`], push outbound effects and
//! raise internal events through the [`Outbox`].

use super::effect::{AnswerMetadata, ChildMessage, Effect};
use super::event::Event;
use crate::children::NavCommand;
use crate::config::SessionConfig;
use crate::context::answers::{Answer, AnswerLog};
use crate::context::timer::SegmentTimer;
use crate::context::{views, Context, GenerateRequest};
use crate::fyd;
use crate::provider::NextItemRequest;
use crate::types::{ActivityRef, Freshness, Phase};
use crate::warning::WarningState;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Generation
    SetMode(Phase),
    UpdateBundle,
    ClearPicked,
    GenDisableNav,
    GenEnableNav,
    StoreGenerate,
    DeferGenerate,
    TakeDeferred,
    MarkRetry,
    ClearRetry,
    PickExplicitTarget,
    PullNavigationStack,
    QueryLocal,
    RequestNextItem,
    AssignServiceResult,
    ClearOutstanding,
    FinalizeCandidate,
    RaiseGenerated,
    RaiseExhausted,

    // Navigation
    RequestNext,
    RequestPrevious,
    AnnounceActivity,
    SelfDisableNav,
    SelfEnableNav,
    LockNavigation,
    AcknowledgeWarning,
    StartTimerSegment,
    StopTimerSegment,
    RefreshRemaining,
    SetTimedOut,
    BroadcastTimeout,
    ForwardToChild(NavCommand),
    SpliceFyd,
    MarkFydAsked,
    Cleanup,
    StartTeardown,
    LogTeardown,
    AnnounceFinished,

    // Root
    RequestPreload,
    Hydrate,
    RaiseGenerate { goto: bool },
    RaiseUpdate,
    RefreshPools,
    RegisterChild,
    UpdateChild,
    RemoveChild,
    DestroyChildren,
    SetChildNav(bool),
    RelayAnswer,
    RespondSend,
    UpdateAnswered,
    MarkExpired,
    RaiseFinalExit,
}

/// Inputs every action may read.
pub struct ActionEnv<'a> {
    pub now: u64,
    pub event: &'a Event,
    pub settings: &'a SessionConfig,
}

/// Where actions put what they produce.
#[derive(Debug, Default)]
pub struct Outbox {
    pub effects: Vec<Effect>,
    pub raised: VecDeque<Event>,
    next_request_id: u64,
}

impl Outbox {
    pub fn emit(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn raise(&mut self, event: Event) {
        self.raised.push_back(event);
    }

    fn allocate_request_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }
}

pub fn apply(action: Action, ctx: &mut Context, env: &ActionEnv<'_>, out: &mut Outbox) {
    match action {
        Action::SetMode(phase) => {
            ctx.mode = Some(phase);
            info!(phase = %phase, "Entering phase");
            out.emit(Effect::PhaseChanged { phase });
        }
        Action::UpdateBundle => update_bundle(ctx, out),
        Action::ClearPicked => {
            ctx.picked_next = None;
            ctx.picked_next_new = None;
        }
        Action::GenDisableNav => ctx.gates.nav_gen_disabled = true,
        Action::GenEnableNav => ctx.gates.nav_gen_disabled = false,
        Action::StoreGenerate => {
            if let Event::Generate { goto, target } = env.event {
                store_generate(ctx, *goto, target.clone());
            }
        }
        Action::DeferGenerate => {
            if let Event::Generate { goto, target } = env.event {
                let pending = ctx.deferred_generate.take();
                let merged = GenerateRequest {
                    goto: *goto || pending.as_ref().map(|p| p.goto).unwrap_or(false),
                    target: target.clone().or_else(|| pending.and_then(|p| p.target)),
                };
                debug!(goto = merged.goto, "Deferring regeneration request");
                ctx.deferred_generate = Some(merged);
            }
        }
        Action::TakeDeferred => {
            if let Some(request) = ctx.deferred_generate.take() {
                store_generate(ctx, request.goto, request.target);
            }
        }
        Action::MarkRetry => ctx.picked_next_retry = true,
        Action::ClearRetry => ctx.picked_next_retry = false,
        Action::PickExplicitTarget => {
            if let Some(target) = ctx.goto_target.take() {
                ctx.picked_next_new = Some(if ctx.is_selected(&target) {
                    Freshness::Navigation
                } else {
                    Freshness::NewNavigation
                });
                ctx.picked_next = Some(target);
            }
        }
        Action::PullNavigationStack => pull_navigation_stack(ctx),
        Action::QueryLocal => query_local(ctx),
        Action::RequestNextItem => request_next_item(ctx, out),
        Action::AssignServiceResult => {
            if let Event::ServiceResponse(response) = env.event {
                let item = response.item.as_ref().map(|item| {
                    ctx.resolve_link(&item.id)
                        .filter(|record| record.key() == item.key())
                        .map(|record| item.hydrate_from(&record))
                        .unwrap_or_else(|| item.clone())
                });
                ctx.picked_next_new = item.as_ref().map(|i| {
                    if ctx.is_selected(i) {
                        Freshness::Navigation
                    } else {
                        Freshness::New
                    }
                });
                debug!(found = item.is_some(), "Provider answered");
                ctx.picked_next = item;
            }
        }
        Action::ClearOutstanding => ctx.outstanding_request = None,
        Action::FinalizeCandidate => finalize_candidate(ctx),
        Action::RaiseGenerated => out.raise(Event::Generated {
            moved: ctx.generate_goto,
        }),
        Action::RaiseExhausted => out.raise(Event::Exhausted),

        Action::RequestNext => {
            let next = ctx.activity_index.map(|i| i + 1).unwrap_or(0);
            let target = ctx.selected.get(next).cloned();
            out.raise(Event::Generate { goto: true, target });
        }
        Action::RequestPrevious => {
            let target = ctx
                .activity_index
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| ctx.selected.get(i))
                .cloned();
            if target.is_some() {
                out.raise(Event::Generate { goto: true, target });
            }
        }
        Action::AnnounceActivity => {
            ctx.gates.nav_disabled = env.settings.nav_disabled_on_start;
            ctx.timer.reset_for_activity();
            if let (Some(activity), Some(index)) = (ctx.current().cloned(), ctx.activity_index) {
                info!(activity = %activity.key(), index, "Showing activity");
                out.emit(Effect::ActivityChanged { activity, index });
            }
        }
        Action::SelfDisableNav => ctx.gates.nav_self_disabled = true,
        Action::SelfEnableNav => ctx.gates.nav_self_disabled = false,
        Action::LockNavigation => {
            ctx.gates.nav_self_disabled = true;
            ctx.gates.nav_gen_disabled = true;
        }
        Action::AcknowledgeWarning => {
            let current = ctx.current().cloned();
            ctx.warning.acknowledge(current.as_ref(), &ctx.timer);
        }
        Action::StartTimerSegment => {
            ctx.timer.start_segment(env.now);
            ctx.timer.refresh_remaining(env.now);
            out.emit(Effect::StartTicker {
                interval_ms: env.settings.tick_interval_ms,
            });
        }
        Action::StopTimerSegment => {
            ctx.timer.stop_segment(env.now);
            ctx.timer.refresh_remaining(env.now);
            out.emit(Effect::StopTicker);
        }
        Action::RefreshRemaining => ctx.timer.refresh_remaining(env.now),
        Action::SetTimedOut => ctx.timer.set_timed_out(),
        Action::BroadcastTimeout => {
            info!(children = ctx.children.len(), "Broadcasting timeout");
            out.emit(Effect::BroadcastTimeout {
                session_ids: ctx.children.session_ids(),
            });
        }
        Action::ForwardToChild(command) => {
            let child = ctx
                .current()
                .and_then(|a| ctx.children.get(&a.key().to_string()));
            if let Some(child) = child {
                let message = match command {
                    NavCommand::Next => ChildMessage::Next,
                    NavCommand::Previous => ChildMessage::Previous,
                    NavCommand::Exit => ChildMessage::Exit,
                };
                debug!(session = %child.session_id, ?command, "Forwarding to child");
                out.emit(Effect::ToChild {
                    session_id: child.session_id.clone(),
                    message,
                });
            }
        }
        Action::SpliceFyd => splice_fyd(ctx, env.now),
        Action::MarkFydAsked => {
            ctx.fyd_last_asked = Some(ctx.answers.sent_count());
            ctx.fyd_last_asked_time = Some(env.now);
        }
        Action::Cleanup => {
            ctx.deferred_generate = None;
            ctx.outstanding_request = None;
            ctx.goto_target = None;
        }
        Action::StartTeardown => out.emit(Effect::StartTeardown),
        Action::LogTeardown => {
            if let Event::TeardownDone { error: Some(error) } = env.event {
                warn!(%error, "Teardown failed; finishing anyway");
            }
        }
        Action::AnnounceFinished => {
            ctx.finished = true;
            info!(
                selected = ctx.selected.len(),
                grade = ctx.answers.grade(),
                "Session finished"
            );
            out.emit(Effect::SessionFinished);
        }

        Action::RequestPreload => out.emit(Effect::Preload {
            args: ctx.args.clone(),
        }),
        Action::Hydrate => {
            if let Event::Preload(data) = env.event {
                hydrate(ctx, data, env.settings);
            }
        }
        Action::RaiseGenerate { goto } => out.raise(Event::Generate { goto, target: None }),
        Action::RaiseUpdate => out.raise(Event::Generate {
            goto: ctx.activity_index.is_none(),
            target: None,
        }),
        Action::RefreshPools => ctx.refresh_available(),
        Action::RegisterChild => {
            if let Event::Launch { handle } = env.event {
                debug!(activity = %handle.activity_id, session = %handle.session_id, "Child launched");
                ctx.children.register(handle.clone());
            }
        }
        Action::UpdateChild => {
            if let Event::ChildUpdate {
                activity_id,
                capabilities,
            } = env.event
            {
                if let Err(err) = ctx.children.update(activity_id, capabilities.clone()) {
                    warn!(%err, "Ignoring capability update");
                }
            }
        }
        Action::RemoveChild => {
            if let Event::Kill { activity_id } = env.event {
                ctx.children.remove(activity_id);
            }
        }
        Action::DestroyChildren => {
            if let Event::Destroy { session_ids } = env.event {
                out.emit(Effect::DestroyChildren {
                    session_ids: session_ids.clone(),
                });
            }
            ctx.children.clear();
        }
        Action::SetChildNav(disabled) => ctx.gates.nav_disabled = disabled,
        Action::RelayAnswer => {
            if let Event::Send { answer } = env.event {
                let activity = ctx.current().cloned();
                let metadata = AnswerMetadata {
                    lesson: ctx.lesson_key(),
                    question_number: activity
                        .as_ref()
                        .and_then(|a| views::question_number(ctx, a)),
                    activity,
                    activity_index: ctx.activity_index,
                    mode: ctx.mode,
                };
                out.emit(Effect::SendParent {
                    answer: answer.clone(),
                    metadata,
                });
            }
        }
        Action::RespondSend => {
            if let Event::SendReply { targets, answer } = env.event {
                let mut targets = targets.clone();
                if let Some(hop) = targets.pop_hop() {
                    debug!(hop = %hop.id, remaining = targets.len(), "Routing reply");
                    out.emit(Effect::ToChild {
                        session_id: hop.id,
                        message: ChildMessage::SendReply {
                            targets,
                            answer: answer.clone(),
                        },
                    });
                }
            }
        }
        Action::UpdateAnswered => {
            if let Event::SendReply { answer, .. } = env.event {
                update_answered(ctx, answer.clone(), env.now);
            }
        }
        Action::MarkExpired => ctx.expired = true,
        Action::RaiseFinalExit => out.raise(Event::FinalExit),
    }
}

fn store_generate(ctx: &mut Context, goto: bool, target: Option<ActivityRef>) {
    ctx.generate_goto = goto;
    ctx.goto_target = target;
    if goto {
        ctx.picked_next_retry = true;
    }
}

fn update_bundle(ctx: &Context, out: &mut Outbox) {
    if let Some(mode) = ctx.mode {
        out.emit(Effect::UpdateBundle {
            lesson: ctx.lesson_key(),
            mode,
            limit: ctx.limit,
        });
    }
}

fn pull_navigation_stack(ctx: &mut Context) {
    if ctx.picked_next.is_some() {
        return;
    }
    let resume = std::mem::take(&mut ctx.resume_current);
    while let Some(forced) = ctx.navigation_stack.pop_front() {
        match ctx.position_of(&forced) {
            Some(index) if ctx.generate_goto => {
                ctx.set_position(Some(index));
                ctx.picked_next_new = Some(Freshness::Suspend);
                return;
            }
            Some(_) => continue,
            None => {
                ctx.picked_next = Some(forced);
                ctx.picked_next_new = Some(Freshness::NewNavigation);
                return;
            }
        }
    }
    if resume && ctx.current().is_some() && !ctx.current_answered() {
        ctx.picked_next_new = Some(Freshness::Suspend);
    }
}

fn query_local(ctx: &mut Context) {
    if ctx.picked_next.is_some() {
        return;
    }
    let phase = ctx.mode.unwrap_or(Phase::Activities);
    if phase != Phase::Activities {
        if let Some(item) = ctx.first_unselected(phase) {
            ctx.picked_next = Some(item);
            ctx.picked_next_new = Some(Freshness::New);
        }
        return;
    }

    if ctx.generate_goto {
        let next = ctx.activity_index.map(|i| i + 1).unwrap_or(0);
        if let Some(queued) = ctx.selected.get(next).cloned() {
            ctx.picked_next = Some(queued);
            ctx.picked_next_new = Some(Freshness::Navigation);
            return;
        }
    }

    let quota_item = ctx
        .selection_queries
        .iter()
        .filter(|q| ctx.selected_with_tag(&q.tag) < q.count)
        .find_map(|q| {
            ctx.pool(Phase::Activities)
                .find(|a| a.has_tag(&q.tag) && !ctx.is_selected(a))
                .cloned()
        });
    if let Some(item) = quota_item {
        ctx.picked_next = Some(item);
        ctx.picked_next_new = Some(Freshness::New);
    }
}

fn request_next_item(ctx: &mut Context, out: &mut Outbox) {
    let request_id = out.allocate_request_id();
    ctx.outstanding_request = Some(request_id);
    let request = NextItemRequest {
        request_id,
        limit: ctx.limit,
        question_order: ctx.question_order.clone(),
        selected: ctx.selected.clone(),
        available: ctx.available.clone(),
        remaining: ctx.remaining_collection(),
        current: ctx.current().cloned(),
        activity_filter: ctx.args.activity_filter.clone(),
    };
    debug!(request_id, available = request.available.len(), "Requesting next item");
    out.emit(Effect::RequestNextItem(request));
}

fn finalize_candidate(ctx: &mut Context) {
    let Some(mut candidate) = ctx.picked_next.take() else {
        return;
    };
    let goto = ctx.generate_goto;

    if let Some(index) = ctx.position_of(&candidate) {
        if goto {
            ctx.set_position(Some(index));
        }
        debug!(activity = %candidate.key(), index, goto, "Candidate already queued");
        return;
    }

    if ctx.picked_next_new == Some(Freshness::New) {
        if let Some(first) = ctx.ask_before_for(&candidate) {
            debug!(activity = %first.key(), before = %candidate.key(), "Asking prerequisite first");
            ctx.navigation_stack.push_front(candidate);
            candidate = first;
        }
    }

    let ask_after = candidate.ask_after.clone();
    ctx.selected.push(candidate);
    if goto || ctx.activity_index.is_none() {
        ctx.set_position(Some(ctx.selected.len() - 1));
    }
    if let Some(after) = ask_after {
        ctx.push_forced(&after);
    }
    ctx.refresh_available();
    debug!(
        selected = ctx.selected.len(),
        index = ?ctx.activity_index,
        goto,
        "Candidate finalized"
    );
}

fn splice_fyd(ctx: &mut Context, now: u64) {
    let picks = fyd::pick_fyd_activities(ctx, now);
    let removed = ctx.selected.pop();
    debug!(removed = ?removed.map(|a| a.key().to_string()), "Replacing last selected item");
    // The position must stay inside the shortened list so `goNext` lands on
    // the first pick.
    ctx.clamp_position();
    info!(count = picks.len(), "Inserting FYD activities");
    ctx.selected.extend(picks);
    ctx.refresh_available();
}

fn update_answered(ctx: &mut Context, mut answer: Answer, now: u64) {
    answer.sent = true;
    if answer.answered_at_millis.is_none() {
        answer.answered_at_millis = Some(now);
    }
    let current = ctx.current().cloned();
    let for_current = current.as_ref().map(|c| answer.matches(c)).unwrap_or(false);
    let correct = current
        .as_ref()
        .map(|c| answer.is_correct_with(c.success_threshold()))
        .unwrap_or_else(|| answer.is_correct());
    ctx.answers.record(answer);

    if let (true, true, Some(current)) = (for_current, correct, current) {
        if let Some(next) = current.success_after.as_deref() {
            ctx.push_forced(next);
        }
    }
}

fn hydrate(ctx: &mut Context, data: &crate::resolver::PreloadData, settings: &SessionConfig) {
    ctx.lesson = data.lesson.clone();
    ctx.activities = data.activities.clone();
    ctx.collection_activities = data.collection_activities.clone();
    ctx.selection_queries = data.selection_queries.clone();
    ctx.links = data.links.clone();
    ctx.answers = AnswerLog::new(data.answers.clone());
    ctx.selected = data.selected.clone();

    let lesson = data.lesson.as_ref();
    ctx.limit = lesson.and_then(|l| l.limit).or(settings.limit);
    ctx.question_order = lesson
        .and_then(|l| l.question_order.clone())
        .unwrap_or_else(|| settings.question_order.clone());
    ctx.timer = match lesson.and_then(|l| l.timer.as_ref()) {
        Some(timer) => SegmentTimer::new(timer.timer_type, timer.scope, timer.duration_secs),
        None => SegmentTimer::new(settings.timer_type, settings.timer_scope, settings.duration_secs),
    };
    ctx.warning = WarningState::new(
        lesson
            .and_then(|l| l.warning_mode)
            .unwrap_or(settings.warning_mode),
    );

    if ctx.selected.is_empty() {
        ctx.set_position(None);
        if let Some(first) = lesson.and_then(|l| l.ask_before.clone()) {
            ctx.push_forced(&first);
        }
    } else {
        let resume_at = ctx
            .selected
            .iter()
            .position(|a| !ctx.answers.is_answered(a))
            .unwrap_or(ctx.selected.len() - 1);
        ctx.set_position(Some(resume_at));
        ctx.resume_current = true;
    }
    ctx.refresh_available();
    info!(
        lesson = %ctx.lesson_key(),
        activities = ctx.activities.len(),
        resumed = ctx.selected.len(),
        limit = ?ctx.limit,
        "Session hydrated"
    );
}
