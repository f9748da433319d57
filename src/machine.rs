//! The orchestrator: two parallel regions over one shared context.
//!
//! Every event is offered to the generation region, then the navigation
//! region; root handlers run only if neither consumed it. After each event,
//! eventless transitions of both regions are resolved until stable, and
//! raised internal events are drained before [`Orchestrator::dispatch`]
//! returns. Nothing is interleaved with a fresh external event.

pub mod actions;
pub mod effect;
pub mod event;
pub mod generation;
pub mod guards;
pub mod navigation;
pub mod root;
pub mod state;

pub use actions::Action;
pub use effect::{AnswerMetadata, ChildMessage, Effect};
pub use event::{Event, NavRequest};
pub use state::{GenerationState, GenerationStep, NavigationState, StateTag, TimerSubstate, Transition};

use crate::config::SessionConfig;
use crate::context::gates::NavGates;
use crate::context::Context;
use crate::fyd::FydConfig;
use crate::session::SessionArgs;
use crate::types::Phase;
use actions::{ActionEnv, Outbox};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const MAX_SETTLE_STEPS: usize = 256;

fn run_actions(actions: &[Action], ctx: &mut Context, env: &ActionEnv<'_>, out: &mut Outbox) {
    for action in actions {
        actions::apply(*action, ctx, env, out);
    }
}

/// Compact view of the machine for logs and replay output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generation: String,
    pub navigation: String,
    pub mode: Option<Phase>,
    pub activity: Option<String>,
    pub activity_index: Option<usize>,
    pub selected: Vec<String>,
    pub gates: NavGates,
    pub remaining_ms: Option<u64>,
    pub tags: Vec<StateTag>,
}

pub struct Orchestrator {
    context: Context,
    generation: GenerationState,
    navigation: NavigationState,
    settings: SessionConfig,
    fyd: FydConfig,
    outbox: Outbox,
    closed: bool,
}

impl Orchestrator {
    pub fn new(settings: SessionConfig, fyd: FydConfig) -> Self {
        let mut orchestrator = Self {
            context: Context::default(),
            generation: GenerationState::Uninitialized,
            navigation: NavigationState::Initial,
            settings,
            fyd,
            outbox: Outbox::default(),
            closed: false,
        };
        orchestrator.reset(SessionArgs::default());
        orchestrator
    }

    /// Process one external event to completion and return what it produced.
    pub fn dispatch(&mut self, event: Event, now: u64) -> Vec<Effect> {
        if self.closed {
            debug!(event = event.name(), "Session closed; ignoring event");
            return Vec::new();
        }
        self.process(event, now);
        while let Some(raised) = self.outbox.raised.pop_front() {
            if self.closed {
                break;
            }
            self.process(raised, now);
        }
        std::mem::take(&mut self.outbox.effects)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Direct access for seeding tests and replays.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn generation(&self) -> GenerationState {
        self.generation
    }

    pub fn navigation(&self) -> NavigationState {
        self.navigation
    }

    pub fn settings(&self) -> &SessionConfig {
        &self.settings
    }

    pub fn tags(&self) -> Vec<StateTag> {
        self.navigation.tags()
    }

    pub fn has_tag(&self, tag: StateTag) -> bool {
        self.tags().contains(&tag)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            generation: self.generation.to_string(),
            navigation: self.navigation.to_string(),
            mode: self.context.mode,
            activity: self.context.current().map(|a| a.key().to_string()),
            activity_index: self.context.activity_index,
            selected: self.context.selected.iter().map(|a| a.key().to_string()).collect(),
            gates: self.context.gates,
            remaining_ms: self.context.timer.remaining,
            tags: self.tags(),
        }
    }

    fn reset(&mut self, args: SessionArgs) {
        if self.navigation.timer() == Some(TimerSubstate::TimerReady) {
            self.outbox.emit(Effect::StopTicker);
        }
        let mut context = Context::new(args);
        context.fyd_config = self.fyd.clone();
        context.gates = NavGates::new(self.settings.nav_disabled_on_start);
        context.question_order = self.settings.question_order.clone();
        context.limit = self.settings.limit;
        self.context = context;
        self.generation = GenerationState::Uninitialized;
        self.navigation = NavigationState::Initial;
        self.outbox.raised.clear();
    }

    fn process(&mut self, event: Event, now: u64) {
        debug!(event = event.name(), generation = %self.generation, navigation = %self.navigation, "Processing event");
        if let Event::Load { args, .. } = &event {
            self.reset(args.clone());
        }

        let generation_row = generation::on_event(self.generation, &event, &self.context);
        let generation_consumed = generation_row.is_some();
        if let Some(row) = generation_row {
            self.take_generation(row, &event, now);
        }

        let navigation_row = navigation::on_event(self.navigation, &event, &self.context, now);
        let navigation_consumed = navigation_row.is_some();
        if let Some(row) = navigation_row {
            self.take_navigation(row, &event, now);
        }

        if !generation_consumed && !navigation_consumed {
            match root::on_event(&event) {
                Some(actions) => {
                    let env = ActionEnv {
                        now,
                        event: &event,
                        settings: &self.settings,
                    };
                    run_actions(&actions, &mut self.context, &env, &mut self.outbox);
                }
                None => debug!(event = event.name(), "Event not handled"),
            }
        }

        if let Event::Destroy { .. } = event {
            self.close();
        }

        self.settle(&event, now);
    }

    fn close(&mut self) {
        if self.navigation.timer() == Some(TimerSubstate::TimerReady) {
            self.outbox.emit(Effect::StopTicker);
        }
        self.outbox.raised.clear();
        self.closed = true;
        debug!("Session closed");
    }

    fn settle(&mut self, event: &Event, now: u64) {
        for _ in 0..MAX_SETTLE_STEPS {
            if self.closed {
                return;
            }
            let mut changed = false;
            if let Some(row) = generation::always(self.generation, &self.context) {
                self.take_generation(row, event, now);
                changed = true;
            }
            if let Some(row) = navigation::always(self.navigation, &self.context) {
                self.take_navigation(row, event, now);
                changed = true;
            }
            if !changed {
                return;
            }
        }
        warn!(
            generation = %self.generation,
            navigation = %self.navigation,
            "Eventless transitions did not settle"
        );
    }

    fn take_generation(&mut self, row: Transition<GenerationState>, event: &Event, now: u64) {
        let env = ActionEnv {
            now,
            event,
            settings: &self.settings,
        };
        let Some(target) = row.target else {
            run_actions(&row.actions, &mut self.context, &env, &mut self.outbox);
            return;
        };
        let source = self.generation;
        debug!(from = %source, to = %target, "Generation transition");
        run_actions(&generation::exit(source), &mut self.context, &env, &mut self.outbox);
        run_actions(&row.actions, &mut self.context, &env, &mut self.outbox);
        self.generation = target;
        if source.phase() != target.phase() {
            if let Some(phase) = target.phase() {
                run_actions(&generation::phase_entry(phase), &mut self.context, &env, &mut self.outbox);
            }
        }
        run_actions(&generation::entry(target), &mut self.context, &env, &mut self.outbox);
    }

    fn take_navigation(&mut self, row: Transition<NavigationState>, event: &Event, now: u64) {
        let env = ActionEnv {
            now,
            event,
            settings: &self.settings,
        };
        let Some(target) = row.target else {
            run_actions(&row.actions, &mut self.context, &env, &mut self.outbox);
            return;
        };
        let source = self.navigation;
        debug!(from = %source, to = %target, "Navigation transition");
        run_actions(&navigation::exit(source), &mut self.context, &env, &mut self.outbox);
        run_actions(&row.actions, &mut self.context, &env, &mut self.outbox);
        self.navigation = target;
        run_actions(&navigation::entry(target), &mut self.context, &env, &mut self.outbox);
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(SessionConfig::default(), FydConfig::default())
    }
}
