//! Synchronous, deterministic session driver for tests and replays.
//!
//! Time only moves when [`SessionHarness::advance`] is called; ticks are
//! delivered at exact interval boundaries. Provider requests are answered
//! inline by default, or queued for [`SessionHarness::respond`] when the
//! harness is built with [`SessionHarness::manual_provider`].

use crate::clock::{Clock, ManualClock};
use crate::config::SessionConfig;
use crate::context::answers::Answer;
use crate::children::ReturnPath;
use crate::error::SequencerError;
use crate::fyd::FydConfig;
use crate::machine::{Effect, Event, Orchestrator, Snapshot};
use crate::provider::{NextItemProvider, NextItemRequest, NextItemResponse, PoolProvider};
use crate::resolver::{self, ContentResolver, InMemoryResolver};
use crate::runtime::{NoopTeardown, TeardownHook};
use crate::session::SessionArgs;
use crate::types::ActivityRef;
use futures::executor::block_on;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
struct Ticker {
    interval_ms: u64,
    next_due: u64,
}

pub struct SessionHarness {
    orchestrator: Orchestrator,
    clock: ManualClock,
    provider: Arc<dyn NextItemProvider>,
    resolver: Arc<dyn ContentResolver>,
    teardown: Arc<dyn TeardownHook>,
    auto_respond: bool,
    pending: VecDeque<NextItemRequest>,
    ticker: Option<Ticker>,
    effects: Vec<Effect>,
    outbound: Vec<Effect>,
}

impl SessionHarness {
    pub fn new(settings: SessionConfig, fyd: FydConfig, resolver: Arc<dyn ContentResolver>) -> Self {
        Self {
            orchestrator: Orchestrator::new(settings, fyd),
            clock: ManualClock::new(0),
            provider: Arc::new(PoolProvider::new(Some(0))),
            resolver,
            teardown: Arc::new(NoopTeardown),
            auto_respond: true,
            pending: VecDeque::new(),
            ticker: None,
            effects: Vec::new(),
            outbound: Vec::new(),
        }
    }

    /// Harness over in-memory content with default settings.
    pub fn with_content(content: InMemoryResolver) -> Self {
        Self::new(SessionConfig::default(), FydConfig::default(), Arc::new(content))
    }

    pub fn with_provider(mut self, provider: Arc<dyn NextItemProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_teardown(mut self, teardown: Arc<dyn TeardownHook>) -> Self {
        self.teardown = teardown;
        self
    }

    pub fn starting_at(self, millis: u64) -> Self {
        self.clock.set(millis);
        self
    }

    /// Queue provider requests instead of answering them inline.
    pub fn manual_provider(mut self) -> Self {
        self.auto_respond = false;
        self
    }

    pub fn load(&mut self, args: SessionArgs) -> Vec<Effect> {
        self.send(Event::Load {
            args,
            force_goto: false,
        })
    }

    /// Dispatch an event at the current time and perform what it produced.
    /// Returns every effect emitted along the way, follow-ups included.
    pub fn send(&mut self, event: Event) -> Vec<Effect> {
        let mut produced = Vec::new();
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            let effects = self.orchestrator.dispatch(event, self.clock.now_millis());
            for effect in effects {
                if let Some(follow_up) = self.perform(&effect) {
                    pending.push_back(follow_up);
                }
                produced.push(effect);
            }
        }
        self.effects.extend(produced.iter().cloned());
        produced
    }

    /// Move time forward, delivering a `TICK` at every interval boundary
    /// crossed while the ticker runs.
    pub fn advance(&mut self, millis: u64) -> Vec<Effect> {
        let target = self.clock.now_millis().saturating_add(millis);
        let mut produced = Vec::new();
        while let Some(ticker) = self.ticker {
            if ticker.next_due > target {
                break;
            }
            self.clock.set(ticker.next_due);
            self.ticker = Some(Ticker {
                next_due: ticker.next_due + ticker.interval_ms,
                ..ticker
            });
            produced.extend(self.send(Event::Tick));
        }
        self.clock.set(target);
        produced
    }

    pub fn tick(&mut self) -> Vec<Effect> {
        self.send(Event::Tick)
    }

    /// Answer the oldest queued provider request.
    pub fn respond(&mut self, item: Option<ActivityRef>) -> Result<Vec<Effect>, SequencerError> {
        let request = self
            .pending
            .pop_front()
            .ok_or_else(|| SequencerError::Provider("No outstanding provider request".to_string()))?;
        Ok(self.send(Event::ServiceResponse(NextItemResponse {
            request_id: request.request_id,
            item,
        })))
    }

    /// Submit a sent answer for the current activity and deliver the reply.
    pub fn answer_current(&mut self, correct: bool) -> Result<Vec<Effect>, SequencerError> {
        let current = self.expect_current()?.clone();
        let answer = Answer::for_activity(&current).sent(correct, self.clock.now_millis());
        Ok(self.send(Event::SendReply {
            targets: ReturnPath::default(),
            answer,
        }))
    }

    pub fn expect_current(&self) -> Result<&ActivityRef, SequencerError> {
        self.orchestrator
            .context()
            .current()
            .ok_or(SequencerError::NoMoreActivities)
    }

    pub fn pending_requests(&self) -> &VecDeque<NextItemRequest> {
        &self.pending
    }

    pub fn ticker_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut Orchestrator {
        &mut self.orchestrator
    }

    pub fn snapshot(&self) -> Snapshot {
        self.orchestrator.snapshot()
    }

    /// Every effect emitted so far.
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Effects addressed outside the session.
    pub fn outbound(&self) -> &[Effect] {
        &self.outbound
    }

    pub fn take_outbound(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.outbound)
    }

    fn perform(&mut self, effect: &Effect) -> Option<Event> {
        match effect {
            Effect::Preload { args } => match resolver::preload(self.resolver.as_ref(), args) {
                Ok(data) => Some(Event::Preload(Box::new(data))),
                Err(e) => {
                    warn!(error = %e, "Preload failed; ending session");
                    Some(Event::FinalExit)
                }
            },
            Effect::RequestNextItem(request) if self.auto_respond => {
                let item = block_on(self.provider.next_item(request)).unwrap_or_else(|e| {
                    warn!(error = %e, "Provider failed; treating as empty response");
                    None
                });
                Some(Event::ServiceResponse(NextItemResponse {
                    request_id: request.request_id,
                    item,
                }))
            }
            Effect::RequestNextItem(request) => {
                debug!(request_id = request.request_id, "Queueing provider request");
                self.pending.push_back(request.clone());
                None
            }
            Effect::StartTeardown => {
                let error = block_on(self.teardown.teardown(self.orchestrator.snapshot()))
                    .err()
                    .map(|e| e.to_string());
                Some(Event::TeardownDone { error })
            }
            Effect::StartTicker { interval_ms } => {
                let interval_ms = (*interval_ms).max(1);
                self.ticker = Some(Ticker {
                    interval_ms,
                    next_due: self.clock.now_millis() + interval_ms,
                });
                None
            }
            Effect::StopTicker => {
                self.ticker = None;
                None
            }
            other => {
                self.outbound.push(other.clone());
                None
            }
        }
    }
}
