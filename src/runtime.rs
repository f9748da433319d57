//! Async session driver.
//!
//! [`SessionRuntime`] owns one [`Orchestrator`] and performs the effects it
//! emits: content preload, provider requests, the tick timer and teardown.
//! Everything addressed to the outside world (children, parent, bundle,
//! notifications) is forwarded on the outbound channel. Events are processed
//! one at a time in arrival order; provider replies and teardown completions
//! re-enter through the same channel.

mod hooks;
mod ticker;

pub use hooks::{NoopTeardown, TeardownHook};
pub use ticker::TickerManager;

use crate::clock::{Clock, SystemClock};
use crate::error::SequencerError;
use crate::machine::{Effect, Event, NavigationState, Orchestrator};
use crate::provider::{NextItemProvider, NextItemRequest, NextItemResponse};
use crate::resolver::{self, ContentResolver};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Sends external events into a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<Event>,
}

impl SessionHandle {
    pub fn send(&self, event: Event) -> Result<(), SequencerError> {
        self.events
            .send(event)
            .map_err(|_| SequencerError::SessionClosed)
    }
}

pub struct SessionRuntime {
    orchestrator: Orchestrator,
    provider: Arc<dyn NextItemProvider>,
    resolver: Arc<dyn ContentResolver>,
    teardown: Arc<dyn TeardownHook>,
    clock: Arc<dyn Clock>,
    ticker: TickerManager,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    outbound: mpsc::UnboundedSender<Effect>,
}

impl SessionRuntime {
    pub fn new(
        orchestrator: Orchestrator,
        provider: Arc<dyn NextItemProvider>,
        resolver: Arc<dyn ContentResolver>,
        outbound: mpsc::UnboundedSender<Effect>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            orchestrator,
            provider,
            resolver,
            teardown: Arc::new(NoopTeardown),
            clock: Arc::new(SystemClock),
            ticker: TickerManager::new(events_tx.clone()),
            events_tx,
            events_rx,
            outbound,
        }
    }

    pub fn with_teardown(mut self, teardown: Arc<dyn TeardownHook>) -> Self {
        self.teardown = teardown;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            events: self.events_tx.clone(),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Process events until the session is destroyed or has finished, then
    /// hand the orchestrator back for inspection.
    pub async fn run(mut self) -> Orchestrator {
        info!(provider = self.provider.provider_name(), "Session runtime started");
        while let Some(event) = self.events_rx.recv().await {
            self.step(event);
            if self.orchestrator.is_closed() || self.orchestrator.navigation() == NavigationState::Finished {
                break;
            }
        }
        self.ticker.stop();
        info!(
            closed = self.orchestrator.is_closed(),
            navigation = %self.orchestrator.navigation(),
            "Session runtime stopped"
        );
        self.orchestrator
    }

    /// Dispatch one event, plus any follow-up events that effects produce
    /// synchronously.
    fn step(&mut self, event: Event) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            let now = self.clock.now_millis();
            let effects = self.orchestrator.dispatch(event, now);
            for effect in effects {
                if let Some(follow_up) = self.perform(effect) {
                    pending.push_back(follow_up);
                }
            }
        }
    }

    fn perform(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::Preload { args } => match resolver::preload(self.resolver.as_ref(), &args) {
                Ok(data) => Some(Event::Preload(Box::new(data))),
                Err(e) => {
                    warn!(error = %e, lesson = %args.lesson, "Preload failed; ending session");
                    Some(Event::FinalExit)
                }
            },
            Effect::RequestNextItem(request) => {
                self.spawn_provider(request);
                None
            }
            Effect::StartTeardown => {
                self.spawn_teardown();
                None
            }
            Effect::StartTicker { interval_ms } => {
                self.ticker.start(Duration::from_millis(interval_ms.max(1)));
                None
            }
            Effect::StopTicker => {
                self.ticker.stop();
                None
            }
            other => {
                if self.outbound.send(other).is_err() {
                    debug!("Outbound receiver dropped");
                }
                None
            }
        }
    }

    fn spawn_provider(&self, request: NextItemRequest) {
        let provider = Arc::clone(&self.provider);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let item = match provider.next_item(&request).await {
                Ok(item) => item,
                Err(e) => {
                    warn!(
                        provider = provider.provider_name(),
                        request_id = request.request_id,
                        error = %e,
                        "Provider failed; treating as empty response"
                    );
                    None
                }
            };
            let response = NextItemResponse {
                request_id: request.request_id,
                item,
            };
            // The session may already be gone.
            let _ = events.send(Event::ServiceResponse(response));
        });
    }

    fn spawn_teardown(&self) {
        let teardown = Arc::clone(&self.teardown);
        let events = self.events_tx.clone();
        let snapshot = self.orchestrator.snapshot();
        tokio::spawn(async move {
            let error = teardown.teardown(snapshot).await.err().map(|e| e.to_string());
            let _ = events.send(Event::TeardownDone { error });
        });
    }
}
