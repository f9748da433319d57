//! Periodic `TICK` delivery for running timer segments.
//!
//! The ticker is a tokio task that sends [`Event::Tick`] into the session's
//! event channel at a fixed interval until it is stopped.

use crate::machine::Event;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

pub struct TickerManager {
    handle: Option<JoinHandle<()>>,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl TickerManager {
    pub fn new(event_tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            handle: None,
            event_tx,
        }
    }

    /// Start ticking every `period`. A running ticker is replaced.
    pub fn start(&mut self, period: Duration) {
        self.stop();

        let event_tx = self.event_tx.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                trace!("Ticker fired");
                if event_tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        self.handle = Some(handle);
        debug!(?period, "Ticker started");
    }

    /// Stop the ticker. No-op when it is not running.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Ticker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for TickerManager {
    fn drop(&mut self) {
        self.stop();
    }
}
