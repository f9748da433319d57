//! The tokio runtime driving a session against real time.

use super::test_utils::*;
use activity_sequencer::config::SessionConfig;
use activity_sequencer::error::SequencerError;
use activity_sequencer::fyd::FydConfig;
use activity_sequencer::machine::{Effect, Event, NavigationState, Orchestrator};
use activity_sequencer::provider::{NextItemProvider, NextItemRequest, PoolProvider};
use activity_sequencer::runtime::SessionRuntime;
use activity_sequencer::types::{ActivityRef, TimerScope, TimerType};
use activity_sequencer::warning::WarningMode;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

struct SlowProvider {
    delay: Duration,
    inner: PoolProvider,
}

#[async_trait]
impl NextItemProvider for SlowProvider {
    async fn next_item(&self, request: &NextItemRequest) -> Result<Option<ActivityRef>, SequencerError> {
        tokio::time::sleep(self.delay).await;
        self.inner.next_item(request).await
    }

    fn provider_name(&self) -> &str {
        "slow"
    }
}

fn start(
    settings: SessionConfig,
    provider: Arc<dyn NextItemProvider>,
) -> (
    activity_sequencer::SessionHandle,
    tokio::task::JoinHandle<Orchestrator>,
    mpsc::UnboundedReceiver<Effect>,
) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let runtime = SessionRuntime::new(
        Orchestrator::new(settings, FydConfig::default()),
        provider,
        Arc::new(lesson_content(&["q1", "q2"])),
        outbound_tx,
    );
    let handle = runtime.handle();
    (handle, tokio::spawn(runtime.run()), outbound_rx)
}

async fn wait_for<F>(outbound: &mut mpsc::UnboundedReceiver<Effect>, mut predicate: F) -> Effect
where
    F: FnMut(&Effect) -> bool,
{
    loop {
        let effect = tokio::time::timeout(Duration::from_secs(3), outbound.recv())
            .await
            .expect("timed out waiting for effect")
            .expect("outbound channel closed");
        if predicate(&effect) {
            return effect;
        }
    }
}

#[tokio::test]
async fn test_session_countdown_runs_out_in_real_time() {
    let settings = SessionConfig {
        timer_type: TimerType::Countdown,
        timer_scope: TimerScope::Session,
        duration_secs: Some(1),
        tick_interval_ms: 50,
        warning_mode: WarningMode::Never,
        ..settings()
    };
    let (handle, task, mut outbound) = start(settings, Arc::new(PoolProvider::new(Some(1))));

    handle
        .send(Event::Load {
            args: args(),
            force_goto: false,
        })
        .unwrap();
    wait_for(&mut outbound, |e| matches!(e, Effect::ActivityChanged { .. })).await;
    handle.send(Event::Ready).unwrap();

    wait_for(&mut outbound, |e| matches!(e, Effect::BroadcastTimeout { .. })).await;
    let orchestrator = tokio::time::timeout(Duration::from_secs(3), task)
        .await
        .expect("runtime did not stop")
        .unwrap();
    assert_eq!(orchestrator.navigation(), NavigationState::Finished);
    assert!(orchestrator.context().timer.timed_out);
}

#[tokio::test]
async fn test_commands_during_slow_provider_are_queued_in_order() {
    let provider = SlowProvider {
        delay: Duration::from_millis(50),
        inner: PoolProvider::new(Some(1)),
    };
    let (handle, task, mut outbound) = start(settings(), Arc::new(provider));

    handle
        .send(Event::Load {
            args: args(),
            force_goto: false,
        })
        .unwrap();
    // Nothing is displayed yet, so this NEXT is dropped.
    handle.send(Event::next()).unwrap();
    let first = wait_for(&mut outbound, |e| matches!(e, Effect::ActivityChanged { .. })).await;
    assert!(matches!(first, Effect::ActivityChanged { index: 0, .. }));

    handle.send(Event::exit()).unwrap();
    let orchestrator = tokio::time::timeout(Duration::from_secs(3), task)
        .await
        .expect("runtime did not stop")
        .unwrap();
    assert_eq!(orchestrator.navigation(), NavigationState::Finished);
    assert_eq!(orchestrator.context().activity_index, Some(0));
}
