//! Pause/resume countdown accumulator.
//!
//! Elapsed time is `already_elapsed` plus the length of the open segment, if
//! any. All values are milliseconds except `duration_secs`.

use crate::types::{TimerScope, TimerType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentTimer {
    pub timer_type: TimerType,
    pub scope: TimerScope,
    pub duration_secs: Option<u64>,
    pub already_elapsed: Option<u64>,
    pub segment_start: Option<u64>,
    pub segment_active: bool,
    pub timed_out: bool,
    pub remaining: Option<u64>,
}

impl SegmentTimer {
    pub fn new(timer_type: TimerType, scope: TimerScope, duration_secs: Option<u64>) -> Self {
        Self {
            timer_type,
            scope,
            duration_secs,
            ..Self::default()
        }
    }

    pub fn duration_millis(&self) -> Option<u64> {
        self.duration_secs.map(|d| d.saturating_mul(1000))
    }

    /// A countdown is configured and would be shown.
    pub fn has_timer(&self) -> bool {
        self.timer_type != TimerType::None && self.duration_secs.is_some()
    }

    pub fn elapsed(&self, now: u64) -> u64 {
        let open = match (self.segment_active, self.segment_start) {
            (true, Some(start)) => now.saturating_sub(start),
            _ => 0,
        };
        self.already_elapsed.unwrap_or(0).saturating_add(open)
    }

    pub fn did_timeout(&self, now: u64) -> bool {
        if self.timed_out {
            return true;
        }
        match self.duration_millis() {
            Some(duration) if duration > 0 => self.elapsed(now) >= duration,
            _ => false,
        }
    }

    /// Session-scoped timers expire the session once the duration is spent.
    pub fn session_expired(&self, now: u64) -> bool {
        self.scope == TimerScope::Session && self.has_timer() && self.did_timeout(now)
    }

    /// A segment may open: countdown configured and time left.
    pub fn can_start(&self, now: u64) -> bool {
        match self.duration_millis() {
            Some(duration) if self.timer_type != TimerType::None => self.elapsed(now) < duration,
            _ => false,
        }
    }

    pub fn can_ui_stop(&self) -> bool {
        self.timer_type == TimerType::Pausable
    }

    pub fn start_segment(&mut self, now: u64) {
        if self.timer_type == TimerType::None {
            return;
        }
        self.segment_start = Some(self.segment_start.unwrap_or(now));
        self.segment_active = true;
        self.remaining = None;
    }

    pub fn stop_segment(&mut self, now: u64) {
        if self.timer_type == TimerType::None {
            self.already_elapsed = None;
            self.segment_active = false;
            return;
        }
        self.already_elapsed = Some(self.elapsed(now));
        self.segment_active = false;
        self.segment_start = None;
    }

    pub fn set_timed_out(&mut self) {
        self.segment_active = false;
        self.segment_start = None;
        self.already_elapsed = Some(self.duration_millis().unwrap_or(0));
        self.timed_out = true;
        self.remaining = Some(0);
    }

    /// Recompute `remaining` at a tick boundary. Never negative.
    pub fn refresh_remaining(&mut self, now: u64) {
        self.remaining = self
            .duration_millis()
            .map(|duration| duration.saturating_sub(self.elapsed(now)));
    }

    /// Activity-scoped countdowns restart for every displayed activity.
    pub fn reset_for_activity(&mut self) {
        if self.scope != TimerScope::Activity {
            return;
        }
        self.already_elapsed = None;
        self.segment_start = None;
        self.segment_active = false;
        self.timed_out = false;
        self.remaining = None;
    }
}
