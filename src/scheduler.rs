//! # Frame Scheduler
//!
//! Paces interactive redraws to wall-clock second boundaries. The scheduler owns one
//! [`PlatformTimer`] and never has more than one callback pending on it: every schedule
//! is preceded by a cancel. When the host fires the timer it calls back into the engine,
//! which calls [`FrameScheduler::on_tick`].

use log::{debug, trace};
use std::time::Duration;

/// Interactive update period.
pub const TICK_PERIOD_MS: i64 = 1_000;

/// One-shot timer provided by the host.
pub trait PlatformTimer {
    /// Deliver a tick after `delay`. Replaces nothing: callers cancel first.
    fn schedule_after(&mut self, delay: Duration);

    /// Drop the pending tick, if any.
    fn cancel_pending(&mut self);
}

/// Delay until the next whole second of `now_ms`; a full period when exactly on one.
pub fn next_tick_delay(now_ms: i64) -> Duration {
    let delay = TICK_PERIOD_MS - now_ms.rem_euclid(TICK_PERIOD_MS);
    Duration::from_millis(delay as u64)
}

/// Self-rescheduling once-a-second timer.
#[derive(Debug)]
pub struct FrameScheduler<T: PlatformTimer> {
    timer: T,
    armed: bool,
    terminated: bool,
}

impl<T: PlatformTimer> FrameScheduler<T> {
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            armed: false,
            terminated: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Cancel, then tick immediately if the face should be running.
    pub fn rearm(&mut self, should_run: bool) {
        if self.terminated {
            return;
        }
        self.timer.cancel_pending();
        self.armed = should_run;
        if should_run {
            debug!("Frame scheduler armed");
            self.timer.schedule_after(Duration::ZERO);
        } else {
            debug!("Frame scheduler disarmed");
        }
    }

    /// Handle a fired tick. Returns whether a redraw should be requested.
    pub fn on_tick(&mut self, now_ms: i64, should_run: bool) -> bool {
        if self.terminated {
            return false;
        }
        self.timer.cancel_pending();
        self.armed = should_run;
        if should_run {
            let delay = next_tick_delay(now_ms);
            trace!("Next tick in {}ms", delay.as_millis());
            self.timer.schedule_after(delay);
        }
        true
    }

    /// Stop for good; later rearms and ticks are ignored.
    pub fn shutdown(&mut self) {
        self.timer.cancel_pending();
        self.armed = false;
        self.terminated = true;
    }
}

/// Timer that only records what was scheduled; the caller fires it by hand.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManualTimer {
    pending: Vec<Duration>,
    scheduled_total: usize,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Delay of the most recent pending tick.
    pub fn pending_delay(&self) -> Option<Duration> {
        self.pending.last().copied()
    }

    /// Total schedules ever made, including cancelled ones.
    pub fn scheduled_total(&self) -> usize {
        self.scheduled_total
    }

    /// Consume the pending tick. Returns whether one was pending.
    pub fn fire(&mut self) -> bool {
        self.pending.pop().is_some()
    }
}

impl PlatformTimer for ManualTimer {
    fn schedule_after(&mut self, delay: Duration) {
        self.scheduled_total += 1;
        self.pending.push(delay);
    }

    fn cancel_pending(&mut self) {
        self.pending.clear();
    }
}
