//! Section countdown.
//!
//! `Countdown` holds the remaining time and decides expiry; `SectionTimer` only
//! produces one `TimerTick` per period on a background task. Every started timer
//! carries a generation so ticks from a replaced timer can be recognised and dropped.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running (never started, stopped, or already expired).
    Idle,
    Running(u32),
    /// Reached zero on this tick. Reported once per start.
    Expired,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: Option<u32>,
    running: bool,
}

impl Countdown {
    pub fn start(&mut self, secs: u32) {
        self.remaining = Some(secs);
        self.running = true;
    }

    /// Freeze at the current value.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Forget the value entirely; the timer becomes inactive.
    pub fn clear(&mut self) {
        self.remaining = None;
        self.running = false;
    }

    #[must_use]
    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        let Some(current) = self.remaining else {
            return TickOutcome::Idle;
        };

        let next = current.saturating_sub(1);
        self.remaining = Some(next);
        if next == 0 {
            self.running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Running(next)
        }
    }
}

/// One beat of a running section timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    pub generation: u64,
}

/// Cancellable handle to a running ticker. Dropping it stops the ticker.
#[derive(Debug)]
pub struct TimerHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl TimerHandle {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stop(&self) {
        self.task.abort();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct SectionTimer;

impl SectionTimer {
    /// Spawn a ticker that sends `TimerTick { generation }` every `period`.
    ///
    /// The first tick arrives one full period after start. The ticker ends on its
    /// own once the receiving side is gone.
    #[must_use]
    pub fn start(generation: u64, period: Duration, ticks: UnboundedSender<TimerTick>) -> TimerHandle {
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if ticks.send(TimerTick { generation }).is_err() {
                    break;
                }
            }
        });
        TimerHandle { generation, task }
    }
}
