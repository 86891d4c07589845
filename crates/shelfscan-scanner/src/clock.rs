//! Frame pacing.
//!
//! While scanning, the controller samples one frame per clock tick. Ticks
//! never overlap: the next tick is only awaited after the previous frame
//! has been handled.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

/// Source of frame-sampling ticks.
pub trait FrameClock: Send {
    /// Wait for the next tick. Must be cancel safe.
    fn tick(&mut self) -> impl Future<Output = ()> + Send;
}

/// Ticks at the display refresh cadence.
///
/// Late ticks are delayed rather than bunched up, so a slow decode never
/// causes a burst of catch-up samples.
#[derive(Debug)]
pub struct RefreshClock {
    period: Duration,

    /// Created on first use, inside the runtime.
    interval: Option<Interval>,
}

impl RefreshClock {
    /// Clock ticking every `period`.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// Clock ticking `rate_hz` times per second.
    pub fn from_rate(rate_hz: u32) -> Self {
        Self::new(Duration::from_secs(1) / rate_hz.max(1))
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl FrameClock for RefreshClock {
    async fn tick(&mut self) {
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
    }
}

/// Ticks as fast as the runtime allows, yielding between ticks.
///
/// For replaying recorded frames and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateClock;

impl FrameClock for ImmediateClock {
    fn tick(&mut self) -> impl Future<Output = ()> + Send {
        tokio::task::yield_now()
    }
}
