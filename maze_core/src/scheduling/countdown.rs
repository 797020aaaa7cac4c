use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};

/// Period of one countdown tick
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    /// Seconds left after this tick
    pub remaining: u32,
    /// Seconds since the countdown started
    pub elapsed: u32,
    /// Set on the tick that reaches zero; the countdown is stopped afterwards
    pub expired: bool,
}

/// Wall-clock countdown against a time limit
///
/// The first tick fires one period after construction. `tick()` is cancel
/// safe, so it can sit in a `select!` next to other branches.
#[derive(Debug)]
pub struct Countdown {
    limit: u32,
    elapsed: u32,
    interval: Interval,
    running: bool,
}

impl Countdown {
    pub fn new(limit_secs: u32) -> Self {
        Self::with_period(limit_secs, TICK_PERIOD)
    }

    pub fn with_period(limit_secs: u32, period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            limit: limit_secs,
            elapsed: 0,
            interval,
            running: limit_secs > 0,
        }
    }

    /// Wait for the next tick; `None` once stopped or expired
    pub async fn tick(&mut self) -> Option<CountdownTick> {
        if !self.running {
            return None;
        }
        self.interval.tick().await;

        self.elapsed += 1;
        let remaining = self.limit.saturating_sub(self.elapsed);
        let expired = remaining == 0;
        if expired {
            self.running = false;
        }
        Some(CountdownTick {
            remaining,
            elapsed: self.elapsed,
            expired,
        })
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.elapsed)
    }
}
