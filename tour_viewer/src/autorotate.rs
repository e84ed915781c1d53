use std::time::{Duration, Instant};

/// Periodic auto-rotate timer. The session holds one only while ticking is
/// allowed; dropping it is the cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoRotateTask {
    interval: Duration,
    next_due: Instant,
}

impl AutoRotateTask {
    pub fn start(now: Instant, interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        Self {
            interval,
            next_due: now + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    /// Number of ticks that came due up to `now`. The schedule advances by
    /// whole intervals so late polls do not drift the cadence.
    pub fn poll(&mut self, now: Instant) -> u32 {
        if now < self.next_due {
            return 0;
        }
        let overdue = now - self.next_due;
        let ticks = (overdue.as_nanos() / self.interval.as_nanos()) as u32 + 1;
        self.next_due += self.interval * ticks;
        ticks
    }
}
