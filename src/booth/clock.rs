use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Frame limiter for the main loop.
///
/// Each tick sleeps until the deadline derived from the configured maximum
/// rate, so one loop iteration can never complete faster than `1/max_fps`.
/// Deadlines are scheduled from the previous deadline, not from wake-up, so
/// the rate stays stable under jitter.
pub struct TickClock {
    interval: Duration,
    deadline: Option<Instant>,
}

impl TickClock {
    pub fn new(max_fps: f32) -> Self {
        Self {
            interval: Duration::from_secs_f32(1.0 / max_fps),
            deadline: None,
        }
    }

    pub async fn tick(&mut self) {
        let now = Instant::now();
        match self.deadline {
            Some(deadline) if deadline > now => {
                sleep_until(deadline).await;
                self.deadline = Some(deadline + self.interval);
            }
            _ => {
                // first tick, or the loop is already running behind
                self.deadline = Some(now + self.interval);
            }
        }
    }
}
