use std::time::Duration;

use shared::domain::ScrollEvent;
use tokio::time::Instant;
use tracing::info;

/// Running scroll total that starts over after a quiet gap.
#[derive(Debug)]
pub struct ScrollAccumulator {
    idle_reset: Duration,
    recent_total: i64,
    last_event_time: Option<Instant>,
}

impl ScrollAccumulator {
    pub fn new(idle_reset: Duration) -> Self {
        Self {
            idle_reset,
            recent_total: 0,
            last_event_time: None,
        }
    }

    /// Folds one event into the total and returns the new total.
    pub fn update(&mut self, event: &ScrollEvent) -> i64 {
        let magnitude = event.magnitude();
        let idle = match self.last_event_time {
            Some(last) => event.timestamp.saturating_duration_since(last) > self.idle_reset,
            None => true,
        };

        if idle {
            info!(magnitude, "resetting scroll counter");
            self.recent_total = magnitude;
        } else {
            self.recent_total = self.recent_total.saturating_add(magnitude);
        }
        self.last_event_time = Some(event.timestamp);

        self.recent_total
    }

    /// Makes the next event start a fresh total regardless of timing.
    pub fn forget_last_event(&mut self) {
        self.last_event_time = None;
    }

    pub fn total(&self) -> i64 {
        self.recent_total
    }

    pub fn last_event_time(&self) -> Option<Instant> {
        self.last_event_time
    }
}
