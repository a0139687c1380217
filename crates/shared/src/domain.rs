use tokio::time::Instant;

/// Raw wheel displacement reported by an input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollDelta {
    pub dx: i64,
    pub dy: i64,
}

impl ScrollDelta {
    pub fn new(dx: i64, dy: i64) -> Self {
        Self { dx, dy }
    }

    /// Activity weight of one scroll event. Zero-delta events still count as 1.
    pub fn magnitude(&self) -> i64 {
        self.dx
            .saturating_abs()
            .saturating_add(self.dy.saturating_abs())
            .saturating_add(1)
    }
}

/// A scroll delta stamped at the moment it entered the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollEvent {
    pub delta: ScrollDelta,
    pub timestamp: Instant,
}

impl ScrollEvent {
    pub fn new(dx: i64, dy: i64, timestamp: Instant) -> Self {
        Self {
            delta: ScrollDelta::new(dx, dy),
            timestamp,
        }
    }

    pub fn now(delta: ScrollDelta) -> Self {
        Self {
            delta,
            timestamp: Instant::now(),
        }
    }

    pub fn magnitude(&self) -> i64 {
        self.delta.magnitude()
    }
}

/// What an input source can hand to its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    Scroll(ScrollDelta),
    /// The source stopped delivering reliably and must be re-registered.
    Disabled,
}
