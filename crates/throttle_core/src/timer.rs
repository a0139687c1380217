use std::time::Duration;

use shared::error::TimerError;
use tokio::{
    runtime::Handle,
    sync::mpsc,
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::debug;

use crate::{event_loop::ThrottleEvent, services::PenaltyTimer};

/// Identifies one armed deadline so a superseded expiry can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpiryToken(pub u64);

struct Deadline {
    token: ExpiryToken,
    task: JoinHandle<()>,
}

/// Penalty timer backed by a tokio sleeper task.
pub struct TokioPenaltyTimer {
    events: mpsc::Sender<ThrottleEvent>,
    generation: u64,
    live: Option<Deadline>,
}

impl TokioPenaltyTimer {
    pub fn new(events: mpsc::Sender<ThrottleEvent>) -> Self {
        Self {
            events,
            generation: 0,
            live: None,
        }
    }

    fn cancel(&mut self) {
        if let Some(deadline) = self.live.take() {
            deadline.task.abort();
        }
    }
}

impl PenaltyTimer for TokioPenaltyTimer {
    fn arm(&mut self, duration: Duration) -> Result<(), TimerError> {
        let runtime = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;
        self.cancel();

        self.generation = self.generation.wrapping_add(1);
        let token = ExpiryToken(self.generation);
        let deadline = Instant::now() + duration;
        let events = self.events.clone();
        let task = runtime.spawn(async move {
            sleep_until(deadline).await;
            if events.send(ThrottleEvent::TimerExpired(token)).await.is_err() {
                debug!(token = token.0, "event loop gone; dropping penalty expiry");
            }
        });

        self.live = Some(Deadline { token, task });
        Ok(())
    }

    fn disarm(&mut self) -> Result<(), TimerError> {
        self.cancel();
        Ok(())
    }

    fn is_armed(&self) -> bool {
        self.live.is_some()
    }

    fn expire(&mut self, token: ExpiryToken) -> bool {
        match &self.live {
            Some(deadline) if deadline.token == token => {
                self.live = None;
                true
            }
            _ => false,
        }
    }
}

impl Drop for TokioPenaltyTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "tests/timer_tests.rs"]
mod tests;
