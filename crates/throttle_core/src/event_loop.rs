use std::time::Duration;

use shared::{
    domain::{ScrollEvent, SourceEvent},
    error::InputError,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{
    controller::{PenaltyController, ShutdownError},
    services::ScrollSource,
    timer::ExpiryToken,
};

const EVENT_QUEUE_CAPACITY: usize = 256;
const REENABLE_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Everything the controller reacts to, funneled through one queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThrottleEvent {
    Scroll(ScrollEvent),
    SourceDisabled,
    TimerExpired(ExpiryToken),
    Shutdown,
}

pub fn event_channel() -> (mpsc::Sender<ThrottleEvent>, mpsc::Receiver<ThrottleEvent>) {
    mpsc::channel(EVENT_QUEUE_CAPACITY)
}

/// Applies queued events to the controller until shutdown.
pub async fn run_event_loop(
    controller: &mut PenaltyController,
    mut events: mpsc::Receiver<ThrottleEvent>,
) -> Result<(), ShutdownError> {
    while let Some(event) = events.recv().await {
        match event {
            ThrottleEvent::Scroll(scroll) => {
                controller.on_scroll(scroll).await;
            }
            ThrottleEvent::SourceDisabled => controller.on_source_disabled(),
            ThrottleEvent::TimerExpired(token) => {
                controller.on_expire(token).await;
            }
            ThrottleEvent::Shutdown => return controller.on_shutdown().await,
        }
    }

    warn!("event queue closed; shutting down");
    controller.on_shutdown().await
}

/// Forwards one source into the queue, re-registering it whenever it drops out.
/// Returns when the source closes or the queue goes away.
pub async fn pump_scroll_source(
    mut source: Box<dyn ScrollSource>,
    events: mpsc::Sender<ThrottleEvent>,
) {
    loop {
        match source.next_event().await {
            Ok(SourceEvent::Scroll(delta)) => {
                if events
                    .send(ThrottleEvent::Scroll(ScrollEvent::now(delta)))
                    .await
                    .is_err()
                {
                    return;
                }
                continue;
            }
            Ok(SourceEvent::Disabled) => {
                info!(source = source.name(), "input source disabled; re-registering");
            }
            Err(InputError::Closed { .. }) => {
                info!(source = source.name(), "input source closed");
                return;
            }
            Err(err) => {
                warn!(source = source.name(), %err, "input source failed; re-registering");
            }
        }

        if events.send(ThrottleEvent::SourceDisabled).await.is_err() {
            return;
        }

        while let Err(err) = source.reenable().await {
            warn!(source = source.name(), %err, "failed to re-register input source");
            if events.is_closed() {
                return;
            }
            tokio::time::sleep(REENABLE_RETRY_DELAY).await;
        }
    }
}

#[cfg(test)]
#[path = "tests/event_loop_tests.rs"]
mod tests;
