use async_trait::async_trait;
use shared::{
    domain::SourceEvent,
    error::{BrightnessError, InputError, TimerError},
};

use crate::timer::ExpiryToken;

/// Normalized display brightness, typically in `[0, 1]`.
#[async_trait]
pub trait BrightnessService: Send + Sync {
    async fn get(&self) -> Result<f32, BrightnessError>;
    async fn set(&self, value: f32) -> Result<(), BrightnessError>;
}

/// Single-deadline timer whose expiry is delivered through the event channel.
pub trait PenaltyTimer: Send {
    /// Starts the deadline, replacing any pending one.
    fn arm(&mut self, duration: std::time::Duration) -> Result<(), TimerError>;
    fn disarm(&mut self) -> Result<(), TimerError>;
    fn is_armed(&self) -> bool;
    /// Accepts an expiry notification. Returns false for a superseded deadline.
    fn expire(&mut self, token: ExpiryToken) -> bool;
}

#[async_trait]
pub trait ScrollSource: Send {
    fn name(&self) -> &str;
    async fn next_event(&mut self) -> Result<SourceEvent, InputError>;
    /// Re-registers the source after it reported [`SourceEvent::Disabled`].
    async fn reenable(&mut self) -> Result<(), InputError>;
}

/// Stand-in for systems without a controllable display.
pub struct UnavailableBrightness;

#[async_trait]
impl BrightnessService for UnavailableBrightness {
    async fn get(&self) -> Result<f32, BrightnessError> {
        Err(BrightnessError::Unsupported)
    }

    async fn set(&self, _value: f32) -> Result<(), BrightnessError> {
        Err(BrightnessError::Unsupported)
    }
}
