use std::time::Duration;

use shared::{
    domain::ScrollEvent,
    error::{BrightnessError, TimerError},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    accumulator::ScrollAccumulator,
    services::{BrightnessService, PenaltyTimer},
    timer::ExpiryToken,
    IDLE_RESET, PENALTY_DURATION, PENALTY_FLOOR, SCROLL_THRESHOLD, SHUTDOWN_FAILURE_EXIT_CODE,
};

/// Detection and penalty tuning, fixed for the lifetime of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub scroll_threshold: i64,
    pub idle_reset: Duration,
    pub penalty_duration: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            scroll_threshold: SCROLL_THRESHOLD,
            idle_reset: IDLE_RESET,
            penalty_duration: PENALTY_DURATION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyPhase {
    Idle,
    Penalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PenaltyState {
    /// At least one penalty was applied since the last restore.
    pub active: bool,
    /// Brightness captured when the timer last went from disarmed to armed.
    pub baseline: Option<f32>,
}

/// What a single scroll event did to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollOutcome {
    /// Total is still below the threshold.
    Counted { total: i64 },
    /// The penalty was (re)applied. `to` is what was requested from the display.
    Dimmed { total: i64, from: f32, to: f32 },
    /// Threshold reached but brightness could not be read or the timer could not be armed.
    Aborted { total: i64 },
}

#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("failed to disarm penalty timer during shutdown: {0}")]
    Disarm(#[source] TimerError),
}

impl ShutdownError {
    pub fn exit_code(&self) -> u8 {
        SHUTDOWN_FAILURE_EXIT_CODE
    }
}

/// Brightness left after dimming `current` for one event of `magnitude`.
pub fn penalty_brightness(current: f32, magnitude: i64) -> f32 {
    let dimmed = current - current * (magnitude as f32 / 100.0);
    if dimmed.is_nan() || dimmed < PENALTY_FLOOR {
        0.0
    } else {
        dimmed
    }
}

pub struct PenaltyController {
    config: ThrottleConfig,
    accumulator: ScrollAccumulator,
    state: PenaltyState,
    brightness: Box<dyn BrightnessService>,
    timer: Box<dyn PenaltyTimer>,
    unsupported_reported: bool,
}

impl PenaltyController {
    pub fn new(
        config: ThrottleConfig,
        brightness: Box<dyn BrightnessService>,
        timer: Box<dyn PenaltyTimer>,
    ) -> Self {
        Self {
            accumulator: ScrollAccumulator::new(config.idle_reset),
            config,
            state: PenaltyState::default(),
            brightness,
            timer,
            unsupported_reported: false,
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    pub fn accumulator(&self) -> &ScrollAccumulator {
        &self.accumulator
    }

    pub fn state(&self) -> PenaltyState {
        self.state
    }

    pub fn phase(&self) -> PenaltyPhase {
        if self.state.active {
            PenaltyPhase::Penalized
        } else {
            PenaltyPhase::Idle
        }
    }

    pub fn timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    pub async fn on_scroll(&mut self, event: ScrollEvent) -> ScrollOutcome {
        let total = self.accumulator.update(&event);
        if total < self.config.scroll_threshold {
            return ScrollOutcome::Counted { total };
        }

        let current = match self.brightness.get().await {
            Ok(value) => {
                debug!(brightness = value, "display brightness");
                value
            }
            Err(err) => {
                self.report_brightness_error("read", &err);
                return ScrollOutcome::Aborted { total };
            }
        };

        if !self.timer.is_armed() {
            self.state.baseline = Some(current);
        }

        if let Err(err) = self.timer.arm(self.config.penalty_duration) {
            warn!(%err, "failed to arm penalty timer; skipping dim");
            return ScrollOutcome::Aborted { total };
        }

        if !self.state.active {
            info!(
                at = %chrono::Local::now().to_rfc3339(),
                total,
                baseline = current,
                "skimming detected"
            );
            self.state.active = true;
        }

        let dimmed = penalty_brightness(current, event.magnitude());
        if let Err(err) = self.brightness.set(dimmed).await {
            self.report_brightness_error("dim", &err);
        }

        ScrollOutcome::Dimmed {
            total,
            from: current,
            to: dimmed,
        }
    }

    /// Handles a timer expiry. Returns false if the token was superseded.
    pub async fn on_expire(&mut self, token: ExpiryToken) -> bool {
        if !self.timer.expire(token) {
            debug!(token = token.0, "ignoring superseded penalty expiry");
            return false;
        }

        self.restore().await;
        if let Err(err) = self.timer.disarm() {
            warn!(%err, "failed to disarm penalty timer after expiry");
        }
        true
    }

    /// Restores brightness and cancels the timer. Safe to call repeatedly.
    pub async fn on_shutdown(&mut self) -> Result<(), ShutdownError> {
        self.restore().await;
        self.timer.disarm().map_err(ShutdownError::Disarm)?;
        info!("exiting");
        Ok(())
    }

    pub fn on_source_disabled(&self) {
        debug!("input source disabled; waiting for re-registration");
    }

    async fn restore(&mut self) {
        if self.state.active {
            if let Some(baseline) = self.state.baseline {
                info!(brightness = baseline, "restoring display brightness");
                if let Err(err) = self.brightness.set(baseline).await {
                    self.report_brightness_error("restore", &err);
                }
            }
            self.state.active = false;
        }
        self.accumulator.forget_last_event();
    }

    fn report_brightness_error(&mut self, action: &str, err: &BrightnessError) {
        if err.is_unsupported() {
            if self.unsupported_reported {
                debug!(action, "brightness control unavailable");
            } else {
                warn!(action, %err, "brightness control unavailable; scrolling is still tracked");
                self.unsupported_reported = true;
            }
        } else {
            warn!(action, %err, "brightness call failed");
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
