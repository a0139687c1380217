//! Skim detection and display penalty state machine.
//!
//! Every producer (input pumps, the penalty timer, shutdown signals) feeds
//! [`ThrottleEvent`]s into one channel; [`run_event_loop`] is the only place
//! that touches controller state.

use std::time::Duration;

mod accumulator;
mod controller;
mod event_loop;
mod runtime;
mod services;
mod timer;

pub use accumulator::ScrollAccumulator;
pub use controller::{
    penalty_brightness, PenaltyController, PenaltyPhase, PenaltyState, ScrollOutcome,
    ShutdownError, ThrottleConfig,
};
pub use event_loop::{event_channel, pump_scroll_source, run_event_loop, ThrottleEvent};
pub use runtime::block_on_detached;
pub use services::{BrightnessService, PenaltyTimer, ScrollSource, UnavailableBrightness};
pub use timer::{ExpiryToken, TokioPenaltyTimer};

/// Accumulated scroll magnitude at which skimming is assumed.
pub const SCROLL_THRESHOLD: i64 = 1000;
/// Silence after which the accumulated total starts over.
pub const IDLE_RESET: Duration = Duration::from_secs(10);
/// How long one penalty lasts after the last qualifying scroll.
pub const PENALTY_DURATION: Duration = Duration::from_secs(5);
/// Penalized brightness below this is forced to fully dark.
pub const PENALTY_FLOOR: f32 = 0.05;
/// Exit status for a shutdown that could not cancel the penalty timer.
pub const SHUTDOWN_FAILURE_EXIT_CODE: u8 = 255;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
