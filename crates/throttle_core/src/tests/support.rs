//! Scripted collaborators for controller and event loop tests.

use std::{
    collections::VecDeque,
    io,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::{ScrollDelta, SourceEvent},
    error::{BrightnessError, InputError, TimerError},
};

use crate::{
    services::{BrightnessService, PenaltyTimer, ScrollSource},
    timer::ExpiryToken,
};

#[derive(Debug, Default)]
pub(crate) struct DisplayState {
    pub level: f32,
    pub writes: Vec<f32>,
    pub fail_get: bool,
    pub fail_set: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeDisplay {
    inner: Arc<Mutex<DisplayState>>,
}

impl FakeDisplay {
    pub fn at(level: f32) -> Self {
        let display = Self::default();
        display.inner.lock().expect("display").level = level;
        display
    }

    pub fn level(&self) -> f32 {
        self.inner.lock().expect("display").level
    }

    /// Changes the level without recording a write, as a user adjustment would.
    pub fn set_level(&self, level: f32) {
        self.inner.lock().expect("display").level = level;
    }

    pub fn writes(&self) -> Vec<f32> {
        self.inner.lock().expect("display").writes.clone()
    }

    pub fn fail_get(&self, fail: bool) {
        self.inner.lock().expect("display").fail_get = fail;
    }

    pub fn fail_set(&self, fail: bool) {
        self.inner.lock().expect("display").fail_set = fail;
    }
}

fn backlight_error() -> BrightnessError {
    BrightnessError::Io {
        path: PathBuf::from("/sys/class/backlight/test/brightness"),
        source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
    }
}

#[async_trait]
impl BrightnessService for FakeDisplay {
    async fn get(&self) -> Result<f32, BrightnessError> {
        let state = self.inner.lock().expect("display");
        if state.fail_get {
            return Err(backlight_error());
        }
        Ok(state.level)
    }

    async fn set(&self, value: f32) -> Result<(), BrightnessError> {
        let mut state = self.inner.lock().expect("display");
        if state.fail_set {
            return Err(backlight_error());
        }
        state.level = value;
        state.writes.push(value);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct TimerState {
    pub live: Option<ExpiryToken>,
    pub generation: u64,
    pub arms: Vec<Duration>,
    pub disarms: u32,
    pub fail_arm: bool,
    pub fail_disarm: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeTimer {
    inner: Arc<Mutex<TimerState>>,
}

impl FakeTimer {
    pub fn live(&self) -> Option<ExpiryToken> {
        self.inner.lock().expect("timer").live
    }

    pub fn arms(&self) -> Vec<Duration> {
        self.inner.lock().expect("timer").arms.clone()
    }

    pub fn disarms(&self) -> u32 {
        self.inner.lock().expect("timer").disarms
    }

    pub fn fail_arm(&self, fail: bool) {
        self.inner.lock().expect("timer").fail_arm = fail;
    }

    pub fn fail_disarm(&self, fail: bool) {
        self.inner.lock().expect("timer").fail_disarm = fail;
    }
}

impl PenaltyTimer for FakeTimer {
    fn arm(&mut self, duration: Duration) -> Result<(), TimerError> {
        let mut state = self.inner.lock().expect("timer");
        if state.fail_arm {
            return Err(TimerError::Other("arm refused".into()));
        }
        state.generation += 1;
        state.live = Some(ExpiryToken(state.generation));
        state.arms.push(duration);
        Ok(())
    }

    fn disarm(&mut self) -> Result<(), TimerError> {
        let mut state = self.inner.lock().expect("timer");
        if state.fail_disarm {
            return Err(TimerError::Other("disarm refused".into()));
        }
        state.live = None;
        state.disarms += 1;
        Ok(())
    }

    fn is_armed(&self) -> bool {
        self.inner.lock().expect("timer").live.is_some()
    }

    fn expire(&mut self, token: ExpiryToken) -> bool {
        let mut state = self.inner.lock().expect("timer");
        if state.live == Some(token) {
            state.live = None;
            true
        } else {
            false
        }
    }
}

/// Plays back a fixed script, then reports the source closed.
pub(crate) struct ScriptedSource {
    script: VecDeque<Result<SourceEvent, InputError>>,
    pub reenables: Arc<Mutex<u32>>,
    failing_reenables: u32,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<SourceEvent, InputError>>) -> Self {
        Self {
            script: script.into(),
            reenables: Arc::new(Mutex::new(0)),
            failing_reenables: 0,
        }
    }

    pub fn with_failing_reenables(mut self, count: u32) -> Self {
        self.failing_reenables = count;
        self
    }
}

pub(crate) fn scroll(dx: i64, dy: i64) -> Result<SourceEvent, InputError> {
    Ok(SourceEvent::Scroll(ScrollDelta::new(dx, dy)))
}

#[async_trait]
impl ScrollSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn next_event(&mut self) -> Result<SourceEvent, InputError> {
        self.script.pop_front().unwrap_or_else(|| {
            Err(InputError::Closed {
                path: PathBuf::from("scripted"),
            })
        })
    }

    async fn reenable(&mut self) -> Result<(), InputError> {
        *self.reenables.lock().expect("reenables") += 1;
        if self.failing_reenables > 0 {
            self.failing_reenables -= 1;
            return Err(InputError::Open {
                path: PathBuf::from("scripted"),
                source: io::Error::new(io::ErrorKind::NotFound, "gone"),
            });
        }
        Ok(())
    }
}
