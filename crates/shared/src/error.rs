use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrightnessError {
    #[error("display brightness is not controllable on this system")]
    Unsupported,
    #[error("backlight i/o failed at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("unexpected backlight value in {path}: {raw:?}")]
    InvalidValue { path: PathBuf, raw: String },
}

impl BrightnessError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported)
    }
}

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("no async runtime available to run the penalty timer")]
    NoRuntime,
    /// Failure reported by a `PenaltyTimer` backend other than the tokio one.
    #[error("penalty timer failure: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input device {path} could not be opened: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("input device {path} read failed: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("input device {path} closed")]
    Closed { path: PathBuf },
}
