//! Mouse wheel input read straight from `/dev/input/event*`.
//!
//! Each `read` on an evdev node yields whole `struct input_event` records.
//! Wheel motion arrives as `EV_REL` events and is committed by the next
//! `SYN_REPORT`. A `SYN_DROPPED` means the kernel buffer overflowed and the
//! source has to be treated as disabled until the next report.
//!
//! Reads go through `tokio::fs`, so an idle device parks a blocking-pool
//! thread. Runtimes that own pumps should be torn down with
//! [`throttle_core::block_on_detached`].

use std::{
    collections::BTreeSet,
    ffi::c_long,
    fs, io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use shared::{
    domain::{ScrollDelta, SourceEvent},
    error::InputError,
};
use throttle_core::ScrollSource;
use tokio::{fs::File, io::AsyncReadExt};
use tracing::debug;

pub const INPUT_DIR: &str = "/dev/input";

const DEVICE_LINK_DIRS: [&str; 2] = ["by-id", "by-path"];
const MOUSE_LINK_SUFFIX: &str = "-event-mouse";

// `struct timeval` is two longs only on 64-bit targets; 32-bit builds with a
// 64-bit `time_t` lay it out differently.
#[cfg(not(target_pointer_width = "64"))]
compile_error!("evdev decoding assumes the 64-bit Linux input_event layout");

const TIMEVAL_SIZE: usize = 2 * std::mem::size_of::<c_long>();
pub(crate) const INPUT_EVENT_SIZE: usize = TIMEVAL_SIZE + 8;

pub(crate) const EV_SYN: u16 = 0x00;
pub(crate) const EV_REL: u16 = 0x02;
pub(crate) const SYN_REPORT: u16 = 0x00;
pub(crate) const SYN_DROPPED: u16 = 0x03;
pub(crate) const REL_HWHEEL: u16 = 0x06;
pub(crate) const REL_WHEEL: u16 = 0x08;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawInputEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl RawInputEvent {
    pub fn parse(record: &[u8; INPUT_EVENT_SIZE]) -> Self {
        let body = &record[TIMEVAL_SIZE..];
        Self {
            kind: u16::from_ne_bytes([body[0], body[1]]),
            code: u16::from_ne_bytes([body[2], body[3]]),
            value: i32::from_ne_bytes([body[4], body[5], body[6], body[7]]),
        }
    }
}

/// Folds raw records into one scroll event per report frame.
#[derive(Debug, Default)]
pub(crate) struct FrameDecoder {
    pending: ScrollDelta,
    has_wheel: bool,
    dropping: bool,
}

impl FrameDecoder {
    pub fn push(&mut self, event: RawInputEvent) -> Option<SourceEvent> {
        match (event.kind, event.code) {
            (EV_SYN, SYN_DROPPED) => {
                self.clear();
                self.dropping = true;
                Some(SourceEvent::Disabled)
            }
            (EV_SYN, SYN_REPORT) => {
                if self.dropping {
                    self.dropping = false;
                    self.clear();
                    return None;
                }
                let frame = self.has_wheel.then_some(self.pending);
                self.clear();
                frame.map(SourceEvent::Scroll)
            }
            _ if self.dropping => None,
            (EV_REL, REL_WHEEL) => {
                self.pending.dy = self.pending.dy.saturating_add(i64::from(event.value));
                self.has_wheel = true;
                None
            }
            (EV_REL, REL_HWHEEL) => {
                self.pending.dx = self.pending.dx.saturating_add(i64::from(event.value));
                self.has_wheel = true;
                None
            }
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.pending = ScrollDelta::default();
        self.has_wheel = false;
    }
}

pub struct EvdevScrollSource {
    path: PathBuf,
    name: String,
    file: Option<File>,
    decoder: FrameDecoder,
}

impl EvdevScrollSource {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, InputError> {
        let path = path.into();
        let file = open_device(&path).await?;
        Ok(Self {
            name: path.display().to_string(),
            path,
            file: Some(file),
            decoder: FrameDecoder::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn open_device(path: &Path) -> Result<File, InputError> {
    File::open(path).await.map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl ScrollSource for EvdevScrollSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_event(&mut self) -> Result<SourceEvent, InputError> {
        let mut record = [0u8; INPUT_EVENT_SIZE];
        loop {
            let Some(file) = self.file.as_mut() else {
                return Err(InputError::Read {
                    path: self.path.clone(),
                    source: io::Error::new(io::ErrorKind::NotConnected, "device not open"),
                });
            };

            match file.read_exact(&mut record).await {
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(InputError::Closed {
                        path: self.path.clone(),
                    });
                }
                Err(source) => {
                    self.file = None;
                    return Err(InputError::Read {
                        path: self.path.clone(),
                        source,
                    });
                }
            }

            if let Some(event) = self.decoder.push(RawInputEvent::parse(&record)) {
                return Ok(event);
            }
        }
    }

    async fn reenable(&mut self) -> Result<(), InputError> {
        self.decoder.clear();
        if self.file.is_none() {
            debug!(path = %self.path.display(), "reopening input device");
            self.file = Some(open_device(&self.path).await?);
        }
        Ok(())
    }
}

/// Mouse event nodes advertised by udev symlinks, deduplicated and sorted.
pub fn discover_scroll_devices(input_dir: &Path) -> Vec<PathBuf> {
    let mut devices = BTreeSet::new();
    for link_dir in DEVICE_LINK_DIRS {
        let Ok(entries) = fs::read_dir(input_dir.join(link_dir)) else {
            continue;
        };
        for entry in entries.filter_map(Result::ok) {
            let is_mouse = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(MOUSE_LINK_SUFFIX));
            if !is_mouse {
                continue;
            }
            if let Ok(target) = fs::canonicalize(entry.path()) {
                devices.insert(target);
            }
        }
    }
    devices.into_iter().collect()
}

#[cfg(test)]
#[path = "tests/evdev_tests.rs"]
mod tests;
