use std::{
    fs,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use shared::error::BrightnessError;
use throttle_core::BrightnessService;
use tracing::debug;

pub const BACKLIGHT_CLASS_DIR: &str = "/sys/class/backlight";

const BRIGHTNESS_FILE: &str = "brightness";
const MAX_BRIGHTNESS_FILE: &str = "max_brightness";

/// One `/sys/class/backlight/<name>` device, exposed as a normalized level.
#[derive(Debug, Clone)]
pub struct SysfsBacklight {
    dir: PathBuf,
}

impl SysfsBacklight {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Picks the first backlight device under `class_dir`, in name order.
    pub fn discover(class_dir: &Path) -> Option<Self> {
        let entries = fs::read_dir(class_dir).ok()?;
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.join(MAX_BRIGHTNESS_FILE).exists())
            .collect();
        dirs.sort();
        dirs.into_iter().next().map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_value(&self, file: &str) -> Result<u32, BrightnessError> {
        let path = self.dir.join(file);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| BrightnessError::Io {
                path: path.clone(),
                source,
            })?;
        raw.trim()
            .parse::<u32>()
            .map_err(|_| BrightnessError::InvalidValue { path, raw })
    }

    async fn max_brightness(&self) -> Result<u32, BrightnessError> {
        let max = self.read_value(MAX_BRIGHTNESS_FILE).await?;
        if max == 0 {
            return Err(BrightnessError::InvalidValue {
                path: self.dir.join(MAX_BRIGHTNESS_FILE),
                raw: "0".into(),
            });
        }
        Ok(max)
    }
}

#[async_trait]
impl BrightnessService for SysfsBacklight {
    async fn get(&self) -> Result<f32, BrightnessError> {
        let max = self.max_brightness().await?;
        let current = self.read_value(BRIGHTNESS_FILE).await?;
        Ok(current as f32 / max as f32)
    }

    async fn set(&self, value: f32) -> Result<(), BrightnessError> {
        let max = self.max_brightness().await?;
        let level = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        let raw = (level * max as f32).round() as u32;

        let path = self.dir.join(BRIGHTNESS_FILE);
        debug!(path = %path.display(), raw, "writing backlight level");
        tokio::fs::write(&path, raw.to_string())
            .await
            .map_err(|source| BrightnessError::Io { path, source })
    }
}

#[cfg(test)]
#[path = "tests/backlight_tests.rs"]
mod tests;
