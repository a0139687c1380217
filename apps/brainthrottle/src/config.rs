use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use serde::Deserialize;
use throttle_core::{ThrottleConfig, IDLE_RESET, PENALTY_DURATION, SCROLL_THRESHOLD};
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "brainthrottle.toml";
const ENV_PREFIX: &str = "BRAINTHROTTLE__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub scroll_threshold: i64,
    pub idle_reset_secs: u64,
    pub penalty_secs: u64,
    pub backlight: Option<PathBuf>,
    pub devices: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scroll_threshold: SCROLL_THRESHOLD,
            idle_reset_secs: IDLE_RESET.as_secs(),
            penalty_secs: PENALTY_DURATION.as_secs(),
            backlight: None,
            devices: Vec::new(),
        }
    }
}

impl Settings {
    pub fn throttle_config(&self) -> anyhow::Result<ThrottleConfig> {
        if self.scroll_threshold <= 0 {
            bail!("scroll_threshold must be positive, got {}", self.scroll_threshold);
        }
        if self.idle_reset_secs == 0 {
            bail!("idle_reset_secs must be at least 1");
        }
        if self.penalty_secs == 0 {
            bail!("penalty_secs must be at least 1");
        }

        Ok(ThrottleConfig {
            scroll_threshold: self.scroll_threshold,
            idle_reset: Duration::from_secs(self.idle_reset_secs),
            penalty_duration: Duration::from_secs(self.penalty_secs),
        })
    }
}

/// Command line overrides; they win over the file and the environment.
#[derive(Debug, Default, Clone, clap::Args)]
pub struct Overrides {
    /// sysfs backlight directory, e.g. /sys/class/backlight/intel_backlight
    #[arg(long)]
    pub backlight: Option<PathBuf>,

    /// evdev node to watch for wheel events (repeatable)
    #[arg(long = "device")]
    pub devices: Vec<PathBuf>,

    /// accumulated scroll magnitude that counts as skimming
    #[arg(long)]
    pub scroll_threshold: Option<i64>,

    /// seconds a penalty lasts after the last qualifying scroll
    #[arg(long)]
    pub penalty_secs: Option<u64>,

    /// seconds of silence before the scroll total starts over
    #[arg(long)]
    pub idle_reset_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    scroll_threshold: Option<i64>,
    idle_reset_secs: Option<u64>,
    penalty_secs: Option<u64>,
    backlight: Option<PathBuf>,
    devices: Option<Vec<PathBuf>>,
}

/// Defaults, then the TOML file, then `BRAINTHROTTLE__*` variables, then the command line.
pub fn load_settings(config_path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    if let Some(raw) = read_config_file(&path, required)? {
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    apply_overrides(&mut settings, overrides);

    Ok(settings)
}

fn read_config_file(path: &Path, required: bool) -> anyhow::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => Ok(None),
        Err(err) => {
            Err(err).with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file.scroll_threshold {
        settings.scroll_threshold = v;
    }
    if let Some(v) = file.idle_reset_secs {
        settings.idle_reset_secs = v;
    }
    if let Some(v) = file.penalty_secs {
        settings.penalty_secs = v;
    }
    if let Some(v) = file.backlight {
        settings.backlight = Some(v);
    }
    if let Some(v) = file.devices {
        settings.devices = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

    if let Some(v) = var("SCROLL_THRESHOLD") {
        match v.parse() {
            Ok(parsed) => settings.scroll_threshold = parsed,
            Err(_) => warn!(value = %v, "ignoring unparsable {ENV_PREFIX}SCROLL_THRESHOLD"),
        }
    }
    if let Some(v) = var("IDLE_RESET_SECS") {
        match v.parse() {
            Ok(parsed) => settings.idle_reset_secs = parsed,
            Err(_) => warn!(value = %v, "ignoring unparsable {ENV_PREFIX}IDLE_RESET_SECS"),
        }
    }
    if let Some(v) = var("PENALTY_SECS") {
        match v.parse() {
            Ok(parsed) => settings.penalty_secs = parsed,
            Err(_) => warn!(value = %v, "ignoring unparsable {ENV_PREFIX}PENALTY_SECS"),
        }
    }
    if let Some(v) = var("BACKLIGHT") {
        settings.backlight = Some(PathBuf::from(v));
    }
    if let Some(v) = var("DEVICES") {
        settings.devices = v
            .split(':')
            .filter(|part| !part.is_empty())
            .map(PathBuf::from)
            .collect();
    }
}

fn apply_overrides(settings: &mut Settings, overrides: &Overrides) {
    if let Some(v) = &overrides.backlight {
        settings.backlight = Some(v.clone());
    }
    if !overrides.devices.is_empty() {
        settings.devices = overrides.devices.clone();
    }
    if let Some(v) = overrides.scroll_threshold {
        settings.scroll_threshold = v;
    }
    if let Some(v) = overrides.penalty_secs {
        settings.penalty_secs = v;
    }
    if let Some(v) = overrides.idle_reset_secs {
        settings.idle_reset_secs = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
