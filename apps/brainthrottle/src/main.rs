use std::{
    io,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use platform::{
    discover_scroll_devices, EvdevScrollSource, SysfsBacklight, BACKLIGHT_CLASS_DIR, INPUT_DIR,
};
use throttle_core::{
    block_on_detached, event_channel, pump_scroll_source, run_event_loop, BrightnessService,
    PenaltyController, ThrottleEvent, TokioPenaltyTimer, UnavailableBrightness,
};
use tokio::{
    runtime::Builder,
    signal::unix::{signal, Signal, SignalKind},
    sync::mpsc,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Overrides, Settings};

/// Dims the display for a few seconds whenever scrolling looks like skimming.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// TOML settings file (defaults to ./brainthrottle.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref(), &cli.overrides)?;

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let signals = {
        let _entered = runtime.enter();
        ShutdownSignals::install().context("failed to install shutdown signal handlers")?
    };

    // Pumps blocked on idle devices must not hold the process open.
    block_on_detached(runtime, run(settings, signals))
}

async fn run(settings: Settings, signals: ShutdownSignals) -> Result<ExitCode> {
    let throttle = settings.throttle_config()?;

    let (events, queue) = event_channel();
    let brightness = open_backlight(&settings, Path::new(BACKLIGHT_CLASS_DIR)).await;
    let mut controller = PenaltyController::new(
        throttle,
        brightness,
        Box::new(TokioPenaltyTimer::new(events.clone())),
    );

    start_input_pumps(&settings, Path::new(INPUT_DIR), &events).await;
    tokio::spawn(signals.forward(events));

    info!(
        threshold = throttle.scroll_threshold,
        penalty_secs = throttle.penalty_duration.as_secs(),
        idle_reset_secs = throttle.idle_reset.as_secs(),
        "watching scroll activity; Ctrl-C to exit"
    );

    match run_event_loop(&mut controller, queue).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            error!(%err, "shutdown could not complete; bailing");
            Ok(ExitCode::from(err.exit_code()))
        }
    }
}

async fn open_backlight(settings: &Settings, class_dir: &Path) -> Box<dyn BrightnessService> {
    let backlight = match &settings.backlight {
        Some(dir) => Some(SysfsBacklight::new(dir)),
        None => SysfsBacklight::discover(class_dir),
    };

    let Some(backlight) = backlight else {
        warn!("no controllable backlight found; scrolling is tracked but the display will not dim");
        return Box::new(UnavailableBrightness);
    };

    match backlight.get().await {
        Ok(level) => info!(device = %backlight.dir().display(), brightness = level, "controlling backlight"),
        Err(err) => warn!(device = %backlight.dir().display(), %err, "backlight not readable yet"),
    }
    Box::new(backlight)
}

async fn start_input_pumps(
    settings: &Settings,
    input_dir: &Path,
    events: &mpsc::Sender<ThrottleEvent>,
) {
    let paths = if settings.devices.is_empty() {
        discover_scroll_devices(input_dir)
    } else {
        settings.devices.clone()
    };

    let mut started = 0usize;
    for path in paths {
        match EvdevScrollSource::open(&path).await {
            Ok(source) => {
                info!(device = %path.display(), "listening for scroll events");
                tokio::spawn(pump_scroll_source(Box::new(source), events.clone()));
                started += 1;
            }
            Err(err) => warn!(%err, "skipping input device"),
        }
    }

    if started == 0 {
        warn!("no readable scroll devices; check --device or membership of the `input` group");
    }
}

/// SIGINT and SIGTERM, registered up front so no signal is missed before
/// the forwarding task first polls.
struct ShutdownSignals {
    interrupt: Signal,
    terminate: Signal,
}

impl ShutdownSignals {
    fn install() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Sends one `Shutdown` per signal; later signals are harmless repeats.
    async fn forward(mut self, events: mpsc::Sender<ThrottleEvent>) {
        loop {
            let received = tokio::select! {
                Some(()) = self.interrupt.recv() => "interrupt",
                Some(()) = self.terminate.recv() => "terminate",
                else => return,
            };
            info!(signal = received, "shutdown requested");

            if events.send(ThrottleEvent::Shutdown).await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
