//! Linux adapters for the throttle core: sysfs backlight and evdev wheel input.

pub mod backlight;
pub mod evdev;

pub use backlight::{SysfsBacklight, BACKLIGHT_CLASS_DIR};
pub use evdev::{discover_scroll_devices, EvdevScrollSource, INPUT_DIR};
