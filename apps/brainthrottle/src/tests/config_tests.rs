use super::*;

use std::collections::HashMap;
use tempfile::TempDir;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_match_built_in_constants() {
    let config = Settings::default().throttle_config().expect("valid");
    assert_eq!(config, ThrottleConfig::default());
    assert_eq!(config.scroll_threshold, 1000);
    assert_eq!(config.idle_reset, Duration::from_secs(10));
    assert_eq!(config.penalty_duration, Duration::from_secs(5));
}

#[test]
fn file_values_replace_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
scroll_threshold = 600
penalty_secs = 8
backlight = "/sys/class/backlight/amdgpu_bl0"
devices = ["/dev/input/event4", "/dev/input/event7"]
"#,
    )
    .expect("parse");

    assert_eq!(settings.scroll_threshold, 600);
    assert_eq!(settings.penalty_secs, 8);
    assert_eq!(settings.idle_reset_secs, 10);
    assert_eq!(
        settings.backlight.as_deref(),
        Some(Path::new("/sys/class/backlight/amdgpu_bl0"))
    );
    assert_eq!(settings.devices.len(), 2);
}

#[test]
fn unknown_file_keys_are_rejected() {
    let mut settings = Settings::default();
    assert!(apply_file(&mut settings, "treshold = 5").is_err());
}

#[test]
fn env_overrides_file_and_ignores_garbage() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "scroll_threshold = 600").expect("parse");

    apply_env(
        &mut settings,
        env_from(&[
            ("BRAINTHROTTLE__SCROLL_THRESHOLD", "1500"),
            ("BRAINTHROTTLE__PENALTY_SECS", "soon"),
            ("BRAINTHROTTLE__DEVICES", "/dev/input/event2::/dev/input/event9"),
        ]),
    );

    assert_eq!(settings.scroll_threshold, 1500);
    assert_eq!(settings.penalty_secs, 5);
    assert_eq!(
        settings.devices,
        vec![
            PathBuf::from("/dev/input/event2"),
            PathBuf::from("/dev/input/event9")
        ]
    );
}

#[test]
fn command_line_wins_over_everything() {
    let mut settings = Settings::default();
    apply_env(&mut settings, env_from(&[("BRAINTHROTTLE__IDLE_RESET_SECS", "30")]));

    apply_overrides(
        &mut settings,
        &Overrides {
            idle_reset_secs: Some(4),
            devices: vec![PathBuf::from("/dev/input/event1")],
            ..Overrides::default()
        },
    );

    assert_eq!(settings.idle_reset_secs, 4);
    assert_eq!(settings.devices, vec![PathBuf::from("/dev/input/event1")]);
}

#[test]
fn invalid_tuning_is_rejected() {
    let zero_threshold = Settings {
        scroll_threshold: 0,
        ..Settings::default()
    };
    assert!(zero_threshold.throttle_config().is_err());

    let zero_penalty = Settings {
        penalty_secs: 0,
        ..Settings::default()
    };
    assert!(zero_penalty.throttle_config().is_err());

    let zero_idle = Settings {
        idle_reset_secs: 0,
        ..Settings::default()
    };
    assert!(zero_idle.throttle_config().is_err());
}

#[test]
fn explicit_config_path_must_exist() {
    let root = TempDir::new().expect("tempdir");
    let missing = root.path().join("nope.toml");

    let err = load_settings(Some(&missing), &Overrides::default()).expect_err("missing file");
    assert!(err.to_string().contains("nope.toml"));
}

#[test]
fn explicit_config_file_is_loaded() {
    let root = TempDir::new().expect("tempdir");
    let path = root.path().join("brainthrottle.toml");
    fs::write(&path, "penalty_secs = 12\n").expect("write config");

    let settings = load_settings(
        Some(&path),
        &Overrides {
            scroll_threshold: Some(250),
            ..Overrides::default()
        },
    )
    .expect("load");

    assert_eq!(settings.penalty_secs, 12);
    assert_eq!(settings.scroll_threshold, 250);
}

#[test]
fn broken_config_file_names_the_file() {
    let root = TempDir::new().expect("tempdir");
    let path = root.path().join("broken.toml");
    fs::write(&path, "penalty_secs = \"five\"\n").expect("write config");

    let err = load_settings(Some(&path), &Overrides::default()).expect_err("bad file");
    assert!(format!("{err:#}").contains("broken.toml"));
}
