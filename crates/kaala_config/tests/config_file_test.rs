use std::io::Write;

use chrono::{TimeZone, Utc};
use kaala_config::{ConfigError, KaalaConfig};
use kaala_search::SolarReturnMethod;

#[test]
fn loads_full_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[timeline]
horizon_years = 120.0
depth = 3

[ephemeris]
epoch = "1950-01-01T00:00:00Z"
ayanamsha = 23.15

[dasha]
systems = ["Vimshottari", "Kaal Chakra"]

[solar_return]
method = "bisection"
max_widenings = 2

[[solar_return.refine_passes]]
half_window_minutes = 60.0
step_minutes = 10.0

[transits]
step_minutes = 30.0
orb_deg = 0.5

[ingresses]
step_minutes = 15.0
"#
    )
    .unwrap();

    let config = KaalaConfig::from_file(file.path()).unwrap();
    assert_eq!(config.timeline.depth, 3);
    assert_eq!(
        config.ephemeris.epoch,
        Utc.with_ymd_and_hms(1950, 1, 1, 0, 0, 0).unwrap()
    );
    assert!((config.ephemeris.ayanamsha - 23.15).abs() < 1e-12);
    assert_eq!(config.dasha.resolve().unwrap().len(), 2);
    assert_eq!(config.solar_return.method, SolarReturnMethod::Bisection);
    assert_eq!(config.solar_return.max_widenings, 2);
    assert_eq!(config.solar_return.refine_passes.len(), 1);
    assert!((config.transits.orb_deg - 0.5).abs() < 1e-12);
    assert!((config.ingresses.step_minutes - 15.0).abs() < 1e-12);
}

#[test]
fn missing_file_is_io_error_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = KaalaConfig::from_file(&path).unwrap_err();
    match err {
        ConfigError::Io { path: p, .. } => assert_eq!(p, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_file_is_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[timeline\ndepth = ").unwrap();
    let err = KaalaConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn load_without_path_gives_defaults() {
    assert_eq!(KaalaConfig::load(None).unwrap(), KaalaConfig::default());
}
