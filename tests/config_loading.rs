use std::fs;
use std::time::Duration;

use anyhow::Result;
use traffic_signal::config::{
    ApproachPins, IntersectionConfig, Validate, BATCH_SIZE, DEFAULT_CONFIG_FILE, MAX_DELAY_SECS, MAX_QUEUE,
    MIN_QUEUE,
};
use traffic_signal::simulation::{Delay, ThreadClock};

#[test]
fn test_defaults_match_reference_wiring() -> Result<()> {
    let config = IntersectionConfig::default();
    config.validate()?;

    assert_eq!(config.signals.approaches[0], ApproachPins { id: 1, red: 2, yellow: 14, green: 3 });
    assert_eq!(config.signals.approaches[2], ApproachPins { id: 3, red: 27, yellow: 18, green: 22 });
    assert_eq!(config.timing.yellow_dwell(), Duration::from_millis(500));
    assert_eq!(config.timing.cycle_pause(), Duration::from_millis(500));
    assert_eq!((config.demand.min_queue, config.demand.max_queue), (MIN_QUEUE, MAX_QUEUE));
    assert_eq!(config.demand.batch_size, BATCH_SIZE);
    assert_eq!(config.random.seed, None);
    Ok(())
}

#[test]
fn test_shipped_config_loads() -> Result<()> {
    let config = IntersectionConfig::load_from_file(DEFAULT_CONFIG_FILE)?;
    let defaults = IntersectionConfig::default();

    assert_eq!(config.signals.approaches, defaults.signals.approaches);
    assert_eq!(config.demand.batch_size, 10);
    assert_eq!(config.timing.time_scale, 1.0);
    Ok(())
}

#[test]
fn test_missing_sections_fall_back_to_defaults() -> Result<()> {
    let config = IntersectionConfig::from_toml_str(
        r#"
        [demand]
        batch_size = 5

        [random]
        seed = 42
        "#,
    )?;

    assert_eq!(config.demand.batch_size, 5);
    assert_eq!(config.demand.max_queue, MAX_QUEUE);
    assert_eq!(config.random.seed, Some(42));
    assert_eq!(config.signals.approaches.len(), 3);
    assert_eq!(config.timing.yellow_dwell(), Duration::from_millis(500));
    Ok(())
}

#[test]
fn test_rejects_shared_output_channel() {
    let mut config = IntersectionConfig::default();
    config.signals.approaches[1].yellow = config.signals.approaches[0].green;

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("more than once"), "{}", err);
}

#[test]
fn test_rejects_wrong_approach_count() {
    let mut config = IntersectionConfig::default();
    config.signals.approaches.pop();
    assert!(config.validate().is_err());

    let mut config = IntersectionConfig::default();
    config.signals.approaches.push(ApproachPins { id: 4, red: 5, yellow: 6, green: 13 });
    assert!(config.validate().is_err());
}

#[test]
fn test_rejects_unexpected_approach_ids() {
    let mut config = IntersectionConfig::default();
    config.signals.approaches[2].id = 4;
    assert!(config.validate().is_err());

    let mut config = IntersectionConfig::default();
    config.signals.approaches[2].id = 1;
    assert!(config.validate().is_err());
}

#[test]
fn test_rejects_bad_demand_bounds() {
    let mut config = IntersectionConfig::default();
    config.demand.min_queue = 0;
    assert!(config.validate().is_err());

    let mut config = IntersectionConfig::default();
    config.demand.min_queue = 21;
    assert!(config.validate().is_err());

    let mut config = IntersectionConfig::default();
    config.demand.batch_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_rejects_bad_timing() {
    let mut config = IntersectionConfig::default();
    config.timing.yellow_dwell = -0.5;
    assert!(config.validate().is_err());

    let mut config = IntersectionConfig::default();
    config.timing.service_interval = f64::NAN;
    assert!(config.validate().is_err());

    let mut config = IntersectionConfig::default();
    config.timing.time_scale = 0.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_rejects_delays_too_long_to_sleep() {
    let err = IntersectionConfig::from_toml_str("[timing]\nyellow_dwell = 1e20\n").unwrap_err();
    assert!(err.to_string().contains("yellow_dwell"), "{}", err);

    assert!(IntersectionConfig::from_toml_str("[timing]\ntime_scale = 1e30\n").is_err());
    assert!(IntersectionConfig::from_toml_str("[timing]\ncycle_pause = 3000.0\ntime_scale = 2.0\n").is_err());

    let mut config = IntersectionConfig::default();
    config.timing.service_interval = MAX_DELAY_SECS + 1.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_accepted_timing_converts_without_panic() -> Result<()> {
    let config = IntersectionConfig::from_toml_str(
        r#"
        [timing]
        yellow_dwell = 3600.0
        service_interval = 0.0
        cycle_pause = 0.001
        time_scale = 0.000001
        "#,
    )?;

    assert_eq!(config.timing.yellow_dwell(), Duration::from_secs(3600));
    assert_eq!(config.timing.service_interval(), Duration::ZERO);

    // Scaled down to a few milliseconds of real time
    let clock = ThreadClock::new(config.timing.time_scale);
    clock.sleep(config.timing.yellow_dwell());
    clock.sleep(config.timing.cycle_pause());
    Ok(())
}

#[test]
fn test_loads_config_from_disk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("custom.toml");
    fs::write(
        &path,
        r#"
        [[signals.approaches]]
        id = 1
        red = 5
        yellow = 6
        green = 13

        [[signals.approaches]]
        id = 2
        red = 19
        yellow = 26
        green = 21

        [[signals.approaches]]
        id = 3
        red = 20
        yellow = 16
        green = 12

        [timing]
        time_scale = 0.1
        "#,
    )?;

    let config = IntersectionConfig::load_from_file(&path)?;
    assert_eq!(config.signals.approaches[1], ApproachPins { id: 2, red: 19, yellow: 26, green: 21 });
    assert_eq!(config.timing.time_scale, 0.1);
    assert_eq!(config.demand.batch_size, BATCH_SIZE);

    fs::write(&path, "[timing]\nyellow_dwell = 1e20\n")?;
    assert!(IntersectionConfig::load_from_file(&path).is_err());
    Ok(())
}

#[test]
fn test_invalid_toml_reports_error() {
    assert!(IntersectionConfig::from_toml_str("[demand]\nbatch_size = \"ten\"").is_err());
    assert!(IntersectionConfig::from_toml_str("[demand]\nmin_queue = 5\nmax_queue = 2").is_err());
    assert!(IntersectionConfig::load_from_file("does-not-exist.toml").is_err());
}
