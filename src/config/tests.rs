use super::validation::validate_config;
use super::*;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

const FULL_CONFIG: &str = r#"
latitude = 51.5074
longitude = -0.1278
timezone = "Europe/London"
baud_rate = 57600
read_timeout_ms = 2000
greeting = "Lights Ready:"
post_sunset_policy = "next_dawn"
polar_retry_secs = 600
log_file = "/var/log/duskswitch.log"

[[groups]]
name = "porch"
channel = 1

[[groups]]
name = "garden"
channel = 2

[[groups]]
name = "drive"
channel = 3
"#;

#[test]
fn test_defaults_match_reference_installation() {
    let config = Config::default();
    assert!(validate_config(&config).is_ok());

    let location = config.location().unwrap();
    assert_eq!(location.latitude, 47.763212);
    assert_eq!(location.longitude, -122.0684);
    assert_eq!(location.timezone, chrono_tz::Tz::US__Pacific);

    let link = config.link_settings();
    assert_eq!(link.baud_rate, 115_200);
    assert_eq!(link.greeting, "Remote Light Controller:");
    assert_eq!(link.read_timeout, Duration::from_millis(5_000));

    assert_eq!(config.fixture(), Fixture::default());
    assert_eq!(config.post_sunset_policy(), PostSunsetPolicy::Legacy);
    assert_eq!(config.polar_retry_interval(), Duration::from_secs(3_600));
    assert_eq!(config.log_file_path(), PathBuf::from("lights.log"));
}

#[test]
fn test_parse_full_config() {
    let config = parse(FULL_CONFIG).unwrap();

    assert_eq!(config.timezone().unwrap(), chrono_tz::Tz::Europe__London);
    assert_eq!(config.link_settings().baud_rate, 57_600);
    assert_eq!(config.link_settings().greeting, "Lights Ready:");
    assert_eq!(config.post_sunset_policy(), PostSunsetPolicy::NextDawn);
    assert_eq!(config.polar_retry_interval(), Duration::from_secs(600));

    let fixture = config.fixture();
    let names: Vec<&str> = fixture
        .groups()
        .iter()
        .map(|g| g.name.as_str())
        .collect();
    assert_eq!(names, vec!["porch", "garden", "drive"]);
}

#[test]
fn test_partial_config_keeps_defaults() {
    let config = parse("latitude = 10.0\n").unwrap();
    assert_eq!(config.location().unwrap().latitude, 10.0);
    assert_eq!(config.location().unwrap().longitude, -122.0684);
    assert_eq!(config.fixture(), Fixture::default());
}

#[test]
fn test_channels_remain_configurable() {
    let config = parse(
        r#"
[[groups]]
name = "south"
channel = 7

[[groups]]
name = "north"
channel = 9
"#,
    )
    .unwrap();

    let channels: Vec<u32> = config.fixture().groups().iter().map(|g| g.channel).collect();
    assert_eq!(channels, vec![7, 9]);
}

#[test]
fn test_invalid_coordinates_rejected() {
    let result = parse("latitude = 95.0\n");
    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("latitude"));

    assert!(parse("longitude = -200.0\n").is_err());
}

#[test]
fn test_unknown_timezone_rejected() {
    let result = parse("timezone = \"Mars/Olympus_Mons\"\n");
    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("unknown timezone"));
}

#[test]
fn test_read_timeout_must_be_bounded() {
    assert!(parse("read_timeout_ms = 0\n").is_err());
    assert!(parse("read_timeout_ms = 99\n").is_err());
    assert!(parse("read_timeout_ms = 100\n").is_ok());
    assert!(parse("read_timeout_ms = 600001\n").is_err());
}

#[test]
fn test_polar_retry_range() {
    assert!(parse("polar_retry_secs = 59\n").is_err());
    assert!(parse("polar_retry_secs = 86400\n").is_ok());
    assert!(parse("polar_retry_secs = 86401\n").is_err());
}

#[test]
fn test_zero_baud_rejected() {
    assert!(parse("baud_rate = 0\n").is_err());
}

#[test]
fn test_greeting_is_trimmed() {
    let config = parse("greeting = \"  Lights Ready: \"\n").unwrap();
    assert_eq!(config.link_settings().greeting, "Lights Ready:");
}

#[test]
fn test_empty_greeting_rejected() {
    assert!(parse("greeting = \"  \"\n").is_err());
}

#[test]
fn test_unknown_post_sunset_policy_rejected() {
    assert!(parse("post_sunset_policy = \"whenever\"\n").is_err());
}

#[test]
fn test_group_validation() {
    assert!(parse("groups = []\n").is_err());

    let duplicate_channel = r#"
[[groups]]
name = "south"
channel = 4

[[groups]]
name = "north"
channel = 4
"#;
    let result = parse(duplicate_channel);
    assert!(format!("{:#}", result.unwrap_err()).contains("channel 4"));

    let duplicate_name = r#"
[[groups]]
name = "south"
channel = 4

[[groups]]
name = "south"
channel = 12
"#;
    assert!(parse(duplicate_name).is_err());
}

#[test]
fn test_malformed_toml_rejected() {
    assert!(parse("latitude = \n").is_err());
    assert!(parse("latitude = \"north\"\n").is_err());
}

#[test]
fn test_load_from_explicit_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("duskswitch.toml");
    fs::write(&path, FULL_CONFIG).unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.fixture().groups().len(), 3);
}

#[test]
fn test_missing_explicit_path_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let result = Config::load(Some(&path));
    assert!(format!("{:#}", result.unwrap_err()).contains("not found"));
}

#[test]
fn test_invalid_file_reports_its_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "latitude = 123.0\n").unwrap();

    let message = format!("{:#}", load_from_path(&path).unwrap_err());
    assert!(message.contains("broken.toml"));
}

#[test]
#[serial]
fn test_default_location_file_is_optional() {
    let temp_dir = tempdir().unwrap();

    // Save and restore XDG_CONFIG_HOME
    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let without_file = Config::load(None);

    let config_dir = temp_dir.path().join("duskswitch");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("duskswitch.toml"), "polar_retry_secs = 120\n").unwrap();
    let with_file = Config::load(None);

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    assert_eq!(without_file.unwrap(), Config::default());
    assert_eq!(
        with_file.unwrap().polar_retry_interval(),
        Duration::from_secs(120)
    );
}
