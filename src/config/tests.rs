use super::*;
use tempfile::{tempdir, TempDir};
use std::fs::File;
use std::io::Write;

/// Helper function to create a test configuration file
fn create_test_config_file(dir: &TempDir, content: &str) -> PathBuf {
    let config_path = dir.path().join(CONFIG_FILE_NAME);
    let mut file = File::create(&config_path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    config_path
}

fn sample_config() -> Config {
    Config {
        database_url: "original.db".to_string(),
        bind_address: "127.0.0.1:4000".to_string(),
        session_ttl_hours: 12,
        notification_poll_seconds: 10,
        cron_interval_minutes: 5,
        reminder_window_days: 2,
        cron_secret: None,
        log_directory: None,
    }
}

/// Tests for Config::apply_update
#[test]
fn test_apply_update_with_all_values() {
    let update = ConfigUpdate {
        database_url: Some("updated.db".to_string()),
        bind_address: Some("0.0.0.0:8080".to_string()),
        session_ttl_hours: Some(1),
        notification_poll_seconds: Some(60),
        cron_interval_minutes: Some(0),
        reminder_window_days: Some(7),
        cron_secret: Some("s3cret".to_string()),
        log_directory: Some("/var/log/assetdesk".to_string()),
        server_url: Some("http://ignored".to_string()),
    };

    let updated = sample_config().apply_update(update);

    assert_eq!(updated.database_url, "updated.db");
    assert_eq!(updated.bind_address, "0.0.0.0:8080");
    assert_eq!(updated.session_ttl_hours, 1);
    assert_eq!(updated.notification_poll_seconds, 60);
    assert_eq!(updated.cron_interval_minutes, 0);
    assert_eq!(updated.reminder_window_days, 7);
    assert_eq!(updated.cron_secret.as_deref(), Some("s3cret"));
    assert_eq!(updated.log_directory.as_deref(), Some("/var/log/assetdesk"));
}

#[test]
fn test_apply_update_with_partial_values() {
    let update = ConfigUpdate {
        database_url: Some("updated.db".to_string()),
        ..Default::default()
    };

    let updated = sample_config().apply_update(update);

    assert_eq!(updated.database_url, "updated.db");
    assert_eq!(updated.bind_address, "127.0.0.1:4000"); // Unchanged
    assert_eq!(updated.session_ttl_hours, 12); // Unchanged
}

#[test]
fn test_apply_update_keeps_existing_secret() {
    let mut config = sample_config();
    config.cron_secret = Some("from-file".to_string());

    let updated = config.apply_update(ConfigUpdate::default());

    assert_eq!(updated.cron_secret.as_deref(), Some("from-file"));
}

/// Tests for the duration helpers
#[test]
fn test_duration_helpers() {
    let config = sample_config();
    assert_eq!(config.session_ttl(), chrono::Duration::hours(12));
    assert_eq!(config.notification_poll_interval(), Duration::from_secs(10));
    assert_eq!(config.cron_interval(), Some(Duration::from_secs(5 * 60)));
}

#[test]
fn test_cron_interval_zero_disables_sweep() {
    let mut config = sample_config();
    config.cron_interval_minutes = 0;
    assert_eq!(config.cron_interval(), None);
}

#[test]
fn test_poll_interval_never_zero() {
    let mut config = sample_config();
    config.notification_poll_seconds = 0;
    assert_eq!(config.notification_poll_interval(), Duration::from_secs(1));
}

/// Tests for base_config
#[test]
fn test_base_config_defaults() {
    let config = base_config(None);

    assert_eq!(config.database_url, "assetdesk.db");
    assert_eq!(config.bind_address, "127.0.0.1:3000");
    assert_eq!(config.session_ttl_hours, 168);
    assert_eq!(config.notification_poll_seconds, 30);
    assert_eq!(config.cron_interval_minutes, 15);
    assert_eq!(config.reminder_window_days, 3);
    assert!(config.cron_secret.is_none());
}

#[test]
fn test_base_config_with_path() {
    let temp_dir = tempdir().unwrap();
    let config = base_config(Some(temp_dir.path().to_path_buf()));

    let expected_db_path = temp_dir.path().join("assetdesk.db").to_string_lossy().to_string();
    assert_eq!(config.database_url, expected_db_path);
}

/// Tests for config_from_args
#[test]
fn test_config_from_args_with_values() {
    let args = CliArgs {
        database_url: Some("args.db".to_string()),
        cron_secret: Some("token".to_string()),
        reminder_window_days: Some(10),
        debug: true,
        ..Default::default()
    };

    let update = config_from_args(args);

    assert_eq!(update.database_url, Some("args.db".to_string()));
    assert_eq!(update.cron_secret, Some("token".to_string()));
    assert_eq!(update.reminder_window_days, Some(10));
    assert_eq!(update.bind_address, None);
    assert_eq!(update.server_url, None);
}

#[test]
fn test_config_from_args_with_no_values() {
    let update = config_from_args(CliArgs::default());
    assert_eq!(update, ConfigUpdate::default());
}

/// Tests for config_from_file - successful cases
#[test]
fn test_config_from_file_with_no_path() {
    let update = config_from_file(None).unwrap();
    assert_eq!(update, ConfigUpdate::default());
}

#[test]
fn test_config_from_file_with_valid_toml() {
    let temp_dir = tempdir().unwrap();
    let config_content = r#"
        database_url = "file.db"
        bind_address = "0.0.0.0:9000"
        session_ttl_hours = 48
        cron_interval_minutes = 60
        cron_secret = "abc"
        server_url = "http://assets.internal:9000"
    "#;

    let config_path = create_test_config_file(&temp_dir, config_content);

    let result = config_from_file(Some(config_path));

    assert!(result.is_ok(), "Failed to parse config file: {}", result.err().unwrap());
    let update = result.unwrap();
    assert_eq!(update.database_url, Some("file.db".to_string()));
    assert_eq!(update.bind_address, Some("0.0.0.0:9000".to_string()));
    assert_eq!(update.session_ttl_hours, Some(48));
    assert_eq!(update.cron_interval_minutes, Some(60));
    assert_eq!(update.cron_secret, Some("abc".to_string()));
    assert_eq!(update.server_url, Some("http://assets.internal:9000".to_string()));
    assert_eq!(update.notification_poll_seconds, None);
}

/// Tests for config_from_file - failure cases
#[test]
fn test_config_from_file_with_invalid_toml() {
    let temp_dir = tempdir().unwrap();
    let config_content = r#"
        database_url = "file.db"
        session_ttl_hours = "forever" # Type error
    "#;

    let config_path = create_test_config_file(&temp_dir, config_content);

    assert!(config_from_file(Some(config_path)).is_err());
}

#[test]
fn test_config_from_file_with_nonexistent_file() {
    let temp_dir = tempdir().unwrap();
    let nonexistent_path = temp_dir.path().join("nonexistent_config.toml");

    let update = config_from_file(Some(nonexistent_path)).unwrap();
    assert_eq!(update, ConfigUpdate::default());
}

/// Precedence: args override file values, which override base values
#[test]
fn test_config_precedence() {
    let args = CliArgs {
        database_url: Some("args.db".to_string()),
        ..Default::default()
    };

    let file_update = ConfigUpdate {
        database_url: Some("file.db".to_string()),
        session_ttl_hours: Some(2),
        ..Default::default()
    };

    let config = base_config(None)
        .apply_update(file_update)
        .apply_update(config_from_args(args));

    assert_eq!(config.database_url, "args.db");
    assert_eq!(config.session_ttl_hours, 2); // From file
    assert_eq!(config.bind_address, "127.0.0.1:3000"); // From base
}

/// Out-of-range numbers are pulled back into range and reported
#[test]
fn test_within_limits_clamps_and_reports() {
    let config = Config {
        session_ttl_hours: u64::MAX,
        notification_poll_seconds: 0,
        cron_interval_minutes: u64::MAX,
        reminder_window_days: u32::MAX,
        ..sample_config()
    };

    let (config, adjusted) = config.within_limits();

    assert_eq!(config.session_ttl_hours, MAX_SESSION_TTL_HOURS);
    assert_eq!(config.notification_poll_seconds, 1);
    assert_eq!(config.cron_interval_minutes, MAX_CRON_INTERVAL_MINUTES);
    assert_eq!(config.reminder_window_days, MAX_REMINDER_WINDOW_DAYS);
    assert_eq!(adjusted.len(), 4);
    assert!(adjusted[0].contains("session_ttl_hours"));
}

/// Values already in range pass through untouched
#[test]
fn test_within_limits_keeps_valid_values() {
    let (config, adjusted) = sample_config().within_limits();
    assert_eq!(config, sample_config());
    assert!(adjusted.is_empty());

    // Zero still switches the sweep off
    let (config, adjusted) = Config { cron_interval_minutes: 0, ..sample_config() }.within_limits();
    assert_eq!(config.cron_interval(), None);
    assert!(adjusted.is_empty());
}

/// The duration accessors never overflow, even on an unclamped config
#[test]
fn test_duration_accessors_are_bounded() {
    let config = Config {
        session_ttl_hours: u64::MAX,
        notification_poll_seconds: u64::MAX,
        cron_interval_minutes: u64::MAX,
        reminder_window_days: u32::MAX,
        ..sample_config()
    };

    assert_eq!(config.session_ttl(), chrono::Duration::hours(MAX_SESSION_TTL_HOURS as i64));
    assert_eq!(config.notification_poll_interval(), Duration::from_secs(MAX_NOTIFICATION_POLL_SECONDS));
    assert_eq!(config.cron_interval(), Some(Duration::from_secs(MAX_CRON_INTERVAL_MINUTES * 60)));
    assert_eq!(config.reminder_window(), i64::from(MAX_REMINDER_WINDOW_DAYS));

    let config = Config { session_ttl_hours: 0, ..sample_config() };
    assert_eq!(config.session_ttl(), chrono::Duration::hours(1));
}

/// A config file that cannot be parsed is skipped and reported to the caller
#[test]
fn test_resolve_config_reports_bad_file() {
    let dir = tempdir().unwrap();
    create_test_config_file(&dir, "session_ttl_hours = \"forever\"");

    let loaded = resolve_config(Some(dir.path().to_path_buf()), CliArgs::default());

    assert_eq!(loaded.config.session_ttl_hours, 24 * 7);
    assert_eq!(loaded.warnings.len(), 1);
    assert!(loaded.warnings[0].contains("Failed to parse config file"));
}

/// A good config file is applied beneath the command line and clamped
#[test]
fn test_resolve_config_applies_file_and_args() {
    let dir = tempdir().unwrap();
    create_test_config_file(&dir, "bind_address = \"0.0.0.0:8080\"\nreminder_window_days = 4000000000\n");
    let args = CliArgs {
        session_ttl_hours: Some(5),
        ..Default::default()
    };

    let loaded = resolve_config(Some(dir.path().to_path_buf()), args);

    assert_eq!(loaded.config.bind_address, "0.0.0.0:8080");
    assert_eq!(loaded.config.session_ttl_hours, 5);
    assert_eq!(loaded.config.reminder_window_days, MAX_REMINDER_WINDOW_DAYS);
    assert_eq!(loaded.warnings.len(), 1);
    assert!(loaded.warnings[0].contains("reminder_window_days"));
    assert!(loaded.config.database_url.ends_with("assetdesk.db"));
}
