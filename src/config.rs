use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use clap::Parser;
use std::fs;
use tracing::{info, warn};

/// Name of the configuration file inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Longest session lifetime accepted, ten years
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365 * 10;
/// Slowest notification stream poll accepted, one hour
pub const MAX_NOTIFICATION_POLL_SECONDS: u64 = 60 * 60;
/// Longest gap between background sweeps, one week
pub const MAX_CRON_INTERVAL_MINUTES: u64 = 60 * 24 * 7;
/// Widest maintenance reminder window, ten years
pub const MAX_REMINDER_WINDOW_DAYS: u32 = 365 * 10;

/// Configuration for the assetdesk server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    /// Address the HTTP server listens on
    pub bind_address: String,
    /// How long a login stays valid, in hours
    pub session_ttl_hours: u64,
    /// How often the notification stream polls for new notifications
    pub notification_poll_seconds: u64,
    /// How often the background sweep runs; 0 disables it
    pub cron_interval_minutes: u64,
    /// Maintenance due within this many days triggers a reminder
    pub reminder_window_days: u32,
    /// Shared secret external schedulers present to `/api/cron`
    pub cron_secret: Option<String>,
    /// Directory for rolling log files, if file logging is wanted
    pub log_directory: Option<String>,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub bind_address: Option<String>,
    #[serde(default)]
    pub session_ttl_hours: Option<u64>,
    #[serde(default)]
    pub notification_poll_seconds: Option<u64>,
    #[serde(default)]
    pub cron_interval_minutes: Option<u64>,
    #[serde(default)]
    pub reminder_window_days: Option<u32>,
    #[serde(default)]
    pub cron_secret: Option<String>,
    #[serde(default)]
    pub log_directory: Option<String>,
    /// Server the CLI talks to; ignored by the server itself
    #[serde(default)]
    pub server_url: Option<String>,
}

/// Command line arguments for the server
#[derive(Parser, Debug, Default)]
#[clap(name = "assetdesk", about = "Asset management back office server")]
pub struct CliArgs {
    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Address to listen on, e.g. 0.0.0.0:3000
    #[clap(long, env = "ASSETDESK_BIND")]
    pub bind_address: Option<String>,

    /// Session lifetime in hours
    #[clap(long, env = "SESSION_TTL_HOURS")]
    pub session_ttl_hours: Option<u64>,

    /// Notification stream poll interval in seconds
    #[clap(long, env = "NOTIFICATION_POLL_SECONDS")]
    pub notification_poll_seconds: Option<u64>,

    /// Background sweep interval in minutes (0 disables)
    #[clap(long, env = "CRON_INTERVAL_MINUTES")]
    pub cron_interval_minutes: Option<u64>,

    /// Maintenance reminder window in days
    #[clap(long, env = "REMINDER_WINDOW_DAYS")]
    pub reminder_window_days: Option<u32>,

    /// Bearer secret for the cron endpoint
    #[clap(long, env = "CRON_SECRET")]
    pub cron_secret: Option<String>,

    /// Directory for rolling log files
    #[clap(long, env = "ASSETDESK_LOG_DIR")]
    pub log_directory: Option<String>,

    /// Debug mode
    #[clap(long, env = "ASSETDESK_DEBUG", default_value_t = false)]
    pub debug: bool,
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            bind_address: update.bind_address.unwrap_or(self.bind_address),
            session_ttl_hours: update.session_ttl_hours.unwrap_or(self.session_ttl_hours),
            notification_poll_seconds: update.notification_poll_seconds.unwrap_or(self.notification_poll_seconds),
            cron_interval_minutes: update.cron_interval_minutes.unwrap_or(self.cron_interval_minutes),
            reminder_window_days: update.reminder_window_days.unwrap_or(self.reminder_window_days),
            cron_secret: update.cron_secret.or(self.cron_secret),
            log_directory: update.log_directory.or(self.log_directory),
        }
    }

    /// Pulls every numeric setting into its accepted range
    ///
    /// Returns the adjusted config and one message per value that was changed.
    pub fn within_limits(mut self) -> (Self, Vec<String>) {
        let mut adjusted = Vec::new();

        if self.session_ttl_hours == 0 || self.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            let clamped = self.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS);
            adjusted.push(format!("session_ttl_hours {} is out of range, using {}", self.session_ttl_hours, clamped));
            self.session_ttl_hours = clamped;
        }
        if self.notification_poll_seconds == 0 || self.notification_poll_seconds > MAX_NOTIFICATION_POLL_SECONDS {
            let clamped = self.notification_poll_seconds.clamp(1, MAX_NOTIFICATION_POLL_SECONDS);
            adjusted.push(format!(
                "notification_poll_seconds {} is out of range, using {}",
                self.notification_poll_seconds, clamped
            ));
            self.notification_poll_seconds = clamped;
        }
        if self.cron_interval_minutes > MAX_CRON_INTERVAL_MINUTES {
            adjusted.push(format!(
                "cron_interval_minutes {} is out of range, using {}",
                self.cron_interval_minutes, MAX_CRON_INTERVAL_MINUTES
            ));
            self.cron_interval_minutes = MAX_CRON_INTERVAL_MINUTES;
        }
        if self.reminder_window_days > MAX_REMINDER_WINDOW_DAYS {
            adjusted.push(format!(
                "reminder_window_days {} is out of range, using {}",
                self.reminder_window_days, MAX_REMINDER_WINDOW_DAYS
            ));
            self.reminder_window_days = MAX_REMINDER_WINDOW_DAYS;
        }

        (self, adjusted)
    }

    /// Returns the session lifetime as a chrono Duration
    pub fn session_ttl(&self) -> chrono::Duration {
        let hours = self.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS);
        chrono::Duration::hours(i64::try_from(hours).unwrap_or(1))
    }

    /// Returns the notification poll interval, never shorter than one second
    pub fn notification_poll_interval(&self) -> Duration {
        Duration::from_secs(self.notification_poll_seconds.clamp(1, MAX_NOTIFICATION_POLL_SECONDS))
    }

    /// Returns the sweep interval, or None when the sweep is disabled
    pub fn cron_interval(&self) -> Option<Duration> {
        match self.cron_interval_minutes {
            0 => None,
            minutes => Some(Duration::from_secs(minutes.min(MAX_CRON_INTERVAL_MINUTES) * 60)),
        }
    }

    /// Returns the maintenance reminder window in days
    pub fn reminder_window(&self) -> i64 {
        i64::from(self.reminder_window_days.min(MAX_REMINDER_WINDOW_DAYS))
    }
}

/// Returns the base (default) configuration
pub fn base_config(config_path: Option<PathBuf>) -> Config {
    let database_url = config_path.map_or("assetdesk.db".to_string(), |path| path.join("assetdesk.db").to_string_lossy().to_string());

    Config {
        database_url,
        bind_address: "127.0.0.1:3000".to_string(),
        session_ttl_hours: 24 * 7,
        notification_poll_seconds: 30,
        cron_interval_minutes: 15,
        reminder_window_days: 3,
        cron_secret: None,
        log_directory: None,
    }
}

/// Loads configuration from a TOML file
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, String> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    match fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<ConfigUpdate>(&content) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                Ok(config)
            },
            Err(e) => Err(format!("Failed to parse config file {:?}: {}", config_path, e)),
        },
        Err(e) => Err(format!("Failed to read config file {:?}: {}", config_path, e)),
    }
}

/// Loads configuration from command line arguments
pub fn config_from_args(args: CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url,
        bind_address: args.bind_address,
        session_ttl_hours: args.session_ttl_hours,
        notification_poll_seconds: args.notification_poll_seconds,
        cron_interval_minutes: args.cron_interval_minutes,
        reminder_window_days: args.reminder_window_days,
        cron_secret: args.cron_secret,
        log_directory: args.log_directory,
        server_url: None,
    }
}

/// Returns the platform config directory, if it exists
pub fn get_config_dir_path() -> Option<PathBuf> {
    let Some(proj_dirs) = ProjectDirs::from("com", "assetdesk", "assetdesk") else {
        warn!("Could not determine XDG config directory, skipping config file");
        return None;
    };

    let path = proj_dirs.config_dir().to_path_buf();
    if !path.exists() {
        info!("Config path not found at {:?}, using defaults", path);
        return None;
    }
    Some(path)
}

/// A resolved configuration plus anything worth reporting about how it was built
///
/// Configuration is loaded before logging is set up, so problems are handed
/// back to the caller instead of being logged here.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// Unreadable config files and out-of-range values that were replaced
    pub warnings: Vec<String>,
}

/// Combines defaults, the config file in `config_dir` and command line
/// arguments, in order of increasing precedence
pub fn resolve_config(config_dir: Option<PathBuf>, args: CliArgs) -> LoadedConfig {
    let mut warnings = Vec::new();

    let base = base_config(config_dir.clone());
    let file_update = match config_from_file(config_dir.map(|dir| dir.join(CONFIG_FILE_NAME))) {
        Ok(update) => update,
        Err(e) => {
            warnings.push(format!("{}; ignoring the config file", e));
            ConfigUpdate::default()
        }
    };

    let (config, adjusted) = base
        .apply_update(file_update)
        .apply_update(config_from_args(args))
        .within_limits();
    warnings.extend(adjusted);

    LoadedConfig { config, warnings }
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line arguments
/// in order of increasing precedence
pub fn get_config(args: CliArgs) -> LoadedConfig {
    resolve_config(get_config_dir_path(), args)
}

#[cfg(test)]
mod tests;
