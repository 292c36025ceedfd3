//! ABOUTME: Configuration management with validation and environment loading
//! ABOUTME: Handles detection, alarm, snapshot, and notification settings from files and env

use config::{Config as ConfigBuilder, Environment, File};
use fw_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use validator::Validate;

/// Main configuration struct
#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub detection: DetectionConfig,
    #[validate(nested)]
    pub snapshot: SnapshotConfig,
    #[validate(nested)]
    pub alarm: AlarmConfig,
    #[validate(nested)]
    pub notify: NotifyConfig,
    #[validate(nested)]
    pub capture: CaptureConfig,
    #[validate(nested)]
    pub controls: ControlsConfig,
    pub telemetry: TelemetryConfig,
}

/// Motion and face-gating parameters
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct DetectionConfig {
    /// Frames are resized to this width before processing
    #[validate(range(min = 32, max = 4096))]
    pub frame_width: u32,
    /// Gaussian sigma applied after grayscale conversion
    #[validate(range(min = 0.0, max = 50.0))]
    pub blur_sigma: f32,
    /// Per-pixel intensity difference that counts as changed
    #[validate(range(min = 1, max = 254))]
    pub pixel_threshold: u8,
    /// Motion score a frame must exceed to count as a motion frame
    pub motion_threshold: u64,
    /// Debounce counter value that must be exceeded before escalation
    #[validate(range(min = 1, max = 100000))]
    pub alarm_threshold: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            frame_width: 500,
            blur_sigma: 3.5, // 21x21 kernel equivalent
            pixel_threshold: 25,
            motion_threshold: 300,
            alarm_threshold: 20,
        }
    }
}

/// Snapshot persistence and throttling
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Minimum seconds between two snapshot batches
    #[validate(range(min = 1, max = 86400))]
    pub interval_secs: u64,
    /// Directory that holds snapshots until their alert is sent
    #[validate(length(min = 1))]
    pub dir: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            dir: "./snapshots".to_string(),
        }
    }
}

impl SnapshotConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Alarm sound settings
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct AlarmConfig {
    /// Wall-clock bound of one alarm episode
    #[validate(range(min = 1, max = 300))]
    pub duration_secs: u64,
    /// Sound file handed to the player; no sound file means a silent alarm
    pub sound_path: Option<String>,
    /// External player program invoked once per sound cycle
    #[validate(length(min = 1))]
    pub player: String,
    /// Cycle length of the silent alarm
    #[validate(range(min = 10, max = 10000))]
    pub silent_cycle_ms: u64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            duration_secs: 3,
            sound_path: None,
            player: "aplay".to_string(),
            silent_cycle_ms: 500,
        }
    }
}

impl AlarmConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn silent_cycle(&self) -> Duration {
        Duration::from_millis(self.silent_cycle_ms)
    }
}

/// Alert message settings
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct NotifyConfig {
    #[validate(email)]
    pub sender: String,
    #[validate(email)]
    pub recipient: String,
    #[validate(length(min = 1))]
    pub subject: String,
    #[validate(nested)]
    pub smtp: Option<SmtpConfig>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            sender: "facewatch@example.com".to_string(),
            recipient: "alerts@example.com".to_string(),
            subject: "Alert: Multiple People Detected!".to_string(),
            smtp: None,
        }
    }
}

/// SMTP configuration
#[derive(Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct SmtpConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Frame source settings
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct CaptureConfig {
    /// Directory of still images replayed as a video feed
    pub source_dir: Option<String>,
    /// Restart the image sequence when it runs out instead of failing
    pub loop_sequence: bool,
    /// Camera index for the OpenCV source
    #[validate(range(min = 0, max = 64))]
    pub device: i32,
    /// Haar cascade XML for the OpenCV face detector
    pub cascade_path: Option<String>,
    /// Bounded wait for control input after each frame
    #[validate(range(min = 1, max = 1000))]
    pub poll_interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            loop_sequence: false,
            device: 0,
            cascade_path: None,
            poll_interval_ms: 30,
        }
    }
}

impl CaptureConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Single-key bindings for the two control inputs
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ControlsConfig {
    #[validate(length(equal = 1))]
    pub toggle_key: String,
    #[validate(length(equal = 1))]
    pub quit_key: String,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            toggle_key: "t".to_string(),
            quit_key: "q".to_string(),
        }
    }
}

impl ControlsConfig {
    pub fn toggle(&self) -> char {
        self.toggle_key.chars().next().unwrap_or('t')
    }

    pub fn quit(&self) -> char {
        self.quit_key.chars().next().unwrap_or('q')
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from defaults, an optional `facewatch.toml`, and
    /// `FACEWATCH_`-prefixed environment variables (highest priority)
    ///
    /// Nested keys use a double underscore, e.g.
    /// `FACEWATCH_DETECTION__ALARM_THRESHOLD=30`.
    pub fn load() -> Result<Self> {
        let mut builder =
            ConfigBuilder::builder().add_source(ConfigBuilder::try_from(&Config::default())?);

        if std::path::Path::new("facewatch.toml").exists() {
            builder = builder.add_source(File::with_name("facewatch").required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("FACEWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build config: {}", e)))?;

        let parsed: Config = config
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to deserialize config: {}", e)))?;

        parsed.check()?;
        Ok(parsed)
    }

    /// Validate field ranges and cross-field rules
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| Error::Config(format!("Config validation failed: {}", e)))?;

        if self.controls.toggle() == self.controls.quit() {
            return Err(Error::Config(
                "Config validation failed: toggle and quit keys must differ".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Serialize tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "FACEWATCH_DETECTION__ALARM_THRESHOLD",
        "FACEWATCH_SNAPSHOT__INTERVAL_SECS",
        "FACEWATCH_NOTIFY__SMTP__PASSWORD",
        "FACEWATCH_NOTIFY__SMTP__USERNAME",
        "FACEWATCH_CONTROLS__QUIT_KEY",
    ];

    fn clear_env() {
        for key in VARS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_config_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();

        let config = Config::load().expect("Should load with defaults");

        assert_eq!(config.detection.frame_width, 500);
        assert_eq!(config.detection.pixel_threshold, 25);
        assert_eq!(config.detection.motion_threshold, 300);
        assert_eq!(config.detection.alarm_threshold, 20);
        assert_eq!(config.snapshot.interval(), Duration::from_secs(5));
        assert_eq!(config.alarm.duration(), Duration::from_secs(3));
        assert!(config.notify.smtp.is_none());
        assert_eq!(config.controls.toggle(), 't');
        assert_eq!(config.controls.quit(), 'q');
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_config_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();

        env::set_var("FACEWATCH_DETECTION__ALARM_THRESHOLD", "35");
        env::set_var("FACEWATCH_SNAPSHOT__INTERVAL_SECS", "12");

        let config = Config::load().expect("Should load from env");

        assert_eq!(config.detection.alarm_threshold, 35);
        assert_eq!(config.snapshot.interval_secs, 12);

        clear_env();
    }

    #[test]
    fn test_config_validation_failure() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();

        env::set_var("FACEWATCH_DETECTION__ALARM_THRESHOLD", "0");
        let result = Config::load();
        assert!(result.is_err());

        clear_env();
    }

    #[test]
    fn test_zero_snapshot_interval_rejected() {
        let mut config = Config::default();
        config.snapshot.interval_secs = 0;
        assert!(config.check().is_err());

        config.snapshot.interval_secs = 1;
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_identical_control_keys_rejected() {
        let mut config = Config::default();
        config.controls.quit_key = "t".to_string();
        assert!(config.check().is_err());
    }

    #[test]
    fn test_smtp_password_redacted() {
        let mut config = Config::default();
        config.notify.smtp = Some(SmtpConfig {
            username: "watcher@example.com".to_string(),
            password: "super-secret-app-password".to_string(),
            ..Default::default()
        });

        let debug_output = format!("{:?}", config);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-app-password"));
    }

    #[test]
    fn test_log_format_serde() {
        let json = serde_json::to_string(&LogFormat::Json).unwrap();
        assert_eq!(json, "\"json\"");
        let parsed: LogFormat = serde_json::from_str("\"pretty\"").unwrap();
        assert_eq!(parsed, LogFormat::Pretty);
    }
}
