//! TOML-based configuration persistence for the dashboard sender.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\DashboardSender\config.toml`
//! - Linux:    `~/.config/dashboard-sender/config.toml`
//! - macOS:    `~/Library/Application Support/DashboardSender/config.toml`
//!
//! Example file:
//!
//! ```toml
//! [sender]
//! log_level = "info"
//!
//! [identity]
//! user = "alice"
//!
//! [session]
//! app_url = "http://openflint.github.io/dashboard-demo/receiver/index.html"
//! application_id = "~dashboard"
//! namespace = "urn:flint:tv.matchstick.demo.dashboard"
//! connect_timeout_secs = 15
//! launch_timeout_secs = 30
//!
//! [feed]
//! max_lines = 200
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "some_fn")]`, so a missing file, a
//! missing section and a missing key all fall back to the defaults above.

use std::path::{Path, PathBuf};
use std::time::Duration;

use dashboard_core::domain::feed::DEFAULT_MAX_LINES;
use dashboard_core::protocol::DASHBOARD_NAMESPACE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::session_manager::{
    SessionSettings, DEFAULT_APPLICATION_ID, DEFAULT_APP_URL,
};
use crate::infrastructure::session_actor::{
    SessionTimeouts, DEFAULT_CONNECT_TIMEOUT, DEFAULT_LAUNCH_TIMEOUT,
};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level sender configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub sender: SenderConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

/// General sender behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SenderConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// The local participant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdentityConfig {
    /// Display name.  When absent a guest name is generated and saved here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Dashboard application and lifecycle bounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// URL of the receiver page launched on the device.
    #[serde(default = "default_app_url")]
    pub app_url: String,
    /// Application identifier of the receiver.
    #[serde(default = "default_application_id")]
    pub application_id: String,
    /// Channel namespace shared with the receiver page.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Seconds to wait for a connection before failing.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Seconds to wait for the application launch before failing.
    #[serde(default = "default_launch_timeout_secs")]
    pub launch_timeout_secs: u64,
}

/// Dashboard feed display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    /// Number of lines kept, newest first.
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_app_url() -> String {
    DEFAULT_APP_URL.to_string()
}
fn default_application_id() -> String {
    DEFAULT_APPLICATION_ID.to_string()
}
fn default_namespace() -> String {
    DASHBOARD_NAMESPACE.to_string()
}
fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}
fn default_launch_timeout_secs() -> u64 {
    DEFAULT_LAUNCH_TIMEOUT.as_secs()
}
fn default_max_lines() -> usize {
    DEFAULT_MAX_LINES
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_url: default_app_url(),
            application_id: default_application_id(),
            namespace: default_namespace(),
            connect_timeout_secs: default_connect_timeout_secs(),
            launch_timeout_secs: default_launch_timeout_secs(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_lines: default_max_lines(),
        }
    }
}

impl From<&AppConfig> for SessionSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            app_url: cfg.session.app_url.clone(),
            namespace: cfg.session.namespace.clone(),
            feed_max_lines: cfg.feed.max_lines,
        }
    }
}

impl From<&AppConfig> for SessionTimeouts {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            connect: Duration::from_secs(cfg.session.connect_timeout_secs),
            launch: Duration::from_secs(cfg.session.launch_timeout_secs),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("DashboardSender"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("dashboard-sender"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("DashboardSender")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("dashboard_sender_test_{}", Uuid::new_v4()))
            .join("config.toml")
    }

    // ── AppConfig defaults ────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_targets_dashboard_receiver() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(
            cfg.session.app_url,
            "http://openflint.github.io/dashboard-demo/receiver/index.html"
        );
        assert_eq!(cfg.session.application_id, "~dashboard");
        assert_eq!(
            cfg.session.namespace,
            "urn:flint:tv.matchstick.demo.dashboard"
        );
    }

    #[test]
    fn test_app_config_default_timeouts_and_feed() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.session.connect_timeout_secs, 15);
        assert_eq!(cfg.session.launch_timeout_secs, 30);
        assert_eq!(cfg.feed.max_lines, 200);
        assert_eq!(cfg.sender.log_level, "info");
        assert_eq!(cfg.identity.user, None);
    }

    #[test]
    fn test_session_settings_and_timeouts_follow_config() {
        // Arrange
        let mut cfg = AppConfig::default();
        cfg.session.namespace = "urn:custom".to_string();
        cfg.session.connect_timeout_secs = 5;
        cfg.feed.max_lines = 20;

        // Act
        let settings = SessionSettings::from(&cfg);
        let timeouts = SessionTimeouts::from(&cfg);

        // Assert
        assert_eq!(settings.namespace, "urn:custom");
        assert_eq!(settings.feed_max_lines, 20);
        assert_eq!(timeouts.connect, Duration::from_secs(5));
        assert_eq!(timeouts.launch, Duration::from_secs(30));
    }

    // ── TOML parsing ──────────────────────────────────────────────────────────

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_deserialize_partial_session_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[session]
launch_timeout_secs = 60
[identity]
user = "alice"
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.session.launch_timeout_secs, 60);
        assert_eq!(cfg.session.connect_timeout_secs, 15);
        assert_eq!(cfg.identity.user.as_deref(), Some("alice"));
    }

    #[test]
    fn test_missing_user_is_omitted_from_toml() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        assert!(!toml_str.contains("user"), "None user must be omitted");
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_parse_error() {
        let result: Result<AppConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    // ── load / save ───────────────────────────────────────────────────────────

    #[test]
    fn test_load_config_from_missing_file_returns_default() {
        let cfg = load_config_from(&temp_path()).expect("missing file is not an error");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_save_and_load_config_round_trip_via_temp_dir() {
        // Arrange
        let path = temp_path();
        let mut cfg = AppConfig::default();
        cfg.identity.user = Some("guest0427".to_string());
        cfg.sender.log_level = "debug".to_string();

        // Act
        save_config_to(&cfg, &path).expect("save");
        let loaded = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_load_config_from_malformed_file_is_parse_error() {
        let path = temp_path();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).unwrap();
        }
        std::fs::write(&path, "[session\nbroken").unwrap();

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(
                path.ends_with("config.toml"),
                "config file must be named config.toml, got {path:?}"
            );
        }
    }
}
