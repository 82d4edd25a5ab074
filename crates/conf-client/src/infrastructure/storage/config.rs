//! TOML-based configuration for the conference client.
//!
//! Reads and writes [`ClientConfig`] at the platform-appropriate location:
//! - Windows:  `%APPDATA%\ConfClient\config.toml`
//! - Linux:    `~/.config/confclient/config.toml`
//! - macOS:    `~/Library/Application Support/ConfClient/config.toml`
//!
//! An explicit path (the `--config` flag) overrides the platform location.
//!
//! ```toml
//! [client]
//! username = "client"
//! local_ip = "127.0.0.1"
//! local_port = 5061
//! log_level = "info"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 5060
//! request_timeout_ms = 5000
//!
//! [display]
//! canvas_width = 1920
//! canvas_height = 1080
//! camera_width = 320
//! camera_height = 240
//! layout = "single-row-shrink"
//! jpeg_quality = 80
//! frame_interval_ms = 100
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "some_fn")]`, so a file that sets
//! only `server.host` is still a complete configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use conf_core::{media::codec::DEFAULT_JPEG_QUALITY, CanvasSize, LayoutPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::manage_session::SignalingEndpoints;

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

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub client: IdentityConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Who this client is and where it listens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityConfig {
    /// User part of the `from` URI.
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_local_ip")]
    pub local_ip: String,
    #[serde(default = "default_local_port")]
    pub local_port: u16,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Session server address and request timeout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Local preview settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,
    #[serde(default = "default_camera_width")]
    pub camera_width: u32,
    #[serde(default = "default_camera_height")]
    pub camera_height: u32,
    /// `"single-row-shrink"` or `"wrap-grid"`.
    #[serde(default)]
    pub layout: LayoutPolicy,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_username() -> String {
    "client".to_string()
}
fn default_local_ip() -> String {
    "127.0.0.1".to_string()
}
fn default_local_port() -> u16 {
    5061
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_server_host() -> String {
    "127.0.0.1".to_string()
}
fn default_server_port() -> u16 {
    5060
}
fn default_request_timeout_ms() -> u64 {
    5000
}
fn default_canvas_width() -> u32 {
    1920
}
fn default_canvas_height() -> u32 {
    1080
}
fn default_camera_width() -> u32 {
    320
}
fn default_camera_height() -> u32 {
    240
}
fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}
fn default_frame_interval_ms() -> u64 {
    100
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            local_ip: default_local_ip(),
            local_port: default_local_port(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            camera_width: default_camera_width(),
            camera_height: default_camera_height(),
            layout: LayoutPolicy::default(),
            jpeg_quality: default_jpeg_quality(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

// ── Derived values ────────────────────────────────────────────────────────────

impl ServerConfig {
    /// `host:port` for the TCP adapter.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl DisplayConfig {
    pub fn canvas(&self) -> CanvasSize {
        CanvasSize::new(self.canvas_width, self.canvas_height)
    }

    pub fn camera(&self) -> CanvasSize {
        CanvasSize::new(self.camera_width, self.camera_height)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl ClientConfig {
    /// The `from`/`to` URIs placed on every signaling request.
    pub fn endpoints(&self) -> SignalingEndpoints {
        SignalingEndpoints::new(
            &self.client.username,
            &self.client.local_ip,
            self.client.local_port,
            &self.server.host,
            self.server.port,
        )
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the default config file path for this platform.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot
/// be determined from the environment.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the configuration from `path`, or from [`config_file_path`] when
/// `path` is `None`.  A missing file yields [`ClientConfig::default`].
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(source) => Err(ConfigError::Io { path, source }),
    }
}

/// Writes `config` to `path` as pretty TOML, creating parent directories.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &ClientConfig, path: &Path) -> Result<(), ConfigError> {
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

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("ConfClient"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("confclient"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("ConfClient")
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

    /// A unique scratch path under the system temp directory.
    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("confclient-test-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_default_config_matches_documented_values() {
        // Arrange / Act
        let cfg = ClientConfig::default();

        // Assert
        assert_eq!(cfg.client.username, "client");
        assert_eq!(cfg.client.local_port, 5061);
        assert_eq!(cfg.server.address(), "127.0.0.1:5060");
        assert_eq!(cfg.server.request_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.display.canvas(), CanvasSize::new(1920, 1080));
        assert_eq!(cfg.display.layout, LayoutPolicy::SingleRowShrink);
        assert_eq!(cfg.display.jpeg_quality, 80);
    }

    #[test]
    fn test_partial_toml_fills_missing_fields_with_defaults() {
        let cfg: ClientConfig = toml::from_str(
            r#"
            [server]
            host = "10.0.0.5"

            [display]
            layout = "wrap-grid"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.host, "10.0.0.5");
        assert_eq!(cfg.server.port, 5060);
        assert_eq!(cfg.display.layout, LayoutPolicy::WrapGrid);
        assert_eq!(cfg.client, IdentityConfig::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let cfg: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_unknown_layout_is_parse_error() {
        let result: Result<ClientConfig, _> = toml::from_str("[display]\nlayout = \"spiral\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_endpoints_built_from_config() {
        let mut cfg = ClientConfig::default();
        cfg.client.username = "bob".to_string();
        cfg.server.host = "conf.example".to_string();

        let ep = cfg.endpoints();

        assert_eq!(ep.from_uri, "sip:bob@127.0.0.1:5061");
        assert_eq!(ep.to_uri, "sip:server@conf.example:5060");
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let cfg = load_config(Some(scratch_path("absent.toml").as_path())).unwrap();
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        // Arrange
        let path = scratch_path("config.toml");
        let mut cfg = ClientConfig::default();
        cfg.server.port = 7000;
        cfg.display.layout = LayoutPolicy::WrapGrid;

        // Act
        save_config(&cfg, &path).unwrap();
        let restored = load_config(Some(path.as_path())).unwrap();

        // Assert
        assert_eq!(restored, cfg);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let path = scratch_path("bad.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[server\nport = ").unwrap();

        let err = load_config(Some(path.as_path())).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
