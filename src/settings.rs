use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::ceremony::Endpoint;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientSettings {
    pub server: ServerSettings,
    pub geofence: GeofenceSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Base URL of the relying party; endpoint paths are resolved against it
    pub url: String,
    pub register_start_path: String,
    pub register_finish_path: String,
    pub login_start_path: String,
    pub login_finish_path: String,
    /// Per-request timeout. Unset means requests wait as long as the network does.
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeofenceSettings {
    /// Refuse clock-ins from outside the fence before contacting the server
    pub enabled: bool,
    pub office_latitude: f64,
    pub office_longitude: f64,
    pub allowed_distance_meters: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

/// Invalid values found by [`ClientSettings::validate`]
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("invalid server url {url:?}: {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("invalid path {path:?} for {endpoint}")]
    InvalidPath { endpoint: Endpoint, path: String },

    #[error("invalid geofence: {0}")]
    InvalidGeofence(String),
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000".to_string(),
            register_start_path: Endpoint::RegisterStart.default_path().to_string(),
            register_finish_path: Endpoint::RegisterFinish.default_path().to_string(),
            login_start_path: Endpoint::LoginStart.default_path().to_string(),
            login_finish_path: Endpoint::LoginFinish.default_path().to_string(),
            request_timeout_seconds: None,
        }
    }
}

impl Default for GeofenceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            office_latitude: 37.7749,
            office_longitude: -122.4194,
            allowed_distance_meters: 100.0,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ServerSettings {
    /// Base URL with a trailing slash so that joined paths keep any prefix
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not an absolute URL.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        let mut base = Url::parse(&self.url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base)
    }

    /// Configured path of an endpoint
    #[must_use]
    pub fn path_for(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::RegisterStart => &self.register_start_path,
            Endpoint::RegisterFinish => &self.register_finish_path,
            Endpoint::LoginStart => &self.login_start_path,
            Endpoint::LoginFinish => &self.login_finish_path,
        }
    }
}

impl ClientSettings {
    /// Load settings from configuration files and environment variables,
    /// then initialize logging
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - The resulting settings fail validation
    pub fn load() -> anyhow::Result<Self> {
        Self::load_env_file();

        // Load base settings from TOML or defaults
        let mut settings = Self::load_base_settings()?;

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut settings);

        settings.validate()?;
        settings.initialize_logging();

        Ok(settings)
    }

    /// Parse settings from TOML text, filling unset values with defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed.
    pub fn from_toml_str(toml_content: &str) -> Result<Self, basic_toml::Error> {
        basic_toml::from_str(toml_content)
    }

    /// Read settings from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let toml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&toml_content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `CLOCKIN_CONFIG_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    fn load_base_settings() -> anyhow::Result<Self> {
        let mut settings = Self::default();

        let default_config_path = Path::new("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(default_config_path)?;
            log::debug!(
                "Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(config_dir) = std::env::var("CLOCKIN_CONFIG_DIR") {
            let config_path = Path::new(&config_dir).join("Settings.toml");
            if config_path.exists() {
                settings = Self::from_file(&config_path)?;
                log::debug!("Overriding settings from {}", config_path.display());
            } else {
                log::debug!(
                    "CLOCKIN_CONFIG_DIR set but no Settings.toml found at: {}",
                    config_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_server_env_overrides(&mut settings.server);
        Self::apply_geofence_env_overrides(&mut settings.geofence);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_server_env_overrides(server_settings: &mut ServerSettings) {
        if let Ok(url) = std::env::var("CLOCKIN_SERVER_URL") {
            server_settings.url = url;
        }
        if let Ok(timeout_str) = std::env::var("CLOCKIN_REQUEST_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                server_settings.request_timeout_seconds = (timeout > 0).then_some(timeout);
            }
        }
    }

    fn apply_geofence_env_overrides(geofence_settings: &mut GeofenceSettings) {
        if let Ok(enabled_str) = std::env::var("CLOCKIN_GEOFENCE_ENABLED") {
            if let Ok(enabled) = enabled_str.parse::<bool>() {
                geofence_settings.enabled = enabled;
            }
        }
        Self::apply_float_env_override(
            "CLOCKIN_OFFICE_LATITUDE",
            &mut geofence_settings.office_latitude,
        );
        Self::apply_float_env_override(
            "CLOCKIN_OFFICE_LONGITUDE",
            &mut geofence_settings.office_longitude,
        );
        Self::apply_float_env_override(
            "CLOCKIN_ALLOWED_DISTANCE_METERS",
            &mut geofence_settings.allowed_distance_meters,
        );
    }

    fn apply_float_env_override(env_var: &str, target: &mut f64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<f64>() {
                *target = value;
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Check values that would only fail later, mid-ceremony
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let base = self
            .server
            .base_url()
            .map_err(|e| SettingsError::InvalidServerUrl {
                url: self.server.url.clone(),
                reason: e.to_string(),
            })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(SettingsError::InvalidServerUrl {
                url: self.server.url.clone(),
                reason: format!("unsupported scheme {}", base.scheme()),
            });
        }

        for endpoint in Endpoint::ALL {
            let path = self.server.path_for(endpoint);
            if path.trim().is_empty() || base.join(path.trim_start_matches('/')).is_err() {
                return Err(SettingsError::InvalidPath {
                    endpoint,
                    path: path.to_string(),
                });
            }
        }

        if self.geofence.enabled {
            let fence = &self.geofence;
            crate::location::Location::new(fence.office_latitude, fence.office_longitude)
                .map_err(|e| SettingsError::InvalidGeofence(e.to_string()))?;
            if !fence.allowed_distance_meters.is_finite() || fence.allowed_distance_meters <= 0.0 {
                return Err(SettingsError::InvalidGeofence(format!(
                    "allowed distance must be positive, got {}",
                    fence.allowed_distance_meters
                )));
            }
        }

        Ok(())
    }

    /// Initialize `env_logger` with the configured level; later calls are no-ops
    pub fn initialize_logging(&self) {
        if env_logger::Builder::new()
            .parse_filters(&self.logging.level)
            .try_init()
            .is_err()
        {
            log::debug!("Logger already initialized, keeping existing configuration");
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }
}
