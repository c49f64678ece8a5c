//! Application configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::source::ArcGisConfig;

/// Default snapshot file.
pub const DEFAULT_DATA_PATH: &str = "transit_network.json";

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Default hours between background re-syncs.
pub const DEFAULT_SYNC_INTERVAL_HOURS: u64 = 24;

const SECS_PER_HOUR: u64 = 60 * 60;

/// Errors reading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be used
    #[error("invalid {var}={value:?}: {message}")]
    Invalid {
        var: &'static str,
        value: String,
        message: String,
    },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Feature source settings (portal URL, experience id)
    pub arcgis: ArcGisConfig,

    /// Where the network snapshot is stored
    pub data_path: PathBuf,

    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,

    /// Time between background re-syncs
    pub sync_interval: Duration,

    /// Serve fixtures from this directory instead of the portal
    pub mock_data_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Read `TRANSIT_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from any variable lookup.
    ///
    /// Unset or blank variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut arcgis = ArcGisConfig::default();
        if let Some(url) = get("TRANSIT_PORTAL_URL") {
            arcgis = arcgis.with_portal_url(url.trim_end_matches('/'));
        }
        if let Some(id) = get("TRANSIT_EXPERIENCE_ID") {
            arcgis = arcgis.with_experience_id(id);
        }

        let bind_raw = get("TRANSIT_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: "TRANSIT_BIND_ADDR",
            value: bind_raw.clone(),
            message: e.to_string(),
        })?;

        let sync_secs = match get("TRANSIT_SYNC_INTERVAL_HOURS") {
            None => DEFAULT_SYNC_INTERVAL_HOURS * SECS_PER_HOUR,
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        var: "TRANSIT_SYNC_INTERVAL_HOURS",
                        value: raw,
                        message: "must be at least 1".to_string(),
                    });
                }
                Ok(hours) => match hours.checked_mul(SECS_PER_HOUR) {
                    Some(secs) => secs,
                    None => {
                        return Err(ConfigError::Invalid {
                            var: "TRANSIT_SYNC_INTERVAL_HOURS",
                            value: raw,
                            message: "too large".to_string(),
                        });
                    }
                },
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "TRANSIT_SYNC_INTERVAL_HOURS",
                        value: raw,
                        message: e.to_string(),
                    });
                }
            },
        };

        Ok(Self {
            arcgis,
            data_path: get("TRANSIT_DATA_PATH")
                .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string())
                .into(),
            bind_addr,
            sync_interval: Duration::from_secs(sync_secs),
            mock_data_dir: get("TRANSIT_MOCK_DATA_DIR").map(PathBuf::from),
        })
    }
}
