//! Sensor settings
//!
//! Settings are layered with the `config` crate: serde defaults, then an
//! optional settings file, then `SPEEDTEST_SENSOR_*` environment variables.

use config::{Config, Environment, File, Map};
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::errors::Result;

/// Environment variable prefix, e.g. `SPEEDTEST_SENSOR_MAX_ATTEMPTS=5`
pub const ENV_PREFIX: &str = "SPEEDTEST_SENSOR";

/// Executable looked up on `PATH` when no explicit path is configured
pub const DEFAULT_SPEEDTEST_COMMAND: &str = "speedtest";

/// Tunables for invoking the speedtest CLI
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    /// Path to the speedtest executable
    pub speedtest_path: Option<PathBuf>,
    /// Total attempts when the tool reports rate limiting
    pub max_attempts: u32,
    /// First backoff delay in seconds, doubled after every rate-limited attempt
    pub initial_backoff_secs: u64,
    /// Pass `--accept-license --accept-gdpr` so the tool never prompts
    pub accept_license: bool,
    /// Pin the measurement to a specific server
    pub server_id: Option<u32>,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            speedtest_path: None,
            max_attempts: 3,
            initial_backoff_secs: 10,
            accept_license: true,
            server_id: None,
        }
    }
}

impl SensorSettings {
    /// Loads settings from an optional file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load), reading `SPEEDTEST_SENSOR_*` variables from
    /// `env` instead of the process environment when given
    pub fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!("Loading sensor settings from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        debug!("Resolved sensor settings: {:?}", settings);
        Ok(settings)
    }

    /// The executable to run: an explicit override wins over the configured path
    pub fn speedtest_command(&self, override_path: Option<&Path>) -> PathBuf {
        override_path
            .map(Path::to_path_buf)
            .or_else(|| self.speedtest_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SPEEDTEST_COMMAND))
    }
}
