//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, LogFormat};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "TINYSERIAL";

/// Config file name
const CONFIG_FILE_NAME: &str = "tinyserial.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "TINYSERIAL_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `TINYSERIAL_CONFIG` environment variable (explicit path)
    /// 2. `./tinyserial.toml` (current directory)
    /// 3. `$XDG_CONFIG_HOME/tinyserial/tinyserial.toml` or `%APPDATA%` on Windows
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };
        apply_env_overrides(&mut config)?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        let _ = apply_env_overrides(&mut config);

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

/// Per-user config file location, whether or not it exists.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join("tinyserial").join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn env_value<T: FromStr>(key: &str, expected: &'static str) -> ConfigResult<Option<T>> {
    let var = format!("{}_{}", ENV_PREFIX, key);
    match std::env::var(&var) {
        Ok(value) => match value.trim().parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::Env {
                var,
                value,
                expected,
            }),
        },
        Err(_) => Ok(None),
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Variables follow the pattern `TINYSERIAL_<SECTION>_<KEY>`, for example
/// `TINYSERIAL_SERIAL_PORT=COM7` or `TINYSERIAL_DEMO_COUNT=100`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some(val) = env_value::<String>("SERIAL_PORT", "port name")? {
        config.serial.port = val;
    }
    if let Some(val) = env_value("SERIAL_BAUD_RATE", "baud rate")? {
        config.serial.baud_rate = val;
    }
    if let Some(val) = env_value("SERIAL_SETTLE_MS", "settle delay")? {
        config.serial.settle_ms = val;
    }

    if let Some(val) = env_value("DEMO_COUNT", "message count")? {
        config.demo.count = val;
    }
    if let Some(val) = env_value("DEMO_INTERVAL_MS", "interval")? {
        config.demo.interval_ms = val;
    }
    if let Some(val) = env_value("DEMO_BUFFER_SIZE", "buffer size")? {
        config.demo.buffer_size = val;
    }
    if let Some(val) = env_value("DEMO_DRAIN_MS", "drain delay")? {
        config.demo.drain_ms = val;
    }

    if let Some(val) = env_value::<String>("LOGGING_LEVEL", "log level")? {
        config.logging.level = val;
    }
    if let Some(val) = env_value::<String>("LOGGING_FORMAT", "log format")? {
        config.logging.format = match val.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => {
                return Err(ConfigError::Env {
                    var: format!("{}_LOGGING_FORMAT", ENV_PREFIX),
                    value: val,
                    expected: "log format (json, pretty, compact)",
                })
            }
        };
    }

    Ok(())
}
