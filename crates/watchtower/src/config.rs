use std::{env, fmt, fs, io, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::DEFAULT_MIN_FREQUENCY;

/// Browser-like agent string sent with every probe
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:109.0) Gecko/20100101 Firefox/111.0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    ReadFailed { path: path::PathBuf, source: io::Error },

    #[error("failed to write config {path}: {source}")]
    WriteFailed { path: path::PathBuf, source: io::Error },

    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),

    #[error("no config directory available, set XDG_CONFIG_HOME or HOME")]
    ConfigPathUnavailable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub engine: EngineConfig,
    pub probe: ProbeConfig,
    pub scheduler: SchedulerConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Local libsql database file
    #[default]
    Libsql,
    /// Process memory, lost on exit
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: path::PathBuf,
    pub max_connections: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { backend: StoreBackend::Libsql, path: "watchtower.db".into(), max_connections: 16 }
    }
}

/// How a probe result is written back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Unconditional put. Overlapping writers to one record lose updates.
    #[default]
    Overwrite,
    /// Compare-and-swap against the record read at selection time
    Conditional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of targets read per cycle
    pub list_limit: usize,
    /// Maximum probes in flight per cycle, unbounded when unset
    pub max_in_flight: Option<usize>,
    pub write_mode: WriteMode,
    /// Floor applied to every check interval. Values under 60 are raised to 60.
    pub min_frequency_seconds: u64,
}

impl EngineConfig {
    /// Effective interval floor, never below [`DEFAULT_MIN_FREQUENCY`]
    pub fn frequency_floor(&self) -> u64 {
        self.min_frequency_seconds.max(DEFAULT_MIN_FREQUENCY)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            list_limit: 1000,
            max_in_flight: None,
            write_mode: WriteMode::Overwrite,
            min_frequency_seconds: DEFAULT_MIN_FREQUENCY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub user_agent: String,
    /// Per-request timeout. Unset leaves it to the transport.
    pub request_timeout_seconds: Option<u64>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { user_agent: DEFAULT_USER_AGENT.into(), request_timeout_seconds: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between two triggers
    pub tick_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { tick_seconds: 60 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:8080".into() }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/watchtower/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::var_os("HOME").map(path::PathBuf::from) {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("watchtower/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);
        let unset = |value: Option<String>| value.unwrap_or_else(|| "unset".into());

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Store")?;
        write_1(f, "Backend", &format!("{:?}", self.store.backend).to_lowercase())?;
        write_1(f, "Path", &self.store.path.display())?;
        write_1(f, "Max Connections", &self.store.max_connections)?;
        write_title_1(f, "Engine")?;
        write_1(f, "List Limit", &self.engine.list_limit)?;
        write_1(f, "Max In Flight", &unset(self.engine.max_in_flight.map(|n| n.to_string())))?;
        write_1(f, "Write Mode", &format!("{:?}", self.engine.write_mode).to_lowercase())?;
        write_1(f, "Min Frequency (s)", &self.engine.frequency_floor())?;
        write_title_1(f, "Probe")?;
        write_1(f, "User Agent", &self.probe.user_agent)?;
        write_1(
            f,
            "Request Timeout (s)",
            &unset(self.probe.request_timeout_seconds.map(|s| s.to_string())),
        )?;
        write_title_1(f, "Scheduler")?;
        write_1(f, "Tick (s)", &self.scheduler.tick_seconds)?;
        write_title_1(f, "Server")?;
        write_1(f, "Bind Address", &self.server.bind)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/watchtower/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    ///
    /// ```no_run
    /// let cfg = watchtower::Config::from_config(None::<&std::path::Path>)?;
    /// println!("{}", cfg);
    /// # Ok::<(), watchtower::config::ConfigError>(())
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::ReadFailed { path: config_path.clone(), source })?;
            Ok(toml::from_str(raw_string.as_str())?)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;
        let write_failed = |source| ConfigError::WriteFailed { path: path.to_path_buf(), source };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }

        fs::write(path, config_str).map_err(write_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let config = Config::from_config(Some(&path)).unwrap();

        assert_eq!(config, Config::default());
        assert!(path.exists());
        assert_eq!(Config::from_config(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[engine]\nmax_in_flight = 8\nwrite_mode = \"conditional\"\n").unwrap();

        let config = Config::from_config(Some(&path)).unwrap();

        assert_eq!(config.engine.max_in_flight, Some(8));
        assert_eq!(config.engine.write_mode, WriteMode::Conditional);
        assert_eq!(config.engine.list_limit, 1000);
        assert_eq!(config.engine.min_frequency_seconds, 60);
        assert_eq!(config.probe.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.probe.request_timeout_seconds, None);
    }

    #[test]
    fn test_frequency_floor_never_drops_below_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[engine]\nmin_frequency_seconds = 0\n").unwrap();

        let config = Config::from_config(Some(&path)).unwrap();
        assert_eq!(config.engine.frequency_floor(), 60);

        let raised = EngineConfig { min_frequency_seconds: 120, ..EngineConfig::default() };
        assert_eq!(raised.frequency_floor(), 120);
    }

    #[test]
    fn test_path_without_extension_is_normalized() {
        let dir = tempdir().unwrap();
        Config::from_config(Some(dir.path().join("settings"))).unwrap();

        assert!(dir.path().join("settings.toml").exists());
    }

    #[test]
    fn test_invalid_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[engine\n").unwrap();

        assert!(matches!(Config::from_config(Some(&path)), Err(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn test_display_lists_sections() {
        let rendered = Config::default().to_string();

        assert!(rendered.contains("Engine"));
        assert!(rendered.contains("Max In Flight: unset"));
        assert!(rendered.contains("Write Mode: overwrite"));
        assert!(rendered.contains("Bind Address: 0.0.0.0:8080"));
    }
}
