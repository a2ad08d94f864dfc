use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How check-ins/outs get their coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    #[default]
    None,
    Fixed,
    Ip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub mode: LocationMode,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,
    #[serde(default = "default_location_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            mode: LocationMode::None,
            latitude: None,
            longitude: None,
            label: None,
            ip_lookup_url: default_ip_lookup_url(),
            timeout_ms: default_location_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_schedule_retry_secs")]
    pub schedule_retry_secs: u64,
    /// Daemon: seconds between sync passes while the server stays reachable.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub location: LocationConfig,
}

fn default_api_endpoint() -> String {
    "http://localhost:3000/api/attendance".to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1000
}
fn default_schedule_retry_secs() -> u64 {
    30
}
fn default_sync_interval_secs() -> u64 {
    300
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_ip_lookup_url() -> String {
    "https://ipapi.co/json/".to_string()
}
fn default_location_timeout_ms() -> u64 {
    15_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            api_endpoint: default_api_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            schedule_retry_secs: default_schedule_retry_secs(),
            sync_interval_secs: default_sync_interval_secs(),
            log_level: default_log_level(),
            location: LocationConfig::default(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rattendance")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".rattendance")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rattendance.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rattendance.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(1))
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location.timeout_ms)
    }

    /// Resolve a user-supplied database name against the config directory.
    pub fn resolve_db_path(name: &str) -> PathBuf {
        let p = Path::new(name);
        if p.is_absolute() || name == ":memory:" {
            p.to_path_buf()
        } else {
            Self::config_dir().join(p)
        }
    }

    /// Create the config directory and, unless `is_test`, write the config
    /// file. Returns the configuration that was written.
    pub fn init_all(custom_db: Option<&str>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();
        let db_path = match custom_db {
            Some(name) => Self::resolve_db_path(name),
            None => Self::database_file(),
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Self::default()
        };

        if !is_test {
            fs::create_dir_all(&dir)?;
            let yaml = serde_yaml::to_string(&config)?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: Config = serde_yaml::from_str("database: /tmp/a.sqlite\n").unwrap();
        assert_eq!(cfg.database, "/tmp/a.sqlite");
        assert_eq!(cfg.retry_attempts, 3);
        assert_eq!(cfg.retry_delay_ms, 1000);
        assert_eq!(cfg.schedule_retry_secs, 30);
        assert_eq!(cfg.sync_interval_secs, 300);
        assert_eq!(cfg.location.mode, LocationMode::None);
        assert_eq!(cfg.location.timeout_ms, 15_000);
    }

    #[test]
    fn location_section_parses() {
        let yaml = "database: x.sqlite\nlocation:\n  mode: fixed\n  latitude: 45.07\n  longitude: 7.68\n  label: Office\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.location.mode, LocationMode::Fixed);
        assert_eq!(cfg.location.latitude, Some(45.07));
        assert_eq!(cfg.location.label.as_deref(), Some("Office"));
    }
}
