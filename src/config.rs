use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "follow-reconciler";

/// Runtime settings shared by the CLI and the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR).join("follow.db"))
        .unwrap_or_else(|| PathBuf::from("follow.db"))
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: default_db_path(),
            listen: default_listen(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// `<config_dir>/follow-reconciler/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Load from the default location (if present), then apply env overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Config::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config: {:?}", path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// FOLLOW_RECONCILER_DB / _LISTEN / _LOG win over file values
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup("FOLLOW_RECONCILER_DB") {
            self.db_path = PathBuf::from(db);
        }
        if let Some(listen) = lookup("FOLLOW_RECONCILER_LISTEN") {
            self.listen = listen;
        }
        if let Some(filter) = lookup("FOLLOW_RECONCILER_LOG") {
            self.log_filter = filter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = Config::from_toml(r#"listen = "127.0.0.1:8080""#).unwrap();

        assert_eq!(config.listen, "127.0.0.1:8080");
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.db_path, default_db_path());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("FOLLOW_RECONCILER_DB", "/tmp/x.db"),
            ("FOLLOW_RECONCILER_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.listen, "0.0.0.0:3000");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "db_path = \"data/follow.db\"\nlog_filter = \"warn\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.db_path, PathBuf::from("data/follow.db"));
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_bad_toml_is_error() {
        assert!(Config::from_toml("listen = [").is_err());
    }
}
