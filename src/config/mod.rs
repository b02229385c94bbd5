//! Operator configuration for the batch jobs.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use dirs::home_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::CategoryType;
use crate::utils::persistence::replace_file;

const DEFAULT_DIR_NAME: &str = ".category_reconcile";
const CONFIG_FILE: &str = "config.json";
const STORE_DIR: &str = "store";

/// Environment variable overriding the application data directory.
pub const HOME_ENV: &str = "CATEGORY_RECONCILE_HOME";

/// Label written on salary role children that have no name source.
pub const DEFAULT_UNNAMED_PLACEHOLDER: &str = "غير محدد";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serde(String),
}

/// Tunables shared by every job. Missing keys fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Directory of the JSON document store. Defaults to `<home>/store`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_root: Option<PathBuf>,
    #[serde(default = "Config::default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub default_type: CategoryType,
    #[serde(default = "Config::default_unnamed_placeholder")]
    pub unnamed_placeholder: String,
    #[serde(default = "Config::default_salary_label")]
    pub salary_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_plan: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_roster: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_root: None,
            batch_size: Self::default_batch_size(),
            default_type: CategoryType::default(),
            unnamed_placeholder: Self::default_unnamed_placeholder(),
            salary_label: Self::default_salary_label(),
            seed_plan: None,
            salary_roster: None,
        }
    }
}

impl Config {
    pub fn default_batch_size() -> usize {
        500
    }

    pub fn default_unnamed_placeholder() -> String {
        DEFAULT_UNNAMED_PLACEHOLDER.into()
    }

    pub fn default_salary_label() -> String {
        "Salary".into()
    }

    /// Batches are never empty even if the file says otherwise.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    pub fn resolve_store_root(&self, base: &Path) -> PathBuf {
        match &self.store_root {
            Some(path) => path.clone(),
            None => base.join(STORE_DIR),
        }
    }
}

/// Returns the application data directory, defaulting to `~/.category_reconcile`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Handles persistence of [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            base_dir,
            config_path,
        }
    }

    pub fn with_base_dir(base: PathBuf) -> Self {
        let config_path = base.join(CONFIG_FILE);
        Self {
            base_dir: base,
            config_path,
        }
    }

    pub fn from_env() -> Self {
        Self::with_base_dir(app_data_dir())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.config_path.exists() {
            let data = fs::read_to_string(&self.config_path)?;
            serde_json::from_str(&data).map_err(|err| ConfigError::Serde(err.to_string()))
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)
            .map_err(|err| ConfigError::Serde(err.to_string()))?;
        replace_file(&self.config_path, &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf());
        let config = manager.load().expect("load");
        assert_eq!(config, Config::default());
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.default_type, CategoryType::Expense);
        assert_eq!(
            config.resolve_store_root(manager.base_dir()),
            dir.path().join("store")
        );
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf());
        fs::write(manager.config_path(), r#"{ "batch_size": 0, "salary_label": "Payroll" }"#)
            .expect("write");
        let config = manager.load().expect("load");
        assert_eq!(config.salary_label, "Payroll");
        assert_eq!(config.effective_batch_size(), 1);
        assert_eq!(config.unnamed_placeholder, DEFAULT_UNNAMED_PLACEHOLDER);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let manager = ConfigManager::new(dir.path().join("nested").join("config.json"));
        let config = Config {
            store_root: Some(dir.path().join("data")),
            default_type: CategoryType::Revenue,
            ..Config::default()
        };
        manager.save(&config).expect("save");
        assert_eq!(manager.load().expect("load"), config);
    }

    #[test]
    fn malformed_file_is_a_serde_error() {
        let dir = tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf());
        fs::write(manager.config_path(), "{ not json").expect("write");
        assert!(matches!(manager.load(), Err(ConfigError::Serde(_))));
    }
}
