use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("scale must be a positive number, got {0}")]
    InvalidScale(f64),
}

/// Host settings. Every field is optional in the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root that script modules resolve against
    pub data_dir: PathBuf,
    pub module_extension: String,
    /// File loaded when a module name resolves to a directory
    pub init_file: String,
    /// Module the prelude imports and runs
    pub entry_module: String,
    pub scale: f64,

    // Script limits, 0 means unlimited
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_expr_depth: usize,

    pub double_click_ms: u64,

    pub log_filter: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            module_extension: "rhai".to_string(),
            init_file: "init.rhai".to_string(),
            entry_module: "core".to_string(),
            scale: 1.0,

            max_operations: 0,
            max_call_levels: 64,
            max_expr_depth: 64,

            double_click_ms: 400,

            log_filter: "warn".to_string(),
            log_file: None,
        }
    }
}

/// `data/` next to the executable if present, else relative to the cwd
fn default_data_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("data")))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from("data"))
}

impl Settings {
    /// Uses ~/.config/plume/ on all platforms for consistency
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("plume"))
    }

    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load from the default config file and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let file = Self::config_file();
        Self::load_from(file.as_deref(), |key| env::var(key).ok())
    }

    /// Load from `file` (skipped when missing) with overrides looked up
    /// through `env`
    pub fn load_from(
        file: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut settings = match file {
            Some(path) if path.is_file() => Self::from_file(path)?,
            _ => Self::default(),
        };
        settings.apply_env(env)?;
        if !(settings.scale.is_finite() && settings.scale > 0.0) {
            return Err(ConfigError::InvalidScale(settings.scale));
        }
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(dir) = env("PLUME_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(value) = env("PLUME_SCALE") {
            self.scale = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: "PLUME_SCALE",
                value,
            })?;
        }
        Ok(())
    }

    /// Where the log goes: the configured file, else the user cache dir
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join("plume").join("plume.log")))
    }
}
