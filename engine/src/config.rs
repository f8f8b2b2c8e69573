use serde::Deserialize;
use std::{env, fs, io, path::Path, path::PathBuf};
use thiserror::Error;

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Default, Deserialize)]
pub struct WayfinderConfig {
    pub app: Option<AppConfig>,
    pub content: Option<ContentConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentConfig {
    /// Directory of `<exploration-id>.json` files. `${VAR}` references are expanded.
    pub dir: Option<String>,
}

/// Replaces `${VAR}` with the value of `VAR`, or nothing when unset.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + len];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + len + 1..];
    }

    out.push_str(rest);
    out
}

impl WayfinderConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Reads `path`, treating a missing file as no configuration.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.app
            .as_ref()
            .and_then(|app| app.log_filter.as_deref())
            .unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Configured content directory, or `~/.wayfinder/explorations`.
    #[must_use]
    pub fn content_dir(&self) -> Option<PathBuf> {
        match self.content.as_ref().and_then(|content| content.dir.as_deref()) {
            Some(dir) => Some(PathBuf::from(expand_env_vars(dir))),
            None => wayfinder_dir().map(|dir| dir.join("explorations")),
        }
    }
}

/// `~/.wayfinder`, home of the config file, logs, and default content.
#[must_use]
pub fn wayfinder_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".wayfinder"))
}

pub fn config_path() -> Option<PathBuf> {
    wayfinder_dir().map(|dir| dir.join("config.toml"))
}
