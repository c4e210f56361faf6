//! Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub boards: BoardsConfig,
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".questboard/questboard.db")
}

/// Sizes of the computed boards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardsConfig {
    /// Maximum entries on the request board.
    #[serde(default = "default_request_limit")]
    pub request_limit: usize,

    /// Maximum entries on the active quests board.
    #[serde(default = "default_active_quest_limit")]
    pub active_quest_limit: usize,

    /// Maximum entries on the timeline.
    #[serde(default = "default_timeline_limit")]
    pub timeline_limit: usize,
}

impl Default for BoardsConfig {
    fn default() -> Self {
        Self {
            request_limit: default_request_limit(),
            active_quest_limit: default_active_quest_limit(),
            timeline_limit: default_timeline_limit(),
        }
    }
}

fn default_request_limit() -> usize {
    20
}

fn default_active_quest_limit() -> usize {
    10
}

fn default_timeline_limit() -> usize {
    100
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Candidate config files, highest priority first.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".questboard/config.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".questboard").join("config.yaml"));
        }
        paths
    }

    /// Load the explicit file if given, otherwise the first config found on
    /// the search path, otherwise defaults. Environment overrides apply last.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => Self::search_paths()
                .into_iter()
                .find(|p| p.is_file())
                .map(|p| {
                    debug!(path = %p.display(), "Loading config");
                    Self::load(&p)
                })
                .transpose()?
                .unwrap_or_default(),
        };

        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `QUESTBOARD_*` overrides from the given lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = lookup("QUESTBOARD_DB_PATH") {
            self.server.db_path = PathBuf::from(db_path);
        }

        if let Some(limit) = lookup("QUESTBOARD_REQUEST_LIMIT").and_then(|v| v.parse().ok()) {
            self.boards.request_limit = limit;
        }

        if let Some(limit) = lookup("QUESTBOARD_ACTIVE_QUEST_LIMIT").and_then(|v| v.parse().ok()) {
            self.boards.active_quest_limit = limit;
        }

        if let Some(limit) = lookup("QUESTBOARD_TIMELINE_LIMIT").and_then(|v| v.parse().ok()) {
            self.boards.timeline_limit = limit;
        }
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.db_path, PathBuf::from(".questboard/questboard.db"));
        assert_eq!(config.boards.request_limit, 20);
        assert_eq!(config.boards.active_quest_limit, 10);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "boards:\n  request_limit: 5").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.boards.request_limit, 5);
        assert_eq!(config.boards.active_quest_limit, 10);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("QUESTBOARD_DB_PATH", "/tmp/qb.db"),
            ("QUESTBOARD_REQUEST_LIMIT", "7"),
            ("QUESTBOARD_ACTIVE_QUEST_LIMIT", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_with(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.server.db_path, PathBuf::from("/tmp/qb.db"));
        assert_eq!(config.boards.request_limit, 7);
        assert_eq!(config.boards.active_quest_limit, 10);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_or_default(Some(dir.path().join("absent.yaml").as_path())).is_err());
    }

    #[test]
    fn test_ensure_db_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.db_path = dir.path().join("nested").join("qb.db");
        config.ensure_db_dir().unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
