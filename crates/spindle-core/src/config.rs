//! Config - 実行設定
//!
//! JSON ファイルから読み込む。項目はすべて省略可能で、省略時は既定値。
//!
//! ```json
//! {
//!   "database": "spindle.db",
//!   "root": "http://example.test/",
//!   "retry": { "max_attempts": 5 },
//!   "worker": { "max_tasks": null },
//!   "log": { "json": false }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app::{RetryPolicy, WorkerConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpindleConfig {
    /// SQLite database file holding the task store.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Discovery root, used to seed an empty store.
    #[serde(default)]
    pub root: Option<String>,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub worker: WorkerLimits,

    #[serde(default)]
    pub log: LogConfig,
}

/// Worker limits that are not part of the retry policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerLimits {
    #[serde(default)]
    pub max_tasks: Option<usize>,
}

fn default_database() -> PathBuf {
    PathBuf::from("spindle.db")
}

impl Default for SpindleConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            root: None,
            retry: RetryPolicy::default(),
            worker: WorkerLimits::default(),
            log: LogConfig::default(),
        }
    }
}

impl SpindleConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            retry: self.retry,
            max_tasks: self.worker.max_tasks,
        }
    }
}
