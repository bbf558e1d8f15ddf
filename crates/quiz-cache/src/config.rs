//! Configuration loading and resolution.
//!
//! Precedence is explicit value > environment variable > default.

use std::path::PathBuf;
use std::time::Duration;

use crate::types::{QuizError, QuizResult};

pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/AhtishamShakeel/quizzes/refs/heads/main/quizzes.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_SOURCE_URL: &str = "QUIZ_SOURCE_URL";
pub const ENV_CACHE_DIR: &str = "QUIZ_CACHE_DIR";
pub const ENV_TIMEOUT_SECS: &str = "QUIZ_SYNC_TIMEOUT_SECS";

/// Everything needed to build a `QuizCacheSync`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub source_url: String,
    pub cache_dir: PathBuf,
    pub timeout: Duration,
    pub user_agent: String,
}

/// Values given explicitly, usually from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source_url: Option<String>,
    pub cache_dir: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl SyncConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: &ConfigOverrides) -> QuizResult<Self> {
        Self::resolve_with(overrides, |name| std::env::var(name).ok())
    }

    /// Resolve using `env` for variable lookup.
    pub fn resolve_with<F>(overrides: &ConfigOverrides, env: F) -> QuizResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            env(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let source_url = overrides
            .source_url
            .clone()
            .or_else(|| read(ENV_SOURCE_URL))
            .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());

        if !(source_url.starts_with("http://") || source_url.starts_with("https://")) {
            return Err(QuizError::InvalidConfig(format!(
                "source url must be http(s): {source_url}"
            )));
        }

        let cache_dir = overrides
            .cache_dir
            .clone()
            .or_else(|| read(ENV_CACHE_DIR))
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_dir);

        let timeout_secs = overrides
            .timeout_secs
            .or_else(|| read(ENV_TIMEOUT_SECS).and_then(|v| v.parse::<u64>().ok()))
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        if timeout_secs == 0 {
            return Err(QuizError::InvalidConfig(
                "sync timeout must be at least one second".to_string(),
            ));
        }

        Ok(Self {
            source_url,
            cache_dir,
            timeout: Duration::from_secs(timeout_secs),
            user_agent: format!("quiz-cache/{}", env!("CARGO_PKG_VERSION")),
        })
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("quiznetic"))
        .unwrap_or_else(|| PathBuf::from(".quiznetic"))
}
