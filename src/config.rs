use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::db::models::DEFAULT_RATING;
use crate::services::retry::{Backoff, RetryPolicy};

pub const DEFAULT_K_FACTOR: f64 = 16.0;
pub const DEFAULT_BASELINE_RATING: f64 = 1000.0;
pub const DEFAULT_MASTERY_THRESHOLD: f64 = 1050.0;
pub const DEFAULT_MAX_CANDIDATES: usize = 3;
pub const DEFAULT_FOCUS_POOL: &str = "R,S";
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 100;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "./logs";

#[derive(Debug, Clone)]
pub struct Config {
    pub logging: LoggingConfig,
    pub curriculum: CurriculumConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            logging: LoggingConfig::from_env(),
            curriculum: CurriculumConfig::from_env(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory of the daily rolling log file; `None` keeps logs on stdout.
    pub file_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file_dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let level = std::env::var("RUST_LOG")
            .ok()
            .filter(|level| !level.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let file_dir = env_bool("ENABLE_FILE_LOGS", false).then(|| {
            std::env::var("LOG_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
        });

        Self { level, file_dir }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CurriculumConfig {
    pub elo: EloConfig,
    pub selection: SelectionConfig,
    pub retry: RetryPolicy,
}

impl CurriculumConfig {
    pub fn from_env() -> Self {
        Self {
            elo: EloConfig::from_env(),
            selection: SelectionConfig::from_env(),
            retry: retry_policy_from_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EloConfig {
    pub k_factor: f64,
    pub default_rating: f64,
    /// Fixed task-difficulty reference every unit is measured against.
    pub baseline_rating: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            k_factor: DEFAULT_K_FACTOR,
            default_rating: DEFAULT_RATING,
            baseline_rating: DEFAULT_BASELINE_RATING,
        }
    }
}

impl EloConfig {
    fn from_env() -> Self {
        Self {
            k_factor: env_f64("CURRICULUM_K_FACTOR", DEFAULT_K_FACTOR),
            default_rating: env_f64("CURRICULUM_DEFAULT_RATING", DEFAULT_RATING),
            baseline_rating: env_f64("CURRICULUM_BASELINE_RATING", DEFAULT_BASELINE_RATING),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub mastery_threshold: f64,
    pub default_rating: f64,
    pub max_candidates: usize,
    pub default_focus: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: DEFAULT_MASTERY_THRESHOLD,
            default_rating: DEFAULT_RATING,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            default_focus: split_units(DEFAULT_FOCUS_POOL),
        }
    }
}

impl SelectionConfig {
    fn from_env() -> Self {
        let default_focus = std::env::var("CURRICULUM_DEFAULT_FOCUS")
            .ok()
            .map(|raw| split_units(&raw))
            .filter(|units| !units.is_empty())
            .unwrap_or_else(|| split_units(DEFAULT_FOCUS_POOL));

        Self {
            mastery_threshold: env_f64("CURRICULUM_MASTERY_THRESHOLD", DEFAULT_MASTERY_THRESHOLD),
            default_rating: env_f64("CURRICULUM_DEFAULT_RATING", DEFAULT_RATING),
            max_candidates: env_u64("CURRICULUM_MAX_CANDIDATES", DEFAULT_MAX_CANDIDATES as u64)
                .max(1) as usize,
            default_focus,
        }
    }
}

fn retry_policy_from_env() -> RetryPolicy {
    let max_attempts = env_u32("CURRICULUM_RETRY_MAX_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS).max(1);
    let step_ms = env_u64("CURRICULUM_RETRY_BACKOFF_MS", DEFAULT_RETRY_BACKOFF_MS);
    RetryPolicy::new(max_attempts, Backoff::Linear(Duration::from_millis(step_ms)))
}

fn split_units(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|unit| !unit.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

pub(crate) fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}
