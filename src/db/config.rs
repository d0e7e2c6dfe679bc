use std::time::Duration;

use sqlx::sqlite::{SqliteJournalMode, SqliteSynchronous};
use thiserror::Error;

use crate::config::{env_bool, env_u32, env_u64};

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub sqlite: SqliteConfig,
    pub seed_prerequisites: bool,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, DbConfigError> {
        let url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or(DbConfigError::Missing {
                key: "DATABASE_URL",
            })?;

        Ok(Self {
            url,
            sqlite: SqliteConfig::from_env(),
            seed_prerequisites: env_bool("SEED_PREREQUISITES", true),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            sqlite: SqliteConfig {
                // every connection to `:memory:` opens a separate database
                max_connections: 1,
                journal_mode: SqliteJournalMode::Memory,
                ..SqliteConfig::default()
            },
            seed_prerequisites: false,
        }
    }

    /// The database lives only as long as its connection.
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub max_connections: u32,
    pub journal_mode: SqliteJournalMode,
    pub synchronous: SqliteSynchronous,
    pub busy_timeout: Duration,
    pub foreign_keys: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            journal_mode: SqliteJournalMode::Wal,
            synchronous: SqliteSynchronous::Full,
            busy_timeout: Duration::from_millis(5000),
            foreign_keys: true,
        }
    }
}

impl SqliteConfig {
    fn from_env() -> Self {
        let defaults = Self::default();

        let journal_mode = std::env::var("SQLITE_JOURNAL_MODE")
            .ok()
            .as_deref()
            .and_then(parse_journal_mode)
            .unwrap_or(defaults.journal_mode);

        let synchronous = std::env::var("SQLITE_SYNCHRONOUS")
            .ok()
            .as_deref()
            .and_then(parse_synchronous)
            .unwrap_or(defaults.synchronous);

        Self {
            max_connections: env_u32("DB_MAX_CONNECTIONS", defaults.max_connections).max(1),
            journal_mode,
            synchronous,
            busy_timeout: Duration::from_millis(env_u64("DB_BUSY_TIMEOUT_MS", 5000)),
            foreign_keys: env_bool("SQLITE_FOREIGN_KEYS", defaults.foreign_keys),
        }
    }
}

fn parse_journal_mode(value: &str) -> Option<SqliteJournalMode> {
    match value.to_ascii_uppercase().as_str() {
        "WAL" => Some(SqliteJournalMode::Wal),
        "DELETE" => Some(SqliteJournalMode::Delete),
        "TRUNCATE" => Some(SqliteJournalMode::Truncate),
        "PERSIST" => Some(SqliteJournalMode::Persist),
        "MEMORY" => Some(SqliteJournalMode::Memory),
        "OFF" => Some(SqliteJournalMode::Off),
        _ => None,
    }
}

fn parse_synchronous(value: &str) -> Option<SqliteSynchronous> {
    match value.to_ascii_uppercase().as_str() {
        "OFF" => Some(SqliteSynchronous::Off),
        "NORMAL" => Some(SqliteSynchronous::Normal),
        "FULL" => Some(SqliteSynchronous::Full),
        "EXTRA" => Some(SqliteSynchronous::Extra),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum DbConfigError {
    #[error("Missing required env var: {key}")]
    Missing { key: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pragmas_case_insensitively() {
        assert!(matches!(parse_journal_mode("wal"), Some(SqliteJournalMode::Wal)));
        assert!(matches!(parse_synchronous("Normal"), Some(SqliteSynchronous::Normal)));
        assert!(parse_journal_mode("sometimes").is_none());
    }

    #[test]
    fn in_memory_uses_single_connection() {
        let config = DbConfig::in_memory();
        assert_eq!(config.sqlite.max_connections, 1);
        assert!(!config.seed_prerequisites);
        assert!(config.is_in_memory());
    }

    #[test]
    fn file_urls_are_not_in_memory() {
        let config = DbConfig {
            url: "sqlite://data/curriculum.db".to_string(),
            ..DbConfig::in_memory()
        };
        assert!(!config.is_in_memory());
    }
}
