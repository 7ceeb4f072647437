use crate::shared::errors::{AppError, AppResult};
use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "ufo_sightings.db";

/// Runtime configuration, read from the environment (and `.env` when present)
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub database_url: String,
    pub import_file: Option<PathBuf>,
    pub pool_size: u32,
}

impl AppConfig {
    /// Load `.env` and read configuration from the process environment
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let import_file = lookup("IMPORT_FILE")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let pool_size = match lookup("DB_POOL_SIZE") {
            Some(raw) => {
                let size: u32 = raw.trim().parse().map_err(|e| {
                    AppError::ConfigError(format!("DB_POOL_SIZE '{}': {}", raw, e))
                })?;
                if size == 0 {
                    return Err(AppError::ConfigError(
                        "DB_POOL_SIZE must be at least 1".to_string(),
                    ));
                }
                size
            }
            None => Self::default_pool_size(),
        };

        Ok(Self {
            database_url,
            import_file,
            pool_size,
        })
    }

    /// Pool size based on CPU count, capped for a single-writer SQLite store
    fn default_pool_size() -> u32 {
        let cpu_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        std::cmp::min(cpu_count * 2, 8) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert!(config.import_file.is_none());
        assert!(config.pool_size >= 1);
    }

    #[test]
    fn reads_all_values() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "/tmp/sightings.db"),
            ("IMPORT_FILE", "data/sightings.json"),
            ("DB_POOL_SIZE", "3"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "/tmp/sightings.db");
        assert_eq!(
            config.import_file,
            Some(PathBuf::from("data/sightings.json"))
        );
        assert_eq!(config.pool_size, 3);
    }

    #[test]
    fn rejects_bad_pool_size() {
        let err = AppConfig::from_lookup(lookup_from(&[("DB_POOL_SIZE", "many")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));

        let err = AppConfig::from_lookup(lookup_from(&[("DB_POOL_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
