use crate::log_info;
use crate::shared::config::AppConfig;
use crate::shared::errors::AppError;
use crate::shared::utils::logger::{LogContext, TimedOperation};
use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const IN_MEMORY_URL: &str = ":memory:";

/// Per-connection SQLite settings applied when the pool opens a connection
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout_ms
        ))
        .map_err(r2d2::Error::QueryError)
    }
}

#[derive(Debug)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open the database described by the application configuration
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Self::open(&config.database_url, config.pool_size)
    }

    /// Open a pooled SQLite database at `database_url`
    pub fn open(database_url: &str, pool_size: u32) -> Result<Self, AppError> {
        let database_url = Self::validate_database_url(database_url)?;

        // Every in-memory connection is its own database, so keep exactly one
        let (max_size, min_idle) = if database_url == IN_MEMORY_URL {
            (1, 1)
        } else {
            let max_size = std::cmp::max(1, pool_size);
            (max_size, std::cmp::min(2, max_size))
        };

        let manager = ConnectionManager::<SqliteConnection>::new(database_url.clone());
        let mut builder = r2d2::Pool::builder()
            .max_size(max_size)
            .min_idle(Some(min_idle))
            .connection_timeout(Duration::from_secs(10))
            .test_on_check_out(true)
            .connection_customizer(Box::new(SqlitePragmas {
                busy_timeout_ms: 5_000,
            }));

        builder = if database_url == IN_MEMORY_URL {
            // Closing the only connection would drop the database
            builder.idle_timeout(None).max_lifetime(None)
        } else {
            builder
                .idle_timeout(Some(Duration::from_secs(300))) // Close idle connections after 5 minutes
                .max_lifetime(Some(Duration::from_secs(1800))) // Replace connections after 30 minutes
        };

        let pool = builder.build(manager).map_err(|e| {
            AppError::DatabaseError(format!("Failed to create connection pool: {}", e))
        })?;

        log_info!(
            "Database connection pool initialized for '{}' with max_size: {}, min_idle: {}",
            database_url,
            pool.max_size(),
            min_idle
        );

        Ok(Self { pool })
    }

    /// Strip an optional `sqlite://` scheme and reject empty locations
    fn validate_database_url(database_url: &str) -> Result<String, AppError> {
        let trimmed = database_url.trim();
        let location = trimmed.strip_prefix("sqlite://").unwrap_or(trimmed);

        if location.is_empty() {
            return Err(AppError::ConfigError(
                "Database URL must name a SQLite file or :memory:".to_string(),
            ));
        }

        Ok(location.to_string())
    }

    pub fn get_connection(&self) -> Result<DbConnection, AppError> {
        let start = std::time::Instant::now();

        match self.pool.get() {
            Ok(conn) => {
                let duration = start.elapsed().as_millis() as u64;
                if duration > 100 {
                    LogContext::performance_metric("db_connection_acquire", duration, Some("slow"));
                }
                Ok(conn)
            }
            Err(e) => {
                LogContext::error_with_context(
                    &e,
                    "Failed to acquire database connection from pool",
                );
                Err(AppError::from(e))
            }
        }
    }

    /// Apply any embedded migrations that have not run yet
    pub fn run_migrations(&self) -> Result<usize, AppError> {
        let timer = TimedOperation::new("run_migrations");
        let mut conn = self.get_connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| AppError::DatabaseError(format!("Failed to run migrations: {}", e)))?;

        timer.finish();
        log_info!("Database migrations completed ({} applied)", applied.len());
        Ok(applied.len())
    }

    /// Get pool statistics for monitoring
    pub fn pool_status(&self) -> PoolStatus {
        let state = self.pool.state();
        PoolStatus {
            connections: state.connections,
            idle_connections: state.idle_connections,
            max_size: self.pool.max_size(),
        }
    }
}

#[derive(Debug)]
pub struct PoolStatus {
    pub connections: u32,
    pub idle_connections: u32,
    pub max_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_sqlite_scheme() {
        assert_eq!(
            Database::validate_database_url("sqlite://data/ufo.db").unwrap(),
            "data/ufo.db"
        );
        assert_eq!(
            Database::validate_database_url("  ufo.db ").unwrap(),
            "ufo.db"
        );
    }

    #[test]
    fn rejects_empty_url() {
        assert!(Database::validate_database_url("").is_err());
        assert!(Database::validate_database_url("sqlite://").is_err());
    }

    #[test]
    fn in_memory_database_migrates() {
        let db = Database::open(IN_MEMORY_URL, 4).unwrap();
        assert_eq!(db.pool_status().max_size, 1);
        assert!(db.run_migrations().unwrap() >= 1);
        // Second run has nothing left to apply
        assert_eq!(db.run_migrations().unwrap(), 0);
    }
}
