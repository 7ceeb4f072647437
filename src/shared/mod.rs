// Shared Kernel
// Cross-cutting concerns used by every module

pub mod config; // Environment-driven configuration
pub mod errors; // Shared error types
pub mod infrastructure; // Shared infrastructure (database)
pub mod utils; // Shared utilities (logging)

// Re-exports for convenience
pub use config::AppConfig;
pub use utils::init_logger;
pub use infrastructure::database::Database;
