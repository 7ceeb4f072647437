//! Isolated test database backed by a temporary SQLite file
//!
//! Each test gets its own directory that is removed when the `TestDb` drops.
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use ufo_sightings_lib::modules::sightings::SqliteSightingStore;
use ufo_sightings_lib::shared::Database;

pub struct TestDb {
    dir: TempDir,
    db: Arc<Database>,
    store: Arc<SqliteSightingStore>,
}

impl TestDb {
    /// Fresh, fully migrated database in its own temp directory
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("sightings.db");

        let db = Database::open(path.to_str().expect("temp path is not UTF-8"), 4)
            .expect("failed to open test database");
        db.run_migrations().expect("failed to run migrations");

        let db = Arc::new(db);
        let store = Arc::new(SqliteSightingStore::new(Arc::clone(&db)));

        Self { dir, db, store }
    }

    pub fn db(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }

    pub fn store(&self) -> Arc<SqliteSightingStore> {
        Arc::clone(&self.store)
    }

    /// Write `documents` as a JSON source file next to the database
    pub fn write_source(&self, name: &str, documents: &Value) -> PathBuf {
        self.write_raw(name, &documents.to_string())
    }

    /// Write arbitrary text as a source file
    pub fn write_raw(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("failed to write source file");
        path
    }

    /// Path inside the test directory that was never written
    pub fn missing_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
