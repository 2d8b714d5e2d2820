use log::*;
use tempfile::TempDir;

use crate::SqliteDatabase;

/// A migrated SQLite database in its own temporary directory. The directory, and the database with it, is removed
/// when this value is dropped.
pub struct TestStore {
    pub db: SqliteDatabase,
    dir: TempDir,
}

impl TestStore {
    pub fn db(&self) -> SqliteDatabase {
        self.db.clone()
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

pub async fn prepare_test_env() -> TestStore {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    let dir = tempfile::tempdir().expect("Error creating temporary directory");
    let url = format!("sqlite://{}", dir.path().join("settlement.db").display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    info!("🚀️ Test database ready at {url}");
    TestStore { db, dir }
}
