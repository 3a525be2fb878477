use std::sync::Arc;

use tempfile::TempDir;

use crate::{AppState, config::Config, db, store::MovieStore};

pub fn test_config(dir: &TempDir) -> Config {
    Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        database_url: format!("sqlite://{}?mode=rwc", dir.path().join("movies.db").display()),
        upload_dir: dir.path().join("uploads"),
        max_upload_bytes: 1024 * 1024,
    }
}

/// A store backed by a fresh SQLite file. Keep the directory alive for the
/// duration of the test.
pub async fn temp_store() -> (MovieStore, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let db = db::connect_and_migrate(&config.database_url).await.unwrap();
    (MovieStore::new(db), dir)
}

pub async fn temp_state() -> (Arc<AppState>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let db = db::connect_and_migrate(&config.database_url).await.unwrap();
    let state = Arc::new(AppState { config: Arc::new(config), store: MovieStore::new(db) });
    (state, dir)
}
