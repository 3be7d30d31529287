pub mod db;
pub mod repository;

pub use db::Database;

use common::Error;
use std::sync::{Arc, Mutex};

/// Shared handle jobs clone cheaply; `rusqlite::Connection` is `Send` but
/// not `Sync`, so every access is funneled through a blocking task rather
/// than held across an `.await` point.
pub type SharedDatabase = Arc<Mutex<Database>>;

pub fn shared(db: Database) -> SharedDatabase {
    Arc::new(Mutex::new(db))
}

/// Runs `f` against the database on a blocking-pool thread, matching the
/// async-in-sync bridging used elsewhere for `rusqlite` access.
pub async fn with_db<F, T>(db: &SharedDatabase, f: F) -> Result<T, Error>
where
    F: FnOnce(&Database) -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || {
        let guard = db.lock().map_err(|_| Error::Storage("database mutex poisoned".into()))?;
        f(&guard)
    })
    .await
    .map_err(|e| Error::Storage(format!("blocking task join error: {e}")))?
}
