//! Store handle shared by all repositories.
//!
//! `MigrationStore` wraps `X2aDb`. All repo methods are implemented as
//! `impl MigrationStore` blocks in [`crate::repos`].

use tokio::sync::{Mutex, MutexGuard};

use crate::X2aDb;
use crate::error::DatabaseError;

/// Persistence for projects, modules, jobs, and artifacts.
///
/// Every mutation takes the write lock before touching the connection. The
/// connection is shared, so a statement issued while another task holds an
/// open transaction would otherwise join that transaction.
pub struct MigrationStore {
    db: X2aDb,
    write_lock: Mutex<()>,
}

impl MigrationStore {
    /// Open a store over a local database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or migrated.
    pub async fn open_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = X2aDb::open_local(db_path).await?;
        Ok(Self::from_db(db))
    }

    /// Create from an existing `X2aDb`.
    #[must_use]
    pub fn from_db(db: X2aDb) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &X2aDb {
        &self.db
    }

    pub(crate) async fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }
}
