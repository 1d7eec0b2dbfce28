//! Durable storage for workspace highlight state, backed by redb.

/// Highlight map persistence.
pub mod highlight;
/// Table definitions.
pub mod tables;


use crate::error::AppError;
use std::path::Path;
use std::sync::Arc;

pub use highlight::{HighlightDb, LoadedState};

/// Database handle with accessors for the individual slots.
pub struct Database {
    pub db: Arc<redb::Database>,
    pub highlights: HighlightDb,
}

impl Database {
    /// Open (or create) the database file and initialize tables.
    ///
    /// Missing parent directories are created first.
    ///
    /// # Returns
    /// A fully initialized [`Database`].
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or redb cannot
    /// open the file (for example when another process holds it).
    pub fn new(path: &str) -> Result<Self, AppError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = match redb::Database::create(path) {
            Ok(db) => Arc::new(db),
            Err(redb::DatabaseError::DatabaseAlreadyOpen) => {
                return Err(AppError::StorageMessage(format!(
                    "State database '{}' is already open in another process.\n\
                    Close it first, or set CODEMARK_DB_PATH to use a different location.",
                    path
                )));
            }
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path, "state database opened");

        Ok(Self {
            highlights: HighlightDb::new(db.clone())?,
            db,
        })
    }
}
