pub mod history;
pub mod stats;
pub mod tables;
pub mod users;

use redb::{Database, Error as RedbError};
use std::path::Path;
use std::sync::Arc;

use crate::models::{AggregateStats, HistoryEntry};

/// Database handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<Database>;

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
#[allow(clippy::result_large_err)]
pub fn open_database(path: impl AsRef<Path>) -> Result<Db, RedbError> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                RedbError::Io(e)
            })?;
        }
    }

    let db = Database::create(path)?;
    init_tables(&db)?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

/// Create tables if they don't exist by opening them in one write transaction
#[allow(clippy::result_large_err)]
pub fn init_tables(db: &Database) -> Result<(), RedbError> {
    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(tables::USERS)?;
        let _ = write_txn.open_table(tables::STATS)?;
        let _ = write_txn.open_table(tables::HISTORY)?;
        let _ = write_txn.open_table(tables::LOGIN_ATTEMPTS)?;
    }
    write_txn.commit()?;
    Ok(())
}

/// Count a completed prediction and log it to history in one transaction
///
/// Both tables commit together or not at all, so concurrent detections
/// cannot lose each other's updates.
pub fn record_prediction(
    db: &Database,
    entry: &HistoryEntry,
) -> crate::error::Result<AggregateStats> {
    let write_txn = db.begin_write()?;
    let stats = {
        let mut stats_table = write_txn.open_table(tables::STATS)?;
        let stats = stats::record_in(&mut stats_table, entry.result)?;
        drop(stats_table);

        let mut history_table = write_txn.open_table(tables::HISTORY)?;
        history::append_in(&mut history_table, entry)?;
        stats
    };
    write_txn.commit()?;

    tracing::debug!(
        "Prediction recorded: fake={} totals={:?}",
        entry.result,
        stats
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_open_database_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("detector.db");

        let db = open_database(&path).unwrap();
        assert!(path.exists());
        assert_eq!(stats::read(&db).unwrap(), AggregateStats::default());
    }

    #[test]
    fn test_record_prediction_updates_both_tables() {
        let dir = TempDir::new().unwrap();
        let db = open_database(dir.path().join("detector.db")).unwrap();

        let entry = history::new_entry(true, Utc::now(), Some("alice"), Some(0.8));
        let totals = record_prediction(&db, &entry).unwrap();

        assert_eq!(totals.deepfake, 1);
        assert_eq!(totals.total, 1);
        assert_eq!(history::read_all(&db).unwrap(), vec![entry]);
    }
}
