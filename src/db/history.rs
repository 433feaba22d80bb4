use chrono::{DateTime, SecondsFormat, Utc};
use redb::{Database, ReadableTable, Table};

use crate::db::tables;
use crate::error::Result;
use crate::models::HistoryEntry;

/// Build an entry stamped with `timestamp` as RFC 3339
pub fn new_entry(
    is_fake: bool,
    timestamp: DateTime<Utc>,
    username: Option<&str>,
    probability: Option<f32>,
) -> HistoryEntry {
    HistoryEntry {
        timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        result: is_fake,
        username: username.map(str::to_string),
        probability,
    }
}

/// Append inside an open write transaction; returns the entry's sequence number
pub(crate) fn append_in(
    table: &mut Table<'_, u64, &'static [u8]>,
    entry: &HistoryEntry,
) -> Result<u64> {
    let next = match table.last()? {
        Some((key, _)) => key.value() + 1,
        None => 0,
    };

    let bytes = bincode::serialize(entry)?;
    table.insert(next, bytes.as_slice())?;
    Ok(next)
}

/// Append one outcome
pub fn append(db: &Database, entry: &HistoryEntry) -> Result<u64> {
    let write_txn = db.begin_write()?;
    let seq = {
        let mut table = write_txn.open_table(tables::HISTORY)?;
        append_in(&mut table, entry)?
    };
    write_txn.commit()?;
    Ok(seq)
}

/// All entries in insertion order
///
/// Rows that cannot be decoded are skipped with a warning.
pub fn read_all(db: &Database) -> Result<Vec<HistoryEntry>> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(tables::HISTORY)?;

    let mut entries = Vec::new();
    for row in table.iter()? {
        let (key, value) = row?;
        match bincode::deserialize::<HistoryEntry>(value.value()) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!("Skipping unreadable history row {}: {}", key.value(), e),
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_tables;
    use tempfile::TempDir;

    fn test_db(dir: &TempDir) -> Database {
        let db = Database::create(dir.path().join("history.db")).unwrap();
        init_tables(&db).unwrap();
        db
    }

    #[test]
    fn test_read_all_empty() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        assert!(read_all(&db).unwrap().is_empty());
    }

    #[test]
    fn test_append_preserves_insertion_order() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        // Out-of-order clocks must not reorder the log
        let later = DateTime::parse_from_rfc3339("2024-05-02T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let earlier = DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let first = new_entry(true, later, Some("alice"), Some(0.9));
        let second = new_entry(false, earlier, None, None);
        assert_eq!(append(&db, &first).unwrap(), 0);
        assert_eq!(append(&db, &second).unwrap(), 1);

        let entries = read_all(&db).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].result);
        assert_eq!(entries[0].username.as_deref(), Some("alice"));
        assert!(entries[0].timestamp.starts_with("2024-05-02"));
        assert!(!entries[1].result);
        assert!(entries[1].timestamp.starts_with("2024-05-01"));
    }

    #[test]
    fn test_corrupt_row_skipped() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        append(&db, &new_entry(true, Utc::now(), None, None)).unwrap();
        let write_txn = db.begin_write().unwrap();
        {
            let mut table = write_txn.open_table(tables::HISTORY).unwrap();
            table.insert(1, [0x01u8, 0x02].as_slice()).unwrap();
        }
        write_txn.commit().unwrap();
        append(&db, &new_entry(false, Utc::now(), None, None)).unwrap();

        let entries = read_all(&db).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].result);
        assert!(!entries[1].result);
    }
}
