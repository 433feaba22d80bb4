use redb::{Database, ReadableTable, Table};

use crate::db::tables;
use crate::error::Result;
use crate::models::AggregateStats;

/// Decode the stats row, treating a missing or unreadable row as zeros
fn decode(bytes: Option<&[u8]>) -> AggregateStats {
    let Some(bytes) = bytes else {
        return AggregateStats::default();
    };

    match bincode::deserialize::<AggregateStats>(bytes) {
        Ok(stats) if stats.is_consistent() => stats,
        Ok(stats) => {
            tracing::warn!("Inconsistent stats row {:?}, recomputing total", stats);
            AggregateStats {
                total: stats.real + stats.deepfake,
                ..stats
            }
        }
        Err(e) => {
            tracing::warn!("Unreadable stats row, starting from zero: {}", e);
            AggregateStats::default()
        }
    }
}

/// Increment the counters inside an open write transaction
pub(crate) fn record_in(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    is_fake: bool,
) -> Result<AggregateStats> {
    let mut stats = decode(table.get(tables::STATS_KEY)?.as_ref().map(|b| b.value()));
    stats.record(is_fake);

    let bytes = bincode::serialize(&stats)?;
    table.insert(tables::STATS_KEY, bytes.as_slice())?;
    Ok(stats)
}

/// Count one prediction and return the updated totals
pub fn record(db: &Database, is_fake: bool) -> Result<AggregateStats> {
    let write_txn = db.begin_write()?;
    let stats = {
        let mut table = write_txn.open_table(tables::STATS)?;
        record_in(&mut table, is_fake)?
    };
    write_txn.commit()?;
    Ok(stats)
}

/// Current totals; zeros if nothing has been recorded
pub fn read(db: &Database) -> Result<AggregateStats> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(tables::STATS)?;
    let guard = table.get(tables::STATS_KEY)?;
    Ok(decode(guard.as_ref().map(|b| b.value())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_tables;
    use tempfile::TempDir;

    fn test_db(dir: &TempDir) -> Database {
        let db = Database::create(dir.path().join("stats.db")).unwrap();
        init_tables(&db).unwrap();
        db
    }

    #[test]
    fn test_read_empty_is_zero() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        assert_eq!(read(&db).unwrap(), AggregateStats::default());
    }

    #[test]
    fn test_record_true_then_false() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        record(&db, true).unwrap();
        let stats = record(&db, false).unwrap();

        let expected = AggregateStats {
            real: 1,
            deepfake: 1,
            total: 2,
        };
        assert_eq!(stats, expected);
        assert_eq!(read(&db).unwrap(), expected);
    }

    #[test]
    fn test_read_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        record(&db, true).unwrap();

        let first = read(&db).unwrap();
        let second = read(&db).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_corrupt_row_treated_as_zero() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        let write_txn = db.begin_write().unwrap();
        {
            let mut table = write_txn.open_table(tables::STATS).unwrap();
            table.insert(tables::STATS_KEY, [0xffu8].as_slice()).unwrap();
        }
        write_txn.commit().unwrap();

        assert_eq!(read(&db).unwrap(), AggregateStats::default());

        let stats = record(&db, true).unwrap();
        assert_eq!(stats.deepfake, 1);
        assert_eq!(stats.total, 1);
    }
}
