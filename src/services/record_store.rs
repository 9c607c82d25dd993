use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};
use tracing::debug;

use crate::errors::StoreError;
use crate::models::energy::EnergyGenerationRecord;

/// Append-only persistence for generation records.
pub trait RecordRepository: Send + Sync {
    fn insert(&self, record: &EnergyGenerationRecord) -> Result<(), StoreError>;
    fn insert_many(&self, records: &[EnergyGenerationRecord]) -> Result<usize, StoreError>;
    /// Only used by the history backfill to start from a clean slate.
    fn delete_by_serial(&self, serial_number: &str) -> Result<usize, StoreError>;
    /// Newest first.
    fn find_by_serial(
        &self,
        serial_number: &str,
        limit: Option<u32>,
    ) -> Result<Vec<EnergyGenerationRecord>, StoreError>;
}

#[derive(Debug)]
pub struct SqliteRecordRepository {
    conn: Mutex<Connection>,
}

impl SqliteRecordRepository {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS energy_generation_records (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                serial_number    TEXT NOT NULL,
                timestamp        TEXT NOT NULL,
                energy_generated INTEGER NOT NULL CHECK (energy_generated >= 0),
                interval_hours   INTEGER NOT NULL DEFAULT 2
            );
            CREATE INDEX IF NOT EXISTS idx_records_serial_ts
                ON energy_generation_records (serial_number, timestamp);",
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

const INSERT_SQL: &str = "INSERT INTO energy_generation_records
    (serial_number, timestamp, energy_generated, interval_hours) VALUES (?1, ?2, ?3, ?4)";

impl RecordRepository for SqliteRecordRepository {
    fn insert(&self, record: &EnergyGenerationRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            INSERT_SQL,
            params![
                record.serial_number,
                record.timestamp,
                record.energy_generated,
                record.interval_hours
            ],
        )?;
        Ok(())
    }

    fn insert_many(&self, records: &[EnergyGenerationRecord]) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(INSERT_SQL)?;
            for r in records {
                stmt.execute(params![r.serial_number, r.timestamp, r.energy_generated, r.interval_hours])?;
            }
        }
        tx.commit()?;
        debug!("Inserted {} records", records.len());
        Ok(records.len())
    }

    fn delete_by_serial(&self, serial_number: &str) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM energy_generation_records WHERE serial_number = ?1",
            params![serial_number],
        )?;
        Ok(deleted)
    }

    fn find_by_serial(
        &self,
        serial_number: &str,
        limit: Option<u32>,
    ) -> Result<Vec<EnergyGenerationRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT serial_number, timestamp, energy_generated, interval_hours
             FROM energy_generation_records
             WHERE serial_number = ?1
             ORDER BY timestamp DESC
             LIMIT ?2",
        )?;
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map_or(-1, i64::from);

        let rows = stmt
            .query_map(params![serial_number, limit], |row| {
                Ok(EnergyGenerationRecord {
                    serial_number: row.get(0)?,
                    timestamp: row.get(1)?,
                    energy_generated: row.get(2)?,
                    interval_hours: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
