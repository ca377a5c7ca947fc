//! SQLite storage backend.
//!
//! Samples and transfer records live in ordinary SQLite tables. Only the
//! signature column holds sealed data; it is written as the base64 text form
//! of a [`SealedBlob`](crate::crypto::SealedBlob) and never decrypted here.

mod row;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use crate::crypto::SealedBlob;
use crate::custody::{SampleStatus, TransitionGuard};
use crate::error::{CustodyError, Result};
use crate::storage::traits::CustodyStore;
use crate::storage::types::{CustodyTransfer, NewSample, Sample, SampleFilter, StatusUpdate};

use row::{format_timestamp, SampleRow, TransferRow, SAMPLE_COLUMNS, TRANSFER_COLUMNS};

/// Current on-disk schema version.
pub const FORMAT_VERSION: &str = "1";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
    CREATE TABLE meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE samples (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        status TEXT NOT NULL CHECK (status IN (
            'pending', 'in_custody_transfer', 'submitted', 'pass', 'fail'
        )),
        notes TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    );

    -- Append-only: no code path updates or deletes transfer rows
    CREATE TABLE custody_transfers (
        id TEXT PRIMARY KEY,
        sample_id TEXT NOT NULL,
        transferred_by TEXT NOT NULL,
        received_by TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        latitude REAL,
        longitude REAL,
        signature TEXT NOT NULL,

        FOREIGN KEY (sample_id) REFERENCES samples(id)
    );

    CREATE INDEX custody_transfers_by_sample
    ON custody_transfers (sample_id, timestamp);
"#;

/// SQLite-backed custody store.
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new database file and initialize the schema.
    ///
    /// # Errors
    ///
    /// Returns `CustodyError::Persistence` if the file already exists.
    pub fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Err(CustodyError::Persistence(format!(
                "Database already exists: {}",
                path.display()
            )));
        }

        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    /// Open an existing database file.
    ///
    /// # Errors
    ///
    /// Returns `CustodyError::Persistence` if the file is missing or was not
    /// created by this store.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CustodyError::Persistence(format!(
                "Database not found: {}",
                path.display()
            )));
        }

        let conn = Connection::open(path)?;
        Self::configure(&conn)?;

        let version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'format_version'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| CustodyError::Persistence(format!("Not a custody database: {}", e)))?;
        match version.as_deref() {
            Some(FORMAT_VERSION) => {}
            Some(other) => {
                return Err(CustodyError::Persistence(format!(
                    "Unsupported database format version: {}",
                    other
                )))
            }
            None => {
                return Err(CustodyError::Persistence(
                    "Database metadata missing format_version".to_string(),
                ))
            }
        }

        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn configure(conn: &Connection) -> Result<()> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(())
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA)?;
        let created_at = format_timestamp(&Utc::now());
        conn.execute(
            "INSERT INTO meta (key, value) VALUES (?, ?)",
            ["format_version", FORMAT_VERSION],
        )?;
        conn.execute(
            "INSERT INTO meta (key, value) VALUES (?, ?)",
            ["created_at", created_at.as_str()],
        )?;
        Ok(())
    }

    /// Start a write transaction that holds the database write lock from the
    /// first read, so guards checked inside it still hold at commit.
    fn write_tx(conn: &mut Connection) -> Result<rusqlite::Transaction<'_>> {
        Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CustodyError::Persistence("SQLite connection poisoned".to_string()))
    }

    fn live_sample(conn: &Connection, id: &Uuid) -> Result<Option<Sample>> {
        let query = format!(
            "SELECT {} FROM samples WHERE id = ? AND deleted_at IS NULL",
            SAMPLE_COLUMNS
        );
        let row = conn
            .query_row(&query, [id.to_string()], SampleRow::from_row)
            .optional()?;
        row.map(Sample::try_from).transpose()
    }

    fn apply_status(conn: &Connection, id: &Uuid, update: &StatusUpdate) -> Result<Sample> {
        if let Some(guard) = update.guard {
            let current = Self::live_sample(conn, id)?.ok_or(CustodyError::SampleNotFound(*id))?;
            guard.check(current.status)?;
        }

        let changed = conn.execute(
            r#"
            UPDATE samples
            SET status = ?, notes = COALESCE(?, notes), updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
            (
                update.status.as_str(),
                update.notes.as_deref(),
                format_timestamp(&Utc::now()),
                id.to_string(),
            ),
        )?;
        if changed == 0 {
            return Err(CustodyError::SampleNotFound(*id));
        }
        Self::live_sample(conn, id)?.ok_or(CustodyError::SampleNotFound(*id))
    }

    fn write_transfer(conn: &Connection, transfer: &CustodyTransfer) -> Result<()> {
        let sample = Self::live_sample(conn, &transfer.sample_id)?
            .ok_or(CustodyError::SampleNotFound(transfer.sample_id))?;
        TransitionGuard::TRANSFER.check(sample.status)?;

        conn.execute(
            r#"
            INSERT INTO custody_transfers (
                id,
                sample_id,
                transferred_by,
                received_by,
                timestamp,
                latitude,
                longitude,
                signature
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            (
                transfer.id.to_string(),
                transfer.sample_id.to_string(),
                &transfer.transferred_by,
                &transfer.received_by,
                format_timestamp(&transfer.timestamp),
                transfer.location.map(|l| l.latitude),
                transfer.location.map(|l| l.longitude),
                transfer.sealed_signature.to_base64(),
            ),
        )?;
        Ok(())
    }
}

impl CustodyStore for SqliteStore {
    fn insert_sample(&self, sample: &NewSample) -> Result<Sample> {
        let name = sample.name.trim();
        if name.is_empty() {
            return Err(CustodyError::Validation(
                "Sample name cannot be empty".to_string(),
            ));
        }

        let conn = self.lock_conn()?;
        let id = Uuid::new_v4();
        let created_at = format_timestamp(&sample.created_at.unwrap_or_else(Utc::now));

        conn.execute(
            r#"
            INSERT INTO samples (id, name, status, notes, created_at, updated_at, deleted_at)
            VALUES (?, ?, ?, NULL, ?, ?, NULL)
            "#,
            (
                id.to_string(),
                name,
                SampleStatus::Pending.as_str(),
                &created_at,
                &created_at,
            ),
        )?;

        Self::live_sample(&conn, &id)?.ok_or(CustodyError::SampleNotFound(id))
    }

    fn get_sample(&self, id: &Uuid) -> Result<Option<Sample>> {
        let conn = self.lock_conn()?;
        Self::live_sample(&conn, id)
    }

    fn list_samples(&self, filter: &SampleFilter) -> Result<Vec<Sample>> {
        let conn = self.lock_conn()?;

        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if !filter.include_deleted {
            conditions.push("deleted_at IS NULL");
        }

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str()));
        }

        let mut query = format!("SELECT {} FROM samples", SAMPLE_COLUMNS);
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" ORDER BY created_at ASC, rowid ASC");

        if let Some(limit) = filter.limit {
            query.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params.iter()),
            SampleRow::from_row,
        )?;

        let mut samples = Vec::new();
        for row in rows {
            samples.push(row?.try_into()?);
        }
        Ok(samples)
    }

    fn update_sample_status(&self, id: &Uuid, update: &StatusUpdate) -> Result<Sample> {
        let mut conn = self.lock_conn()?;
        let tx = Self::write_tx(&mut conn)?;
        let sample = Self::apply_status(&tx, id, update)?;
        tx.commit()?;
        Ok(sample)
    }

    fn soft_delete_sample(&self, id: &Uuid) -> Result<()> {
        let conn = self.lock_conn()?;
        let now = format_timestamp(&Utc::now());
        let changed = conn.execute(
            "UPDATE samples SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
            (&now, &now, id.to_string()),
        )?;
        if changed == 0 {
            return Err(CustodyError::SampleNotFound(*id));
        }
        Ok(())
    }

    fn insert_transfer(&self, transfer: &CustodyTransfer) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = Self::write_tx(&mut conn)?;
        Self::write_transfer(&tx, transfer)?;
        tx.commit()?;
        Ok(())
    }

    fn insert_transfer_with_status(
        &self,
        transfer: &CustodyTransfer,
        update: &StatusUpdate,
    ) -> Result<Sample> {
        let mut conn = self.lock_conn()?;
        let tx = Self::write_tx(&mut conn)?;
        Self::write_transfer(&tx, transfer)?;
        let sample = Self::apply_status(&tx, &transfer.sample_id, update)?;
        tx.commit()?;
        Ok(sample)
    }

    fn get_transfer(&self, id: &Uuid) -> Result<Option<CustodyTransfer>> {
        let conn = self.lock_conn()?;
        let query = format!(
            "SELECT {} FROM custody_transfers WHERE id = ?",
            TRANSFER_COLUMNS
        );
        let row = conn
            .query_row(&query, [id.to_string()], TransferRow::from_row)
            .optional()?;
        row.map(CustodyTransfer::try_from).transpose()
    }

    fn list_transfers(&self, sample_id: &Uuid) -> Result<Vec<CustodyTransfer>> {
        let conn = self.lock_conn()?;
        let query = format!(
            "SELECT {} FROM custody_transfers WHERE sample_id = ? ORDER BY timestamp ASC, rowid ASC",
            TRANSFER_COLUMNS
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([sample_id.to_string()], TransferRow::from_row)?;

        let mut transfers = Vec::new();
        for row in rows {
            transfers.push(row?.try_into()?);
        }
        Ok(transfers)
    }

    fn check_integrity(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(CustodyError::Persistence(format!(
                "SQLite integrity check failed: {}",
                integrity
            )));
        }

        let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
        let mut rows = stmt.query([])?;
        if rows.next()?.is_some() {
            return Err(CustodyError::Persistence(
                "Foreign key integrity check failed".to_string(),
            ));
        }

        let mut stmt = conn.prepare("SELECT id, signature FROM custody_transfers")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (id, signature) = row?;
            if SealedBlob::from_base64(&signature).is_err() {
                return Err(CustodyError::MalformedBlob(format!(
                    "transfer {} has an unreadable signature",
                    id
                )));
            }
        }

        let metadata_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM meta WHERE key IN ('format_version', 'created_at')",
            [],
            |row| row.get(0),
        )?;
        if metadata_count < 2 {
            return Err(CustodyError::Persistence(
                "Metadata table missing required keys".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, TimeZone};

    use super::*;
    use crate::crypto::{IV_LENGTH, SALT_LENGTH, TAG_LENGTH};
    use crate::storage::types::Location;

    fn fake_blob(fill: u8) -> SealedBlob {
        SealedBlob {
            iv: [fill; IV_LENGTH],
            salt: [fill; SALT_LENGTH],
            tag: [fill; TAG_LENGTH],
            ciphertext: vec![fill; 3],
        }
    }

    fn transfer_for(sample_id: Uuid, minutes: i64) -> CustodyTransfer {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        CustodyTransfer {
            id: Uuid::new_v4(),
            sample_id,
            transferred_by: "alice".to_string(),
            received_by: "bob".to_string(),
            timestamp: base + ChronoDuration::minutes(minutes),
            location: None,
            sealed_signature: fake_blob(minutes as u8),
        }
    }

    #[test]
    fn test_insert_and_get_sample() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sample = store.insert_sample(&NewSample::new("river bend")).unwrap();

        assert_eq!(sample.status, SampleStatus::Pending);
        assert_eq!(sample.name, "river bend");
        assert!(sample.deleted_at.is_none());

        let fetched = store.get_sample(&sample.id).unwrap().unwrap();
        assert_eq!(fetched, sample);
    }

    #[test]
    fn test_blank_sample_name_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store.insert_sample(&NewSample::new("   "));
        assert!(matches!(result, Err(CustodyError::Validation(_))));
    }

    #[test]
    fn test_soft_deleted_sample_is_hidden() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sample = store.insert_sample(&NewSample::new("s")).unwrap();

        store.soft_delete_sample(&sample.id).unwrap();

        assert!(store.get_sample(&sample.id).unwrap().is_none());
        assert!(matches!(
            store.soft_delete_sample(&sample.id),
            Err(CustodyError::SampleNotFound(_))
        ));
        assert!(matches!(
            store.update_sample_status(&sample.id, &StatusUpdate::new(SampleStatus::Pass)),
            Err(CustodyError::SampleNotFound(_))
        ));

        let all = store
            .list_samples(&SampleFilter::new().include_deleted())
            .unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_deleted());
        assert!(store.list_samples(&SampleFilter::new()).unwrap().is_empty());
    }

    #[test]
    fn test_update_status_keeps_notes_unless_given() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sample = store.insert_sample(&NewSample::new("s")).unwrap();

        let updated = store
            .update_sample_status(
                &sample.id,
                &StatusUpdate::new(SampleStatus::Submitted).with_notes("sealed bag"),
            )
            .unwrap();
        assert_eq!(updated.notes.as_deref(), Some("sealed bag"));

        let updated = store
            .update_sample_status(&sample.id, &StatusUpdate::new(SampleStatus::Pass))
            .unwrap();
        assert_eq!(updated.status, SampleStatus::Pass);
        assert_eq!(updated.notes.as_deref(), Some("sealed bag"));
    }

    #[test]
    fn test_transfers_listed_by_timestamp() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sample = store.insert_sample(&NewSample::new("s")).unwrap();

        let late = transfer_for(sample.id, 30);
        let early = transfer_for(sample.id, 5);
        let middle = transfer_for(sample.id, 10);
        store.insert_transfer(&late).unwrap();
        store.insert_transfer(&early).unwrap();
        store.insert_transfer(&middle).unwrap();

        let ids: Vec<Uuid> = store
            .list_transfers(&sample.id)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![early.id, middle.id, late.id]);
    }

    #[test]
    fn test_transfer_round_trips_sealed_signature_and_location() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sample = store.insert_sample(&NewSample::new("s")).unwrap();

        let mut transfer = transfer_for(sample.id, 1);
        transfer.location = Some(Location::new(47.6, -122.3).unwrap());
        store.insert_transfer(&transfer).unwrap();

        let fetched = store.get_transfer(&transfer.id).unwrap().unwrap();
        assert_eq!(fetched, transfer);
    }

    #[test]
    fn test_transfer_for_missing_or_deleted_sample_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();

        let orphan = transfer_for(Uuid::new_v4(), 1);
        assert!(matches!(
            store.insert_transfer(&orphan),
            Err(CustodyError::SampleNotFound(_))
        ));

        let sample = store.insert_sample(&NewSample::new("s")).unwrap();
        store.soft_delete_sample(&sample.id).unwrap();
        let transfer = transfer_for(sample.id, 1);
        assert!(matches!(
            store.insert_transfer(&transfer),
            Err(CustodyError::SampleNotFound(_))
        ));
        assert!(store.get_transfer(&transfer.id).unwrap().is_none());
    }

    #[test]
    fn test_transfer_for_decided_sample_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sample = store.insert_sample(&NewSample::new("s")).unwrap();
        store
            .update_sample_status(&sample.id, &StatusUpdate::new(SampleStatus::Pass))
            .unwrap();

        let transfer = transfer_for(sample.id, 1);
        assert!(matches!(
            store.insert_transfer(&transfer),
            Err(CustodyError::InvalidTransition {
                from: SampleStatus::Pass,
                event: "transfer",
            })
        ));
        let with_status = store.insert_transfer_with_status(
            &transfer,
            &StatusUpdate::new(SampleStatus::InCustodyTransfer).guarded(TransitionGuard::TRANSFER),
        );
        assert!(matches!(
            with_status,
            Err(CustodyError::InvalidTransition { .. })
        ));

        assert!(store.list_transfers(&sample.id).unwrap().is_empty());
        assert_eq!(
            store.get_sample(&sample.id).unwrap().unwrap().status,
            SampleStatus::Pass
        );
    }

    #[test]
    fn test_guarded_status_update_checks_current_status() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sample = store.insert_sample(&NewSample::new("s")).unwrap();

        let early = store.update_sample_status(
            &sample.id,
            &StatusUpdate::new(SampleStatus::Pass).guarded(TransitionGuard::DECIDE),
        );
        assert!(matches!(
            early,
            Err(CustodyError::InvalidTransition {
                from: SampleStatus::Pending,
                event: "decide",
            })
        ));

        store
            .update_sample_status(&sample.id, &StatusUpdate::new(SampleStatus::Submitted))
            .unwrap();
        let decided = store
            .update_sample_status(
                &sample.id,
                &StatusUpdate::new(SampleStatus::Fail)
                    .with_notes("first")
                    .guarded(TransitionGuard::DECIDE),
            )
            .unwrap();
        assert_eq!(decided.status, SampleStatus::Fail);

        let again = store.update_sample_status(
            &sample.id,
            &StatusUpdate::new(SampleStatus::Pass)
                .with_notes("second")
                .guarded(TransitionGuard::DECIDE_OPEN),
        );
        assert!(matches!(
            again,
            Err(CustodyError::InvalidTransition {
                from: SampleStatus::Fail,
                ..
            })
        ));
        let stored = store.get_sample(&sample.id).unwrap().unwrap();
        assert_eq!(stored.status, SampleStatus::Fail);
        assert_eq!(stored.notes.as_deref(), Some("first"));

        store.soft_delete_sample(&sample.id).unwrap();
        assert!(matches!(
            store.update_sample_status(
                &sample.id,
                &StatusUpdate::new(SampleStatus::Pass).guarded(TransitionGuard::DECIDE_OPEN),
            ),
            Err(CustodyError::SampleNotFound(_))
        ));
    }

    #[test]
    fn test_insert_transfer_with_status_is_atomic() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sample = store.insert_sample(&NewSample::new("s")).unwrap();
        {
            let conn = store.lock_conn().unwrap();
            conn.execute_batch(
                r#"
                CREATE TRIGGER reject_status BEFORE UPDATE OF status ON samples
                BEGIN SELECT RAISE(ABORT, 'status writes disabled'); END;
                "#,
            )
            .unwrap();
        }

        let transfer = transfer_for(sample.id, 1);
        let result = store.insert_transfer_with_status(
            &transfer,
            &StatusUpdate::new(SampleStatus::InCustodyTransfer),
        );

        assert!(result.is_err());
        assert!(store.get_transfer(&transfer.id).unwrap().is_none());
        assert_eq!(
            store.get_sample(&sample.id).unwrap().unwrap().status,
            SampleStatus::Pending
        );
    }

    #[test]
    fn test_check_integrity_passes_on_fresh_store() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sample = store.insert_sample(&NewSample::new("s")).unwrap();
        store.insert_transfer(&transfer_for(sample.id, 1)).unwrap();
        store.check_integrity().unwrap();
    }

    #[test]
    fn test_check_integrity_flags_corrupt_signature() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sample = store.insert_sample(&NewSample::new("s")).unwrap();
        store.insert_transfer(&transfer_for(sample.id, 1)).unwrap();
        {
            let conn = store.lock_conn().unwrap();
            conn.execute("UPDATE custody_transfers SET signature = 'AAAA'", [])
                .unwrap();
        }
        assert!(matches!(
            store.check_integrity(),
            Err(CustodyError::MalformedBlob(_))
        ));
    }
}
