//! SQLite storage backend

use super::traits::{
    OpenStore, StorageError, StorageResult, StoredSupplier, SupplierId, SupplierStore,
};
use crate::record::{CanonicalSupplierRecord, IdentityKey};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed supplier store
///
/// One `suppliers` table keyed by id, with a `UNIQUE` identity key column
/// as the deduplication backstop. The canonical record is kept as JSON next
/// to a few plain columns for inspection. Thread-safe via internal mutex on
/// the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

type SupplierRow = (String, String, String);

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS suppliers (
                id TEXT PRIMARY KEY,
                identity_key TEXT NOT NULL UNIQUE,
                company_name TEXT NOT NULL,
                country TEXT NOT NULL,
                source_id TEXT NOT NULL,
                stored_at TEXT NOT NULL,
                record_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_suppliers_source
                ON suppliers(source_id);

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn connection(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Lock)
    }

    fn row_to_supplier((id, stored_at, record_json): SupplierRow) -> StorageResult<StoredSupplier> {
        Ok(StoredSupplier {
            id: SupplierId::parse(&id).ok_or(StorageError::InvalidId(id))?,
            stored_at: DateTime::parse_from_rfc3339(&stored_at)
                .map_err(|e| StorageError::DateParse(e.to_string()))?
                .with_timezone(&Utc),
            record: serde_json::from_str(&record_json)?,
        })
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl SupplierStore for SqliteStore {
    fn exists(&self, key: &IdentityKey) -> StorageResult<bool> {
        let conn = self.connection()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM suppliers WHERE identity_key = ?1",
                params![key.storage_key()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert(&self, record: &CanonicalSupplierRecord) -> StorageResult<SupplierId> {
        let key = IdentityKey::for_record(record);
        let id = SupplierId::new();
        let record_json = serde_json::to_string(record)?;

        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let inserted = tx.execute(
            r#"
            INSERT INTO suppliers
                (id, identity_key, company_name, country, source_id, stored_at, record_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                id.to_string(),
                key.storage_key(),
                record.company_name,
                record.country,
                record.source_id,
                Utc::now().to_rfc3339(),
                record_json
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(StorageError::Duplicate(format!("{} / {}", key.name(), key.country())));
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit()?;
        Ok(id)
    }

    fn get(&self, id: &SupplierId) -> StorageResult<Option<StoredSupplier>> {
        let conn = self.connection()?;
        let row: Option<SupplierRow> = conn
            .query_row(
                "SELECT id, stored_at, record_json FROM suppliers WHERE id = ?1",
                params![id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        row.map(Self::row_to_supplier).transpose()
    }

    fn count(&self) -> StorageResult<usize> {
        let conn = self.connection()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM suppliers", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn list(&self, limit: Option<usize>) -> StorageResult<Vec<StoredSupplier>> {
        let conn = self.connection()?;
        // SQLite treats a negative LIMIT as no limit
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = conn.prepare(
            "SELECT id, stored_at, record_json FROM suppliers ORDER BY rowid LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;

        let mut suppliers = Vec::new();
        for row in rows {
            suppliers.push(Self::row_to_supplier(row?)?);
        }
        Ok(suppliers)
    }
}
