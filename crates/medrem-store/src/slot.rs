//! Durable key-value slots.
//!
//! A slot maps a text key to one text value.  [`ReminderStore`] keeps its whole
//! serialized list under a single key, so the only operations needed are
//! "read the value" and "replace the value".
//!
//! # Storage layout
//!
//! [`SqliteSlot`] creates a single table `kv_slots` (if it does not already
//! exist):
//!
//! | column     | type | description                            |
//! |------------|------|----------------------------------------|
//! | key        | TEXT | Slot key, primary key                  |
//! | value      | TEXT | Current value                          |
//! | updated_at | TEXT | RFC-3339 timestamp of last write (UTC) |
//!
//! # Example
//!
//! ```rust
//! use medrem_store::slot::{KeyValueSlot, SqliteSlot};
//!
//! let mut slot = SqliteSlot::open_in_memory().unwrap();
//! assert_eq!(slot.read("@med_reminders").unwrap(), None);
//!
//! slot.write("@med_reminders", "[]").unwrap();
//! assert_eq!(slot.read("@med_reminders").unwrap().as_deref(), Some("[]"));
//! ```
//!
//! [`ReminderStore`]: crate::store::ReminderStore

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised by a [`KeyValueSlot`] backend.
#[derive(Error, Debug)]
pub enum SlotError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("slot `{0}` is read-only")]
    ReadOnly(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// KeyValueSlot
// ─────────────────────────────────────────────────────────────────────────────

/// Durable local key-value primitive.
pub trait KeyValueSlot {
    /// Return the value stored under `key`, or `None` when the key is absent.
    fn read(&self, key: &str) -> Result<Option<String>, SlotError>;

    /// Replace the value stored under `key`.  Either the new value becomes
    /// visible as a whole or the call fails and the old value is kept.
    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError>;
}

impl<S: KeyValueSlot + ?Sized> KeyValueSlot for Box<S> {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        (**self).write(key, value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SqliteSlot
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite-backed slot.  This is the on-device storage used by the CLI.
pub struct SqliteSlot {
    conn: Connection,
}

impl SqliteSlot {
    /// Open (or create) a persistent SQLite database at `path`.
    pub fn open(path: &str) -> Result<Self, SlotError> {
        let conn = Connection::open(path)?;
        let slot = Self { conn };
        slot.init_schema()?;
        Ok(slot)
    }

    /// Open a temporary in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self, SlotError> {
        let conn = Connection::open_in_memory()?;
        let slot = Self { conn };
        slot.init_schema()?;
        Ok(slot)
    }

    /// Open an existing database without write access.  Every
    /// [`write`](KeyValueSlot::write) fails with [`SlotError::Sqlite`].
    pub fn open_read_only(path: &str) -> Result<Self, SlotError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn })
    }

    fn init_schema(&self) -> Result<(), SlotError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_slots (
                key        TEXT NOT NULL PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl KeyValueSlot for SqliteSlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_slots WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO kv_slots (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemorySlot
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local slot.  Used by tests and as a fallback when the on-device
/// database cannot be opened; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySlot {
    values: HashMap<String, String>,
    read_only: bool,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot pre-populated with `value` under `key`.
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut slot = Self::default();
        slot.values.insert(key.to_string(), value.to_string());
        slot
    }

    /// When set, every write fails with [`SlotError::ReadOnly`].
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }
}

impl KeyValueSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        if self.read_only {
            return Err(SlotError::ReadOnly(key.to_string()));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
