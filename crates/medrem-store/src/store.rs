//! Write-through reminder store.
//!
//! [`ReminderStore`] owns the in-memory reminder list and mirrors it to one
//! key of a [`KeyValueSlot`].  Every successful [`add`](ReminderStore::add)
//! rewrites the whole list, so the in-memory and durable copies are equal
//! after each call.  A failed write leaves the in-memory list as it was.
//!
//! # Example
//!
//! ```rust
//! use medrem_store::slot::MemorySlot;
//! use medrem_store::store::{AddOutcome, ReminderStore, DEFAULT_SLOT_KEY};
//!
//! let mut store = ReminderStore::initialize(MemorySlot::new(), DEFAULT_SLOT_KEY);
//! assert!(store.list().is_empty());
//!
//! let outcome = store.add("Metformin").unwrap();
//! assert!(matches!(outcome, AddOutcome::Added(_)));
//!
//! // Whitespace-only names are ignored.
//! assert!(matches!(store.add("   ").unwrap(), AddOutcome::Ignored));
//!
//! assert_eq!(store.list().len(), 1);
//! assert_eq!(store.list()[0].schedule, "09:00");
//! ```

use medrem_types::Reminder;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec::{self, CodecError};
use crate::id_clock::IdClock;
use crate::slot::{KeyValueSlot, SlotError};

/// Key under which the reminder list is stored.
pub const DEFAULT_SLOT_KEY: &str = "@med_reminders";

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// What went wrong underneath a [`StoreError`].
#[derive(Error, Debug)]
pub enum FailureCause {
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors surfaced by [`ReminderStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// The slot could not be read or its contents could not be decoded.
    #[error("read failure on `{key}`: {cause}")]
    ReadFailure {
        key: String,
        #[source]
        cause: FailureCause,
    },
    /// The updated list could not be encoded or written.
    #[error("write failure on `{key}`: {cause}")]
    WriteFailure {
        key: String,
        #[source]
        cause: FailureCause,
    },
    /// A stored id already sits at the top of the id range, so no larger
    /// id can be issued.
    #[error("no reminder id left on `{key}`")]
    IdsExhausted { key: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcomes
// ─────────────────────────────────────────────────────────────────────────────

/// How [`ReminderStore::initialize`] populated the list.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Nothing stored under the key yet.
    Empty,
    /// The stored list was loaded; holds the number of reminders.
    Restored(usize),
    /// The slot was unreadable or held malformed data; the store started
    /// empty.  Holds the [`StoreError::ReadFailure`] for diagnostics.
    Recovered(StoreError),
}

/// Result of a successful [`ReminderStore::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The reminder was appended and persisted.
    Added(Reminder),
    /// The name was empty after trimming; nothing changed.
    Ignored,
}

// ─────────────────────────────────────────────────────────────────────────────
// ReminderStore
// ─────────────────────────────────────────────────────────────────────────────

/// Authoritative reminder list with a durable copy in a [`KeyValueSlot`].
pub struct ReminderStore<S: KeyValueSlot> {
    slot: S,
    key: String,
    reminders: Vec<Reminder>,
    ids: IdClock,
    load_outcome: LoadOutcome,
}

impl<S: KeyValueSlot> ReminderStore<S> {
    /// Load the list stored under `key`.
    ///
    /// Never fails: an absent key yields an empty list, and a read or decode
    /// failure is logged as a warning and also yields an empty list.  The
    /// slot is not written.
    pub fn initialize(slot: S, key: &str) -> Self {
        let (reminders, load_outcome) = match load(&slot, key) {
            Ok(Some(reminders)) => {
                info!(key, count = reminders.len(), "Restored reminders");
                let n = reminders.len();
                (reminders, LoadOutcome::Restored(n))
            }
            Ok(None) => {
                debug!(key, "No reminders stored yet");
                (Vec::new(), LoadOutcome::Empty)
            }
            Err(e) => {
                warn!(key, error = %e, "Could not load reminders; starting with an empty list");
                (Vec::new(), LoadOutcome::Recovered(e))
            }
        };

        let mut ids = IdClock::new();
        for reminder in &reminders {
            ids.observe(&reminder.id);
        }

        Self {
            slot,
            key: key.to_string(),
            reminders,
            ids,
            load_outcome,
        }
    }

    /// Append a reminder called `name` and persist the full list.
    ///
    /// `name` is trimmed first; an empty result is a no-op that returns
    /// [`AddOutcome::Ignored`] without touching the slot.  When the write
    /// fails the reminder is not kept and [`StoreError::WriteFailure`] is
    /// returned; [`StoreError::IdsExhausted`] likewise leaves the list as it
    /// was.
    pub fn add(&mut self, name: &str) -> Result<AddOutcome, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            debug!(key = %self.key, "Ignoring reminder with empty name");
            return Ok(AddOutcome::Ignored);
        }

        let Some(id) = self.ids.next() else {
            warn!(key = %self.key, name, "Reminder id range exhausted");
            return Err(StoreError::IdsExhausted {
                key: self.key.clone(),
            });
        };

        let reminder = Reminder::new(id, name);
        let mut next = Vec::with_capacity(self.reminders.len() + 1);
        next.extend_from_slice(&self.reminders);
        next.push(reminder.clone());

        if let Err(cause) = self.persist(&next) {
            warn!(key = %self.key, error = %cause, name, "Reminder not saved");
            return Err(StoreError::WriteFailure {
                key: self.key.clone(),
                cause,
            });
        }

        self.reminders = next;
        info!(key = %self.key, id = %reminder.id, name, "Reminder saved");
        Ok(AddOutcome::Added(reminder))
    }

    /// Current reminders in insertion order.
    pub fn list(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    /// The slot key this store reads and writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// How the list was populated at [`initialize`](Self::initialize).
    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.load_outcome
    }

    /// Give the slot back, e.g. to initialize a fresh store from it.
    pub fn into_slot(self) -> S {
        self.slot
    }

    fn persist(&mut self, reminders: &[Reminder]) -> Result<(), FailureCause> {
        let raw = codec::encode(reminders)?;
        self.slot.write(&self.key, &raw)?;
        Ok(())
    }
}

fn load<S: KeyValueSlot>(slot: &S, key: &str) -> Result<Option<Vec<Reminder>>, StoreError> {
    let read_failure = |cause: FailureCause| StoreError::ReadFailure {
        key: key.to_string(),
        cause,
    };
    let Some(raw) = slot.read(key).map_err(|e| read_failure(e.into()))? else {
        return Ok(None);
    };
    let reminders = codec::decode(&raw).map_err(|e| read_failure(e.into()))?;
    Ok(Some(reminders))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{MemorySlot, SqliteSlot};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Slot wrapper that counts writes.
    struct CountingSlot {
        inner: MemorySlot,
        writes: Rc<Cell<usize>>,
    }

    impl KeyValueSlot for CountingSlot {
        fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
            self.writes.set(self.writes.get() + 1);
            self.inner.write(key, value)
        }
    }

    /// Slot whose reads always fail.
    struct BrokenSlot;

    impl KeyValueSlot for BrokenSlot {
        fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
            Err(SlotError::ReadOnly(key.to_string()))
        }

        fn write(&mut self, key: &str, _value: &str) -> Result<(), SlotError> {
            Err(SlotError::ReadOnly(key.to_string()))
        }
    }

    fn make_store() -> ReminderStore<MemorySlot> {
        ReminderStore::initialize(MemorySlot::new(), DEFAULT_SLOT_KEY)
    }

    fn names<S: KeyValueSlot>(store: &ReminderStore<S>) -> Vec<&str> {
        store.list().iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn initialize_on_empty_slot_starts_empty() {
        let store = make_store();
        assert!(store.list().is_empty());
        assert!(matches!(store.load_outcome(), LoadOutcome::Empty));
    }

    #[test]
    fn add_appends_in_submission_order() {
        let mut store = make_store();
        store.add("Metformin").unwrap();
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.list()[0].name, "Metformin");
        assert_eq!(store.list()[0].schedule, "09:00");

        store.add("Lisinopril").unwrap();
        assert_eq!(names(&store), vec!["Metformin", "Lisinopril"]);
    }

    #[test]
    fn length_tracks_non_empty_adds() {
        let mut store = make_store();
        let inputs = ["Aspirin", "", "Atorvastatin", "   ", "Levothyroxine"];
        let mut expected = 0;
        for name in inputs {
            store.add(name).unwrap();
            if !name.trim().is_empty() {
                expected += 1;
            }
            assert_eq!(store.len(), expected);
        }
        assert_eq!(names(&store), vec!["Aspirin", "Atorvastatin", "Levothyroxine"]);
    }

    #[test]
    fn add_returns_the_new_reminder() {
        let mut store = make_store();
        let AddOutcome::Added(reminder) = store.add("Metformin").unwrap() else {
            panic!("expected Added");
        };
        assert_eq!(store.list(), &[reminder]);
    }

    #[test]
    fn add_trims_name() {
        let mut store = make_store();
        store.add("  Metformin \n").unwrap();
        assert_eq!(store.list()[0].name, "Metformin");
    }

    #[test]
    fn empty_names_do_not_write() {
        let writes = Rc::new(Cell::new(0));
        let slot = CountingSlot {
            inner: MemorySlot::new(),
            writes: writes.clone(),
        };
        let mut store = ReminderStore::initialize(slot, DEFAULT_SLOT_KEY);

        assert_eq!(store.add("").unwrap(), AddOutcome::Ignored);
        assert_eq!(store.add(" \t ").unwrap(), AddOutcome::Ignored);
        assert!(store.list().is_empty());
        assert_eq!(writes.get(), 0);

        store.add("Metformin").unwrap();
        assert_eq!(writes.get(), 1);
    }

    #[test]
    fn initialize_does_not_write() {
        let writes = Rc::new(Cell::new(0));
        let slot = CountingSlot {
            inner: MemorySlot::with_value(DEFAULT_SLOT_KEY, "not json"),
            writes: writes.clone(),
        };
        let _store = ReminderStore::initialize(slot, DEFAULT_SLOT_KEY);
        assert_eq!(writes.get(), 0);
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut store = make_store();
        for name in ["A", "B", "C", "D", "E"] {
            store.add(name).unwrap();
        }
        let ids: Vec<i64> = store
            .list()
            .iter()
            .map(|r| r.id.as_millis().unwrap())
            .collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn in_memory_and_durable_copies_match_after_add() {
        let mut store = make_store();
        store.add("Metformin").unwrap();
        store.add("Lisinopril").unwrap();
        let listed = store.list().to_vec();
        let slot = store.into_slot();
        let raw = slot.read(DEFAULT_SLOT_KEY).unwrap().unwrap();
        assert_eq!(codec::decode(&raw).unwrap(), listed);
    }

    #[test]
    fn reinitialize_reproduces_list() {
        let mut store = make_store();
        store.add("Metformin").unwrap();
        store.add("Lisinopril").unwrap();
        store.add("Aspirin").unwrap();
        let before = store.list().to_vec();

        let reopened = ReminderStore::initialize(store.into_slot(), DEFAULT_SLOT_KEY);
        assert_eq!(reopened.list(), before.as_slice());
        assert!(matches!(reopened.load_outcome(), LoadOutcome::Restored(3)));
    }

    #[test]
    fn new_ids_follow_restored_ids() {
        let raw = r#"[{"id":"99999999999999","name":"Metformin","schedule":"09:00"}]"#;
        let slot = MemorySlot::with_value(DEFAULT_SLOT_KEY, raw);
        let mut store = ReminderStore::initialize(slot, DEFAULT_SLOT_KEY);
        store.add("Lisinopril").unwrap();
        assert_eq!(store.list()[1].id.as_millis(), Some(100_000_000_000_000));
    }

    #[test]
    fn initialize_with_corrupt_data_recovers_empty() {
        let slot = MemorySlot::with_value(DEFAULT_SLOT_KEY, "{garbage");
        let store = ReminderStore::initialize(slot, DEFAULT_SLOT_KEY);
        assert!(store.list().is_empty());
        match store.load_outcome() {
            LoadOutcome::Recovered(StoreError::ReadFailure { key, cause }) => {
                assert_eq!(key, DEFAULT_SLOT_KEY);
                assert!(matches!(cause, FailureCause::Codec(_)));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn initialize_with_unreadable_slot_recovers_empty() {
        let store = ReminderStore::initialize(BrokenSlot, DEFAULT_SLOT_KEY);
        assert!(store.list().is_empty());
        assert!(matches!(
            store.load_outcome(),
            LoadOutcome::Recovered(StoreError::ReadFailure {
                cause: FailureCause::Slot(_),
                ..
            })
        ));
    }

    #[test]
    fn corrupt_data_is_replaced_on_next_successful_add() {
        let slot = MemorySlot::with_value(DEFAULT_SLOT_KEY, "[1,2,3]");
        let mut store = ReminderStore::initialize(slot, DEFAULT_SLOT_KEY);
        store.add("Metformin").unwrap();
        let reopened = ReminderStore::initialize(store.into_slot(), DEFAULT_SLOT_KEY);
        assert_eq!(names(&reopened), vec!["Metformin"]);
    }

    #[test]
    fn write_failure_rolls_back() {
        let mut store = make_store();
        store.add("Metformin").unwrap();

        let mut slot = store.into_slot();
        slot.set_read_only(true);
        let mut store = ReminderStore::initialize(slot, DEFAULT_SLOT_KEY);

        let err = store.add("Aspirin").unwrap_err();
        assert!(matches!(
            err,
            StoreError::WriteFailure {
                cause: FailureCause::Slot(SlotError::ReadOnly(_)),
                ..
            }
        ));
        assert_eq!(names(&store), vec!["Metformin"]);

        let mut slot = store.into_slot();
        slot.set_read_only(false);
        let store = ReminderStore::initialize(slot, DEFAULT_SLOT_KEY);
        assert_eq!(names(&store), vec!["Metformin"]);
    }

    #[test]
    fn max_restored_id_reports_exhaustion() {
        let raw = r#"[{"id":"9223372036854775807","name":"Metformin","schedule":"09:00"}]"#;
        let slot = MemorySlot::with_value(DEFAULT_SLOT_KEY, raw);
        let mut store = ReminderStore::initialize(slot, DEFAULT_SLOT_KEY);

        let err = store.add("Lisinopril").unwrap_err();
        assert!(matches!(err, StoreError::IdsExhausted { .. }));
        assert_eq!(names(&store), vec!["Metformin"]);

        let slot = store.into_slot();
        assert_eq!(slot.read(DEFAULT_SLOT_KEY).unwrap().as_deref(), Some(raw));
    }

    #[test]
    fn whitespace_names_from_older_data_are_kept() {
        let raw = r#"[{"id":"1718000000000","name":"Metformin","schedule":"09:00"},{"id":"1718000000001","name":" ","schedule":"09:00"}]"#;
        let slot = MemorySlot::with_value(DEFAULT_SLOT_KEY, raw);
        let mut store = ReminderStore::initialize(slot, DEFAULT_SLOT_KEY);
        assert!(matches!(store.load_outcome(), LoadOutcome::Restored(2)));
        assert_eq!(names(&store), vec!["Metformin", " "]);

        store.add("Aspirin").unwrap();
        let reopened = ReminderStore::initialize(store.into_slot(), DEFAULT_SLOT_KEY);
        assert_eq!(names(&reopened), vec!["Metformin", " ", "Aspirin"]);
    }

    #[test]
    fn extra_fields_from_older_data_survive_rewrite() {
        let raw = r#"[{"id":"1718000000000","name":"Metformin","schedule":"09:00","dose":"500mg"}]"#;
        let slot = MemorySlot::with_value(DEFAULT_SLOT_KEY, raw);
        let mut store = ReminderStore::initialize(slot, DEFAULT_SLOT_KEY);
        assert_eq!(store.len(), 1);

        store.add("Aspirin").unwrap();
        let slot = store.into_slot();
        let stored = slot.read(DEFAULT_SLOT_KEY).unwrap().unwrap();
        assert!(stored.contains(r#""dose":"500mg""#));
    }

    #[test]
    fn list_is_idempotent() {
        let mut store = make_store();
        store.add("Metformin").unwrap();
        let first = store.list().to_vec();
        let second = store.list().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn sqlite_backed_store_survives_restart() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("reminders.db");
        let path = path.to_str().unwrap();

        let before = {
            let slot = SqliteSlot::open(path).unwrap();
            let mut store = ReminderStore::initialize(slot, DEFAULT_SLOT_KEY);
            store.add("Metformin").unwrap();
            store.add("Lisinopril").unwrap();
            store.list().to_vec()
        };

        let slot = SqliteSlot::open(path).unwrap();
        let store = ReminderStore::initialize(slot, DEFAULT_SLOT_KEY);
        assert_eq!(store.list(), before.as_slice());
    }

    #[test]
    fn sqlite_read_only_database_reports_write_failure() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("reminders.db");
        let path = path.to_str().unwrap();
        {
            let slot = SqliteSlot::open(path).unwrap();
            let mut store = ReminderStore::initialize(slot, DEFAULT_SLOT_KEY);
            store.add("Metformin").unwrap();
        }

        let slot = SqliteSlot::open_read_only(path).unwrap();
        let mut store = ReminderStore::initialize(slot, DEFAULT_SLOT_KEY);
        assert_eq!(names(&store), vec!["Metformin"]);
        let err = store.add("Aspirin").unwrap_err();
        assert!(matches!(err, StoreError::WriteFailure { .. }));
        assert_eq!(names(&store), vec!["Metformin"]);
    }

    #[test]
    fn stores_with_different_keys_are_independent() {
        let mut store = ReminderStore::initialize(MemorySlot::new(), "@a");
        store.add("Metformin").unwrap();
        let other = ReminderStore::initialize(store.into_slot(), "@b");
        assert!(other.is_empty());
        assert_eq!(other.key(), "@b");
    }
}
