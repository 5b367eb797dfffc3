//! `medrem-store` – offline reminder storage.
//!
//! Keeps the medication-reminder list on the device so it survives restarts
//! without any network connectivity.
//!
//! # Modules
//!
//! - [`store`] – [`ReminderStore`][store::ReminderStore]: owns the in-memory
//!   list and writes the whole list through to a durable slot on every add.
//! - [`slot`] – [`KeyValueSlot`][slot::KeyValueSlot]: the durable key-value
//!   primitive, with a SQLite backend ([`SqliteSlot`][slot::SqliteSlot]) and
//!   a process-local one ([`MemorySlot`][slot::MemorySlot]).
//! - [`codec`] – strict JSON encode/decode of the stored list and its schema.
//! - [`id_clock`] – [`IdClock`][id_clock::IdClock]: monotonic
//!   timestamp-derived reminder ids.

pub mod codec;
pub mod id_clock;
pub mod slot;
pub mod store;

pub use slot::{KeyValueSlot, MemorySlot, SlotError, SqliteSlot};
pub use store::{AddOutcome, DEFAULT_SLOT_KEY, LoadOutcome, ReminderStore, StoreError};
