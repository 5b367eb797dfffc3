//! Encode/decode pair for the persisted reminder list.
//!
//! The stored value is a JSON array of objects with the fields `id`, `name`
//! and `schedule` (in that order, all strings):
//!
//! ```json
//! [{"id":"1718000000000","name":"Metformin","schedule":"09:00"}]
//! ```
//!
//! Decoding rejects anything other than an array of such objects, a record
//! with an empty `id`, and two records sharing an `id`.  Names are taken as
//! stored (older data may hold blank names) and extra fields are kept in
//! [`Reminder::extra`].

use std::collections::HashSet;

use medrem_types::Reminder;
use schemars::schema::RootSchema;
use thiserror::Error;

/// Errors produced while encoding or decoding the persisted list.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record {index} has an empty `{field}`")]
    EmptyField { index: usize, field: &'static str },
    #[error("duplicate reminder id `{0}`")]
    DuplicateId(String),
}

/// Serialize the full list.
pub fn encode(reminders: &[Reminder]) -> Result<String, CodecError> {
    Ok(serde_json::to_string(reminders)?)
}

/// Parse a stored value back into a list, preserving order.
pub fn decode(raw: &str) -> Result<Vec<Reminder>, CodecError> {
    let reminders: Vec<Reminder> = serde_json::from_str(raw)?;
    let mut seen = HashSet::with_capacity(reminders.len());
    for (index, reminder) in reminders.iter().enumerate() {
        if reminder.id.as_str().is_empty() {
            return Err(CodecError::EmptyField { index, field: "id" });
        }
        if !seen.insert(&reminder.id) {
            return Err(CodecError::DuplicateId(reminder.id.to_string()));
        }
    }
    Ok(reminders)
}

/// JSON schema describing the stored value.
pub fn schema() -> RootSchema {
    schemars::schema_for!(Vec<Reminder>)
}
