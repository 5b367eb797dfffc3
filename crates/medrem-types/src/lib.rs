use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Time-of-day assigned to every new reminder.  Not user-editable.
pub const DEFAULT_SCHEDULE: &str = "09:00";

/// Opaque, stable identifier of a [`Reminder`].
///
/// New ids are the decimal rendering of a millisecond creation timestamp,
/// but ids restored from storage are treated as arbitrary text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ReminderId(String);

impl ReminderId {
    /// Build an id from a millisecond timestamp.
    pub fn from_millis(ms: i64) -> Self {
        Self(ms.to_string())
    }

    /// The millisecond timestamp this id encodes, if it is numeric.
    pub fn as_millis(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ReminderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ReminderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single medication reminder.
///
/// Field order is part of the persisted format: `id`, `name`, `schedule`.
/// Any other fields found in stored data are carried in `extra` and written
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Reminder {
    /// Assigned at creation, never changes.
    pub id: ReminderId,
    /// Medication label as typed by the user (e.g. `"Metformin"`).
    pub name: String,
    /// Time of day, `HH:MM`.
    pub schedule: String,
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Reminder {
    /// Create a reminder with the [`DEFAULT_SCHEDULE`].
    pub fn new(id: ReminderId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            schedule: DEFAULT_SCHEDULE.to_string(),
            extra: BTreeMap::new(),
        }
    }
}

/// One set of self-reported vital signs.  Every measurement is optional;
/// rules skip readings that lack the values they need.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VitalsReading {
    /// Beats per minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f32>,
    /// Blood glucose in mg/dL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glucose_mg_dl: Option<f32>,
    /// Systolic blood pressure in mmHg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systolic_bp: Option<f32>,
    /// Diastolic blood pressure in mmHg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diastolic_bp: Option<f32>,
}

impl VitalsReading {
    /// `true` when no measurement was provided.
    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_none()
            && self.glucose_mg_dl.is_none()
            && self.systolic_bp.is_none()
            && self.diastolic_bp.is_none()
    }
}
