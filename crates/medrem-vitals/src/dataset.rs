//! Bulk vitals: read a CSV of readings and summarize it.
//!
//! The CSV must have a header row.  Recognised columns are `heart_rate`,
//! `glucose_mg_dl`, `systolic_bp` and `diastolic_bp`; other columns are
//! ignored and empty cells are treated as missing values.
//!
//! ```text
//! heart_rate,glucose_mg_dl,systolic_bp,diastolic_bp
//! 72,110,120,80
//! 118,,150,95
//! ```
//!
//! [`summarize`] counts the readings over each [`Thresholds`] cap.  A count is
//! only reported when the measurement it needs appears somewhere in the data.

use std::fs::File;
use std::io;
use std::path::Path;

use medrem_types::VitalsReading;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::insights::Thresholds;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("row {row}: {source}")]
    Row {
        /// 1-based data row (the header is not counted).
        row: usize,
        #[source]
        source: csv::Error,
    },
}

/// Parse readings from any CSV source.
pub fn read_csv<R: io::Read>(reader: R) -> Result<Vec<VitalsReading>, DatasetError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut readings = Vec::new();
    for (index, record) in rdr.deserialize::<VitalsReading>().enumerate() {
        let reading = record.map_err(|source| DatasetError::Row {
            row: index + 1,
            source,
        })?;
        readings.push(reading);
    }
    Ok(readings)
}

/// Parse readings from a CSV file.
pub fn read_csv_path(path: impl AsRef<Path>) -> Result<Vec<VitalsReading>, DatasetError> {
    let file = File::open(path.as_ref())?;
    let readings = read_csv(file)?;
    debug!(path = %path.as_ref().display(), rows = readings.len(), "Vitals CSV read");
    Ok(readings)
}

/// Flag counts and advisory messages for a set of readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub rows: usize,
    /// Readings with glucose above the cap; `None` when no glucose was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_glucose_count: Option<usize>,
    /// Readings with heart rate above the cap; `None` when no heart rate was
    /// recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tachy_count: Option<usize>,
    /// Readings with systolic or diastolic above its cap; `None` unless both
    /// measurements were recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hypertensive_count: Option<usize>,
    pub insights: Vec<String>,
}

/// Count flagged readings and produce one message per flag that fired.
pub fn summarize(readings: &[VitalsReading], t: &Thresholds) -> Summary {
    let recorded = |value: fn(&VitalsReading) -> Option<f32>| {
        readings.iter().any(|r| value(r).is_some())
    };
    let flagged = |pred: &dyn Fn(&VitalsReading) -> bool| {
        readings.iter().filter(|r| pred(r)).count()
    };

    let high_glucose_count = recorded(|r| r.glucose_mg_dl)
        .then(|| flagged(&|r| exceeds(r.glucose_mg_dl, t.max_glucose_mg_dl)));
    let tachy_count = recorded(|r| r.heart_rate)
        .then(|| flagged(&|r| exceeds(r.heart_rate, t.max_heart_rate)));
    let hypertensive_count = (recorded(|r| r.systolic_bp) && recorded(|r| r.diastolic_bp))
        .then(|| {
            flagged(&|r| {
                exceeds(r.systolic_bp, t.max_systolic_bp)
                    || exceeds(r.diastolic_bp, t.max_diastolic_bp)
            })
        });

    let mut insights = Vec::new();
    if high_glucose_count.unwrap_or(0) > 0 {
        insights.push(format!(
            "Some readings indicate high blood glucose (>{} mg/dL). Follow diabetes action plan.",
            t.max_glucose_mg_dl
        ));
    }
    if tachy_count.unwrap_or(0) > 0 {
        insights.push(format!(
            "Some readings show elevated heart rate (>{} bpm). Consider evaluation.",
            t.max_heart_rate
        ));
    }
    if hypertensive_count.unwrap_or(0) > 0 {
        insights.push(
            "Some blood pressure readings are in hypertensive range. Recheck and consult."
                .to_string(),
        );
    }

    debug!(
        rows = readings.len(),
        ?high_glucose_count,
        ?tachy_count,
        ?hypertensive_count,
        "Vitals dataset summarized"
    );

    Summary {
        rows: readings.len(),
        high_glucose_count,
        tachy_count,
        hypertensive_count,
        insights,
    }
}

fn exceeds(value: Option<f32>, cap: f32) -> bool {
    value.is_some_and(|v| v > cap)
}
