//! `medrem-vitals` – rule-based vitals insights.
//!
//! Turns self-reported [`VitalsReading`][medrem_types::VitalsReading]s into
//! short advisory messages, one reading at a time or a whole CSV at once.
//! Nothing is stored and nothing is sent anywhere.
//!
//! # Modules
//!
//! - [`insights`] – [`InsightEngine`][insights::InsightEngine]: evaluates every
//!   registered [`Rule`][insights::Rule] against a reading and collects the
//!   [`Insight`][insights::Insight]s that fire.
//! - [`dataset`] – CSV import and [`summarize`][dataset::summarize], which
//!   counts flagged readings across a whole dataset.

pub mod dataset;
pub mod insights;

pub use dataset::{DatasetError, Summary, read_csv, read_csv_path, summarize};
pub use insights::{
    BloodPressureRule, GlucoseRule, HeartRateRule, Insight, InsightEngine, Rule, Thresholds,
};
