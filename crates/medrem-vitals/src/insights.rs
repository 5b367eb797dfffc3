//! [`InsightEngine`] – threshold rules over a vitals reading.
//!
//! Every registered [`Rule`] is evaluated in insertion order and every rule
//! that fires contributes one [`Insight`].  A rule only fires when the values
//! it needs are present; comparisons are strict (`>`), so a reading exactly
//! at a threshold is not flagged.
//!
//! Three built-in rules are provided:
//! - [`HeartRateRule`] – heart rate above `max_bpm`.
//! - [`GlucoseRule`] – blood glucose above `max_mg_dl`.
//! - [`BloodPressureRule`] – systolic or diastolic above its cap; needs both
//!   values.

use medrem_types::VitalsReading;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ────────────────────────────────────────────────────────────────────────────
// Insight / Rule
// ────────────────────────────────────────────────────────────────────────────

/// One advisory message produced by a [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    /// Name of the rule that produced the message.
    pub rule: String,
    pub message: String,
}

/// A single check over a [`VitalsReading`].
///
/// Implement this trait to add custom checks to an [`InsightEngine`] via
/// [`InsightEngine::add_rule`].
pub trait Rule: Send + Sync {
    /// Short identifier used in [`Insight::rule`].
    fn name(&self) -> &str;

    /// Return an [`Insight`] when the reading trips this rule.
    fn evaluate(&self, reading: &VitalsReading) -> Option<Insight>;
}

// ────────────────────────────────────────────────────────────────────────────
// Thresholds
// ────────────────────────────────────────────────────────────────────────────

/// Caps used by the built-in rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub max_heart_rate: f32,
    pub max_glucose_mg_dl: f32,
    pub max_systolic_bp: f32,
    pub max_diastolic_bp: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_heart_rate: 100.0,
            max_glucose_mg_dl: 180.0,
            max_systolic_bp: 140.0,
            max_diastolic_bp: 90.0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// InsightEngine
// ────────────────────────────────────────────────────────────────────────────

/// Runs every registered [`Rule`] against a reading.
///
/// # Example
///
/// ```
/// use medrem_types::VitalsReading;
/// use medrem_vitals::InsightEngine;
///
/// let engine = InsightEngine::with_default_rules();
///
/// let calm = VitalsReading { heart_rate: Some(72.0), ..Default::default() };
/// assert!(engine.evaluate(&calm).is_empty());
///
/// let racing = VitalsReading { heart_rate: Some(120.0), ..Default::default() };
/// assert_eq!(engine.evaluate(&racing)[0].rule, "heart_rate");
/// ```
#[derive(Default)]
pub struct InsightEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl InsightEngine {
    /// Create an engine with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with the three built-in rules at their default thresholds.
    pub fn with_default_rules() -> Self {
        Self::from_thresholds(Thresholds::default())
    }

    /// Engine with the three built-in rules at the given thresholds.
    pub fn from_thresholds(t: Thresholds) -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(HeartRateRule {
            max_bpm: t.max_heart_rate,
        }));
        engine.add_rule(Box::new(GlucoseRule {
            max_mg_dl: t.max_glucose_mg_dl,
        }));
        engine.add_rule(Box::new(BloodPressureRule {
            max_systolic: t.max_systolic_bp,
            max_diastolic: t.max_diastolic_bp,
        }));
        engine
    }

    /// Register a new [`Rule`].  Rules are evaluated in insertion order.
    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Collect the insights of every rule that fires, in rule order.
    pub fn evaluate(&self, reading: &VitalsReading) -> Vec<Insight> {
        let insights: Vec<Insight> = self
            .rules
            .iter()
            .filter_map(|rule| rule.evaluate(reading))
            .collect();
        debug!(rules = self.rules.len(), fired = insights.len(), "Evaluated vitals reading");
        insights
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in rules
// ────────────────────────────────────────────────────────────────────────────

fn insight(rule: &dyn Rule, message: &str) -> Insight {
    Insight {
        rule: rule.name().to_string(),
        message: message.to_string(),
    }
}

/// Flags a heart rate above `max_bpm`.
pub struct HeartRateRule {
    pub max_bpm: f32,
}

impl Rule for HeartRateRule {
    fn name(&self) -> &str {
        "heart_rate"
    }

    fn evaluate(&self, reading: &VitalsReading) -> Option<Insight> {
        let bpm = reading.heart_rate?;
        (bpm > self.max_bpm).then(|| {
            insight(self, "Elevated heart rate detected. Consider contacting provider.")
        })
    }
}

/// Flags blood glucose above `max_mg_dl`.
pub struct GlucoseRule {
    pub max_mg_dl: f32,
}

impl Rule for GlucoseRule {
    fn name(&self) -> &str {
        "glucose"
    }

    fn evaluate(&self, reading: &VitalsReading) -> Option<Insight> {
        let glucose = reading.glucose_mg_dl?;
        (glucose > self.max_mg_dl).then(|| {
            insight(self, "High blood glucose reading. Follow diabetes action plan.")
        })
    }
}

/// Flags a blood pressure reading where either value exceeds its cap.  Both
/// systolic and diastolic must be present.
pub struct BloodPressureRule {
    pub max_systolic: f32,
    pub max_diastolic: f32,
}

impl Rule for BloodPressureRule {
    fn name(&self) -> &str {
        "blood_pressure"
    }

    fn evaluate(&self, reading: &VitalsReading) -> Option<Insight> {
        let systolic = reading.systolic_bp?;
        let diastolic = reading.diastolic_bp?;
        (systolic > self.max_systolic || diastolic > self.max_diastolic).then(|| {
            insight(
                self,
                "Hypertensive-range blood pressure detected. Re-check and consult physician.",
            )
        })
    }
}
