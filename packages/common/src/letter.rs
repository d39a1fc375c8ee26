//! Letter-grade lookup against a grading scale.
//!
//! A scale is a JSON object mapping a threshold key to a label, e.g.
//! `{"70": "A", "60": "B"}` or `{"70-100": "A", "60-69": "B"}`. Keys that do
//! not parse as a number or a range (`"A1"`, `"B2"`, ...) are kept on the
//! scale but never match.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::grading::GradingError;

/// Parsed form of a scale key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// `"70"`, `"4.0"`: matches grades at or above the value.
    AtLeast(f64),
    /// `"70-100"`: inclusive range; the lower bound decides the match.
    Range { low: f64, high: f64 },
}

impl Threshold {
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        if let Ok(v) = key.parse::<f64>() {
            return v.is_finite().then_some(Self::AtLeast(v));
        }
        let (low, high) = key.split_once('-')?;
        let low = low.trim().parse::<f64>().ok()?;
        let high = high.trim().parse::<f64>().ok()?;
        (low.is_finite() && high.is_finite()).then_some(Self::Range { low, high })
    }

    /// Smallest grade this threshold accepts.
    pub fn floor(&self) -> f64 {
        match *self {
            Self::AtLeast(v) => v,
            Self::Range { low, .. } => low,
        }
    }
}

/// Check that a scale is a non-empty object of string labels with sane ranges.
pub fn validate_scale(grades: &Value) -> Result<(), GradingError> {
    let map = grades
        .as_object()
        .ok_or_else(|| GradingError::InvalidScale("grades must be a JSON object".into()))?;
    if map.is_empty() {
        return Err(GradingError::InvalidScale(
            "grades must contain at least one threshold".into(),
        ));
    }
    for (key, label) in map {
        if !label.is_string() {
            return Err(GradingError::InvalidScale(format!(
                "label for '{key}' must be a string"
            )));
        }
        if let Some(Threshold::Range { low, high }) = Threshold::parse(key)
            && low > high
        {
            return Err(GradingError::InvalidScale(format!(
                "range '{key}' has its lower bound above its upper bound"
            )));
        }
    }
    Ok(())
}

/// Map a final grade to a label.
///
/// Thresholds are scanned from the highest floor down and the first one
/// whose floor is at or below `final_grade` wins.
pub fn letter_for(grades: &Map<String, Value>, final_grade: f64) -> Option<String> {
    let mut thresholds: Vec<(f64, &Value)> = grades
        .iter()
        .filter_map(|(key, label)| Threshold::parse(key).map(|t| (t.floor(), label)))
        .collect();
    thresholds.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    thresholds
        .into_iter()
        .find(|(floor, _)| *floor <= final_grade)
        .map(|(_, label)| match label {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}
