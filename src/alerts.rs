//! Threshold alerts on the most recent basis value.
//!
//! Evaluation returns a typed [`AlertResult`]; the caller decides whether to
//! log it, notify someone or ignore it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{BasisHedgeError, Result};

/// Default alert threshold, in price units
pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// Classification of the latest basis value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    WithinRange,
    ExceedsThreshold,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertStatus::WithinRange => write!(f, "WITHIN_RANGE"),
            AlertStatus::ExceedsThreshold => write!(f, "EXCEEDS_THRESHOLD"),
        }
    }
}

/// Outcome of an alert evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertResult {
    pub status: AlertStatus,
    /// The basis value that was inspected
    pub value: f64,
    /// The threshold it was compared against
    pub threshold: f64,
}

impl AlertResult {
    pub fn is_triggered(&self) -> bool {
        self.status == AlertStatus::ExceedsThreshold
    }
}

/// Compares the latest basis against a fixed threshold
#[derive(Debug, Clone, Copy)]
pub struct AlertEvaluator {
    pub threshold: f64,
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl AlertEvaluator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Classify the final value of `basis`.
    ///
    /// Strictly greater than the threshold (in absolute value) triggers;
    /// equal does not.
    pub fn evaluate(&self, basis: &[f64]) -> Result<AlertResult> {
        let value = *basis
            .last()
            .ok_or_else(|| BasisHedgeError::empty_series("cannot evaluate alert on an empty basis series"))?;

        let status = if value.abs() > self.threshold {
            AlertStatus::ExceedsThreshold
        } else {
            AlertStatus::WithinRange
        };

        Ok(AlertResult {
            status,
            value,
            threshold: self.threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exceeding_value_triggers() {
        let result = AlertEvaluator::new(2.0).evaluate(&[0.1, -0.4, 2.5]).unwrap();
        assert_eq!(result.status, AlertStatus::ExceedsThreshold);
        assert_eq!(result.value, 2.5);
        assert_eq!(result.threshold, 2.0);
        assert!(result.is_triggered());
    }

    #[test]
    fn value_inside_band_is_within_range() {
        let result = AlertEvaluator::default().evaluate(&[5.0, 1.0]).unwrap();
        assert_eq!(result.status, AlertStatus::WithinRange);
        assert_eq!(result.value, 1.0);
    }

    #[test]
    fn negative_basis_uses_absolute_value() {
        let result = AlertEvaluator::new(2.0).evaluate(&[-3.0]).unwrap();
        assert!(result.is_triggered());
    }

    #[test]
    fn boundary_value_does_not_trigger() {
        let result = AlertEvaluator::new(2.0).evaluate(&[2.0]).unwrap();
        assert_eq!(result.status, AlertStatus::WithinRange);
    }

    #[test]
    fn empty_basis_is_an_error() {
        let result = AlertEvaluator::default().evaluate(&[]);
        assert!(matches!(result, Err(BasisHedgeError::EmptySeries(_))));
    }
}
