//! Numeric threshold rules checked against a value's history.
//!
//! Five strategies exist. `Absolute` compares against literal bounds; the
//! others compare against the previous passing sample or the running
//! average, and silently pass when that history does not exist yet.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector for a threshold strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMethod {
    Absolute,
    Percentage,
    PercentageAverage,
    Delta,
    DeltaAverage,
}

impl ThresholdMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Percentage => "percentage",
            Self::PercentageAverage => "percentage_average",
            Self::Delta => "delta",
            Self::DeltaAverage => "delta_average",
        }
    }
}

impl fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ThresholdMethod {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect();
        match normalized.as_str() {
            "absolute" => Ok(Self::Absolute),
            "percentage" => Ok(Self::Percentage),
            "percentageaverage" => Ok(Self::PercentageAverage),
            "delta" => Ok(Self::Delta),
            "deltaaverage" => Ok(Self::DeltaAverage),
            _ => Err(ThresholdError::UnknownMethod(s.to_string())),
        }
    }
}

/// Errors raised while constructing a rule. Never defaulted away.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    #[error("threshold declares no method")]
    MissingMethod,

    #[error("unknown threshold method `{0}`")]
    UnknownMethod(String),

    #[error("threshold method `{method}` requires `{parameter}`")]
    MissingParameter {
        method: ThresholdMethod,
        parameter: &'static str,
    },

    #[error("threshold `{parameter}` must be a finite, non-negative number, got {value}")]
    InvalidParameter { parameter: &'static str, value: f64 },
}

/// Loosely-typed rule declaration, as read from a schema scope or config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_negative_deltas: Option<bool>,
}

/// A validated threshold rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ThresholdRule {
    Absolute {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    Percentage {
        percentage: f64,
    },
    PercentageAverage {
        percentage: f64,
    },
    Delta {
        delta: f64,
        #[serde(default)]
        ignore_negative_deltas: bool,
    },
    DeltaAverage {
        delta: f64,
        #[serde(default)]
        ignore_negative_deltas: bool,
    },
}

fn limit(parameter: &'static str, value: f64) -> Result<f64, ThresholdError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ThresholdError::InvalidParameter { parameter, value })
    }
}

impl ThresholdRule {
    /// Validate a declaration into a rule.
    pub fn from_spec(spec: &ThresholdSpec) -> Result<Self, ThresholdError> {
        if spec.method.trim().is_empty() {
            return Err(ThresholdError::MissingMethod);
        }
        let method: ThresholdMethod = spec.method.parse()?;
        let missing = |parameter| ThresholdError::MissingParameter { method, parameter };
        let ignore_negative_deltas = spec.ignore_negative_deltas.unwrap_or(false);
        match method {
            ThresholdMethod::Absolute => {
                if spec.minimum.is_none() && spec.maximum.is_none() {
                    return Err(missing("minimum"));
                }
                Ok(Self::Absolute {
                    minimum: spec.minimum,
                    maximum: spec.maximum,
                })
            }
            ThresholdMethod::Percentage => Ok(Self::Percentage {
                percentage: limit("percentage", spec.percentage.ok_or(missing("percentage"))?)?,
            }),
            ThresholdMethod::PercentageAverage => Ok(Self::PercentageAverage {
                percentage: limit("percentage", spec.percentage.ok_or(missing("percentage"))?)?,
            }),
            ThresholdMethod::Delta => Ok(Self::Delta {
                delta: limit("delta", spec.delta.ok_or(missing("delta"))?)?,
                ignore_negative_deltas,
            }),
            ThresholdMethod::DeltaAverage => Ok(Self::DeltaAverage {
                delta: limit("delta", spec.delta.ok_or(missing("delta"))?)?,
                ignore_negative_deltas,
            }),
        }
    }

    pub fn method(&self) -> ThresholdMethod {
        match self {
            Self::Absolute { .. } => ThresholdMethod::Absolute,
            Self::Percentage { .. } => ThresholdMethod::Percentage,
            Self::PercentageAverage { .. } => ThresholdMethod::PercentageAverage,
            Self::Delta { .. } => ThresholdMethod::Delta,
            Self::DeltaAverage { .. } => ThresholdMethod::DeltaAverage,
        }
    }

    /// Check `value` against this rule.
    ///
    /// `previous` is the last passing sample and `average` the mean of all
    /// passing samples; either may be absent, in which case the rules that
    /// need it pass.
    pub fn is_valid(
        &self,
        value: f64,
        previous: Option<f64>,
        average: Option<f64>,
    ) -> Result<(), Violation> {
        match *self {
            Self::Absolute { minimum, maximum } => {
                if let Some(min) = minimum
                    && value < min
                {
                    return Err(Violation {
                        method: self.method(),
                        value,
                        limit: min,
                        deviation: min - value,
                        basis: Basis::Minimum,
                    });
                }
                if let Some(max) = maximum
                    && value > max
                {
                    return Err(Violation {
                        method: self.method(),
                        value,
                        limit: max,
                        deviation: value - max,
                        basis: Basis::Maximum,
                    });
                }
                Ok(())
            }
            Self::Percentage { percentage } => match previous {
                Some(base) => check_percentage(self.method(), value, Basis::Previous(base), percentage),
                None => Ok(()),
            },
            Self::PercentageAverage { percentage } => match average {
                Some(base) => check_percentage(self.method(), value, Basis::Average(base), percentage),
                None => Ok(()),
            },
            Self::Delta {
                delta,
                ignore_negative_deltas,
            } => match previous {
                Some(base) => check_delta(
                    self.method(),
                    value,
                    Basis::Previous(base),
                    delta,
                    ignore_negative_deltas,
                ),
                None => Ok(()),
            },
            Self::DeltaAverage {
                delta,
                ignore_negative_deltas,
            } => match average {
                Some(base) => check_delta(
                    self.method(),
                    value,
                    Basis::Average(base),
                    delta,
                    ignore_negative_deltas,
                ),
                None => Ok(()),
            },
        }
    }
}

fn check_percentage(
    method: ThresholdMethod,
    value: f64,
    basis: Basis,
    percentage: f64,
) -> Result<(), Violation> {
    let base = basis.value().unwrap_or_default();
    let diff = value - base;
    let deviation = if base == 0.0 {
        if diff == 0.0 { 0.0 } else { f64::INFINITY }
    } else {
        (diff / base).abs() * 100.0
    };
    if deviation > percentage {
        Err(Violation {
            method,
            value,
            limit: percentage,
            deviation,
            basis,
        })
    } else {
        Ok(())
    }
}

fn check_delta(
    method: ThresholdMethod,
    value: f64,
    basis: Basis,
    delta: f64,
    ignore_negative_deltas: bool,
) -> Result<(), Violation> {
    let diff = value - basis.value().unwrap_or_default();
    if ignore_negative_deltas && diff < 0.0 {
        return Ok(());
    }
    if diff.abs() > delta {
        Err(Violation {
            method,
            value,
            limit: delta,
            deviation: diff,
            basis,
        })
    } else {
        Ok(())
    }
}

/// What a value was compared against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Basis {
    Minimum,
    Maximum,
    Previous(f64),
    Average(f64),
}

impl Basis {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Previous(v) | Self::Average(v) => Some(v),
            Self::Minimum | Self::Maximum => None,
        }
    }
}

/// A failed threshold check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub method: ThresholdMethod,
    pub value: f64,
    pub limit: f64,
    /// Signed delta, percentage, or distance past the bound.
    pub deviation: f64,
    pub basis: Basis,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.basis {
            Basis::Minimum => write!(f, "{} is below the minimum {}", self.value, self.limit),
            Basis::Maximum => write!(f, "{} is above the maximum {}", self.value, self.limit),
            Basis::Previous(base) | Basis::Average(base) => {
                let against = if matches!(self.basis, Basis::Previous(_)) {
                    "previous"
                } else {
                    "average"
                };
                match self.method {
                    ThresholdMethod::Percentage | ThresholdMethod::PercentageAverage => write!(
                        f,
                        "{} deviates {:.2}% from {against} {base} (limit {}%)",
                        self.value, self.deviation, self.limit
                    ),
                    _ => write!(
                        f,
                        "{} deviates by {} from {against} {base} (limit {})",
                        self.value, self.deviation, self.limit
                    ),
                }
            }
        }
    }
}
