//! Unit conversion utilities
//!
//! Handles conversion between Imperial (inch) and Metric (mm) display units
//! and the fixed-precision formatting used by the readout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Display unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayUnit {
    /// Inches, shown with 4 decimals
    Inch,
    /// Millimeters, shown with 2 decimals
    Millimeter,
}

impl Default for DisplayUnit {
    fn default() -> Self {
        Self::Inch
    }
}

impl DisplayUnit {
    /// Number of decimals shown for this unit
    pub fn decimals(self) -> usize {
        match self {
            Self::Inch => 4,
            Self::Millimeter => 2,
        }
    }

    /// Format a value with this unit's precision
    ///
    /// Values that round to zero never show a minus sign.
    pub fn format(self, value: f64) -> String {
        let text = format!("{:.*}", self.decimals(), value);
        match text.strip_prefix('-') {
            Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
            _ => text,
        }
    }

    /// The other unit
    pub fn toggled(self) -> Self {
        match self {
            Self::Inch => Self::Millimeter,
            Self::Millimeter => Self::Inch,
        }
    }

    /// Short label ("in" or "mm")
    pub fn label(self) -> &'static str {
        match self {
            Self::Inch => "in",
            Self::Millimeter => "mm",
        }
    }
}

impl fmt::Display for DisplayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inch => write!(f, "Inch"),
            Self::Millimeter => write!(f, "Millimeter"),
        }
    }
}

impl FromStr for DisplayUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inch" | "in" | "imperial" | "g20" => Ok(Self::Inch),
            "millimeter" | "mm" | "metric" | "g21" => Ok(Self::Millimeter),
            _ => Err(format!("Unknown display unit: {}", s)),
        }
    }
}

/// Scale factor that turns a value in `from` units into `to` units
pub fn factor(from: DisplayUnit, to: DisplayUnit) -> f64 {
    match (from, to) {
        (DisplayUnit::Inch, DisplayUnit::Millimeter) => MM_PER_INCH,
        (DisplayUnit::Millimeter, DisplayUnit::Inch) => 1.0 / MM_PER_INCH,
        _ => 1.0,
    }
}

/// Convert a value between units
pub fn convert(value: f64, from: DisplayUnit, to: DisplayUnit) -> f64 {
    value * factor(from, to)
}
