//! Human-scaled byte counts and rates.

use serde::Serialize;

const KB: f64 = 1000.0;
const MB: f64 = 1000.0 * 1000.0;
const GB: f64 = 1000.0 * 1000.0 * 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    #[serde(rename = "bytes")]
    Bytes,
    Kb,
    Mb,
    Gb,
}

impl Unit {
    pub fn label(self) -> &'static str {
        match self {
            Unit::Bytes => "bytes",
            Unit::Kb => "Kb",
            Unit::Mb => "Mb",
            Unit::Gb => "Gb",
        }
    }

    /// Picks the bracket for a byte count. Lower bounds are inclusive.
    pub fn for_bytes(total_bytes: f64) -> Self {
        if total_bytes < KB {
            Unit::Bytes
        } else if total_bytes < MB {
            Unit::Kb
        } else if total_bytes < GB {
            Unit::Mb
        } else {
            Unit::Gb
        }
    }

    fn divisor(self) -> f64 {
        match self {
            Unit::Bytes => 1.0,
            Unit::Kb => KB,
            Unit::Mb => MB,
            Unit::Gb => GB,
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaledResult {
    pub value: f64,
    pub rate: f64,
    pub unit: Unit,
}

/// Scales `total_bytes` into the largest unit not exceeding it and derives the
/// per-second rate in that unit.
///
/// `elapsed_secs` must be positive for a meaningful rate; a zero or negative
/// duration yields a rate of `0.0`.
pub fn scale(total_bytes: f64, elapsed_secs: f64) -> ScaledResult {
    let unit = Unit::for_bytes(total_bytes);
    let value = total_bytes / unit.divisor();
    let rate = if elapsed_secs > 0.0 { value / elapsed_secs } else { 0.0 };
    ScaledResult { value, rate, unit }
}
