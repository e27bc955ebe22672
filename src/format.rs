//! Label formats chosen from the visible range (dates) or magnitude (values).
//!
//! Threshold values are fixed; tooltips and tests rely on exact boundaries.

use serde::{Deserialize, Serialize};

use crate::core::unix_seconds_to_datetime;

const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "µ", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    Date,
    DateHour,
    DateHourMinute,
    DayHourMinuteSecond,
}

impl DateFormat {
    #[must_use]
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Date => "%Y-%m-%d",
            Self::DateHour => "%Y-%m-%d %H:00",
            Self::DateHourMinute => "%Y-%m-%d %H:%M",
            Self::DayHourMinuteSecond => "%a %d, %H:%M:%S",
        }
    }

    /// Formats Unix seconds in UTC.
    #[must_use]
    pub fn format(self, time: f64) -> String {
        match unix_seconds_to_datetime(time) {
            Ok(datetime) => datetime.format(self.pattern()).to_string(),
            Err(_) => "nan".to_owned(),
        }
    }
}

/// Picks the date format for a visible x range measured in days.
#[must_use]
pub fn date_format(visible_range_days: f64) -> DateFormat {
    if visible_range_days >= 30.0 {
        DateFormat::Date
    } else if visible_range_days >= 5.0 {
        DateFormat::DateHour
    } else if visible_range_days >= 0.25 {
        DateFormat::DateHourMinute
    } else {
        DateFormat::DayHourMinuteSecond
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberFormat {
    /// Scaled by an SI prefix, e.g. `1.0000M`.
    SiPrefix { significant: u8 },
    Fixed { decimals: u8 },
    /// Fixed notation rounded to significant digits, e.g. `9999.0`.
    Significant { digits: u8 },
    /// Rounded integer with thousands separators, e.g. `10,001`.
    GroupedInteger,
}

impl NumberFormat {
    #[must_use]
    pub fn format(self, value: f64) -> String {
        if !value.is_finite() {
            return "nan".to_owned();
        }
        match self {
            Self::SiPrefix { significant } => format_si(value, usize::from(significant.max(1))),
            Self::Fixed { decimals } => {
                let decimals = usize::from(decimals);
                format!("{value:.decimals$}")
            }
            Self::Significant { digits } => format_significant(value, usize::from(digits.max(1))),
            Self::GroupedInteger => format_grouped_integer(value),
        }
    }
}

/// Picks the value format from the magnitude of `value`.
#[must_use]
pub fn number_format(value: f64) -> NumberFormat {
    let magnitude = value.abs();
    if magnitude < 0.001 || magnitude >= 1_000_000.0 {
        NumberFormat::SiPrefix { significant: 5 }
    } else if magnitude < 1.0 {
        NumberFormat::Fixed { decimals: 5 }
    } else if magnitude < 10_000.0 {
        NumberFormat::Significant { digits: 5 }
    } else {
        NumberFormat::GroupedInteger
    }
}

fn decimal_exponent(value: f64) -> i32 {
    value.abs().log10().floor() as i32
}

fn round_to_decimals(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn format_si(value: f64, significant: usize) -> String {
    let zero_decimals = significant - 1;
    if value == 0.0 {
        return format!("{:.zero_decimals$}", 0.0);
    }

    let exponent = decimal_exponent(value);
    let mut prefix_exponent = (exponent.div_euclid(3) * 3).clamp(-24, 24);
    let mut decimals = (significant as i32 - 1 - (exponent - prefix_exponent)).max(0) as usize;
    let mut scaled = value / 10f64.powi(prefix_exponent);

    // Rounding can carry into the next prefix (999.995k -> 1.0000M).
    if round_to_decimals(scaled, decimals).abs() >= 1000.0 && prefix_exponent < 24 {
        prefix_exponent += 3;
        scaled = value / 10f64.powi(prefix_exponent);
        decimals = zero_decimals;
    }

    let prefix = SI_PREFIXES[(prefix_exponent / 3 + 8) as usize];
    format!("{scaled:.decimals$}{prefix}")
}

fn format_significant(value: f64, digits: usize) -> String {
    if value == 0.0 {
        let decimals = digits - 1;
        return format!("{:.decimals$}", 0.0);
    }

    let exponent = decimal_exponent(value);
    let mut decimals = (digits as i32 - 1 - exponent).max(0) as usize;
    if decimals > 0 && decimal_exponent(round_to_decimals(value, decimals)) > exponent {
        decimals -= 1;
    }
    format!("{value:.decimals$}")
}

fn format_grouped_integer(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}
