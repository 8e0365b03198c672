//! Human-readable duration parsing and formatting.
//!
//! Durations are whole seconds. Accepted input forms are `1h30m`, `90m`,
//! `5400s`, `1h 20m 5s`, or a bare number of seconds (`5400`).

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)h").unwrap());
static MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)m").unwrap());
static SECONDS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)s").unwrap());

/// The input could not be read as a duration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid duration format: {input:?} (use e.g. 1h30m, 90m, 5400s or 5400)")]
pub struct InvalidDurationFormat {
    pub input: String,
}

impl InvalidDurationFormat {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

/// Formats seconds as `"{h}h {m}m {s}s"`, dropping leading zero units.
///
/// `None` renders as `"N/A"`. Negative values are treated as zero.
pub fn format(seconds: Option<i64>) -> String {
    let Some(seconds) = seconds else {
        return "N/A".to_string();
    };
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Formats seconds at minute resolution (`"1h 20m"`, `"45m"`).
pub fn format_short(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Parses a duration string into seconds.
pub fn parse(input: &str) -> Result<i64, InvalidDurationFormat> {
    let normalized = input.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(InvalidDurationFormat::new(input));
    }

    if normalized.chars().all(|c| c.is_ascii_digit()) {
        return normalized
            .parse()
            .map_err(|_| InvalidDurationFormat::new(input));
    }

    let mut total: i64 = 0;
    let mut matched = false;
    for (re, unit) in [(&*HOURS_RE, 3600), (&*MINUTES_RE, 60), (&*SECONDS_RE, 1)] {
        let Some(caps) = re.captures(&normalized) else {
            continue;
        };
        matched = true;
        let value: i64 = caps[1]
            .parse()
            .map_err(|_| InvalidDurationFormat::new(input))?;
        total = value
            .checked_mul(unit)
            .and_then(|part| total.checked_add(part))
            .ok_or_else(|| InvalidDurationFormat::new(input))?;
    }

    if !matched {
        return Err(InvalidDurationFormat::new(input));
    }
    Ok(total)
}
