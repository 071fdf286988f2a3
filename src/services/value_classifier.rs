use std::sync::OnceLock;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use regex::Regex;

/// Comparable form of a cell's display text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// `M/D H:MMam` tee-time style stamp, resolved against a calendar year.
    Date(NaiveDateTime),
    Numeric(f64),
    /// Lower-cased text.
    Text(String),
}

impl CellValue {
    pub fn is_date(&self) -> bool {
        matches!(self, CellValue::Date(_))
    }
}

static DATE_PATTERN: OnceLock<Regex> = OnceLock::new();
static NUMERIC_PREFIX: OnceLock<Regex> = OnceLock::new();

fn date_pattern() -> &'static Regex {
    DATE_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(\d+)/(\d+) (\d+):(\d+)(am|pm)").expect("date pattern is valid")
    })
}

fn numeric_prefix() -> &'static Regex {
    NUMERIC_PREFIX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
            .expect("numeric pattern is valid")
    })
}

pub fn current_year() -> i32 {
    Local::now().year()
}

/// Classifies a display string, checking date, then number, then text.
pub fn classify(raw: &str, year: i32) -> CellValue {
    let value = raw.trim();
    if let Some(date) = parse_date(value, year) {
        return CellValue::Date(date);
    }
    if let Some(number) = parse_leading_float(value) {
        return CellValue::Numeric(number);
    }
    CellValue::Text(value.to_lowercase())
}

/// Parses the first `M/D H:MMam|pm` stamp in `value`.
///
/// Returns `None` when there is no match or the match does not form a real
/// date and time (month 13, day 31 in April, minute 75, ...).
pub fn parse_date(value: &str, year: i32) -> Option<NaiveDateTime> {
    let caps = date_pattern().captures(value)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let mut hours: u32 = caps[3].parse().ok()?;
    let minutes: u32 = caps[4].parse().ok()?;
    let period = caps[5].to_ascii_lowercase();

    if period == "pm" && hours < 12 {
        hours += 12;
    }
    if period == "am" && hours == 12 {
        hours = 0;
    }

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hours, minutes, 0)
}

/// Parses a leading numeric run and ignores whatever follows it.
pub fn parse_leading_float(value: &str) -> Option<f64> {
    let run = numeric_prefix().find(value)?;
    run.as_str()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}
