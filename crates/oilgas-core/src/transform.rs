use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::error::{EtlError, Result};

const FULL_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%d-%b-%Y"];

// Month-granularity labels are parsed by prepending a day-of-month of 1.
const MONTH_FORMATS: &[&str] = &["%d %b-%Y", "%d %b %Y", "%d %B %Y", "%d %Y-%m"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];

/// First calendar day of the month the value falls in.
///
/// Accepts full dates ("2024-03-15", "3/15/2024") as well as the
/// month-granularity labels EIA extracts use ("Mar-2024", "Mar 2024",
/// "2024-03"). Idempotent: feeding the output back in returns the same day.
pub fn month_first_day(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();

    for format in FULL_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(first_of_month(date));
        }
    }

    let padded = format!("1 {trimmed}");
    for format in MONTH_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&padded, format) {
            return Ok(date);
        }
    }

    Err(EtlError::DateParse(trimmed.to_string()))
}

/// Gregorian days in a month, leap-year aware. `month` must be 1-12.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("month must be 1-12");
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1).expect("month must be 1-12");
    (next_first - first).num_days() as u32
}

/// Null-safe float conversion: empty or unparseable input becomes `None`.
pub fn to_f64_or_none(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Null-safe date conversion for registry fields; tolerates a trailing time
/// component. Empty or unparseable input becomes `None`.
pub fn to_date_or_none(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in FULL_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.date());
        }
    }
    None
}

/// Title-case with a word boundary at every non-alphabetic character,
/// matching how county names are normalized upstream ("ST. LAWRENCE" ->
/// "St. Lawrence").
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_boundary = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_boundary {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_boundary = false;
        } else {
            out.push(ch);
            at_boundary = true;
        }
    }
    out
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("day 1 always valid")
}
