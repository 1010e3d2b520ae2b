//! Spreadsheet serial dates
//!
//! 1900 system: serial 1 = 1900-01-01, and serial 60 is the phantom
//! 1900-02-29 the format inherited from Lotus. 1904 system: serial 0 = 1904-01-01.

use chrono::format::{Item, StrftimeItems};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fmt::Write;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

fn epoch(use_1904_windowing: bool, serial: f64) -> Option<NaiveDateTime> {
    let date = if use_1904_windowing {
        NaiveDate::from_ymd_opt(1904, 1, 1)
    } else if serial < 61.0 {
        // Before the phantom leap day the offset is one day smaller
        NaiveDate::from_ymd_opt(1899, 12, 31)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    };
    date.and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Convert a serial number to a date-time, rounded to the millisecond.
///
/// Returns `None` for negative, non-finite or out-of-range serials.
pub fn serial_to_datetime(serial: f64, use_1904_windowing: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let base = epoch(use_1904_windowing, serial)?;
    let millis = (serial * MILLIS_PER_DAY).round();
    if millis > i64::MAX as f64 {
        return None;
    }
    base.checked_add_signed(Duration::milliseconds(millis as i64))
}

/// Render `datetime` with a chrono pattern.
///
/// Returns `None` when the pattern holds a specifier chrono cannot render.
pub fn format_datetime(datetime: &NaiveDateTime, pattern: &str) -> Option<String> {
    let mut text = String::new();
    write!(text, "{}", datetime.format(pattern)).ok()?;
    Some(text)
}

/// True when every specifier in `pattern` is known to chrono.
pub fn is_valid_date_pattern(pattern: &str) -> bool {
    StrftimeItems::new(pattern).all(|item| item != Item::Error)
}
