//! Built-in conversion routines
//!
//! | target          | accepted kinds                         |
//! |-----------------|----------------------------------------|
//! | `String`        | STRING, NUMBER, BOOLEAN, DATE, ERROR   |
//! | `f64`           | NUMBER, STRING, BOOLEAN                |
//! | `i64`           | NUMBER, STRING, BOOLEAN                |
//! | `bool`          | BOOLEAN, NUMBER, STRING                |
//! | `NaiveDateTime` | DATE, NUMBER, STRING                   |

use super::dates::{format_datetime, serial_to_datetime};
use super::{FieldDescriptor, FnConverter, RegistryBuilder};
use crate::config::GlobalConfig;
use crate::error::RoutineError;
use crate::types::{CellKind, CellValue};
use chrono::NaiveDateTime;

type Field<'a> = Option<&'a FieldDescriptor>;

/// Register the default routines on `builder`.
pub fn register_defaults(builder: &mut RegistryBuilder) {
    for kind in [
        CellKind::String,
        CellKind::Number,
        CellKind::Boolean,
        CellKind::Date,
        CellKind::Error,
    ] {
        builder.register::<String>(kind, FnConverter::new(to_text));
    }

    for kind in [CellKind::Number, CellKind::String, CellKind::Boolean] {
        builder.register::<f64>(kind, FnConverter::new(to_f64));
        builder.register::<i64>(kind, FnConverter::new(to_i64));
        builder.register::<bool>(kind, FnConverter::new(to_bool));
    }

    for kind in [CellKind::Date, CellKind::Number, CellKind::String] {
        builder.register::<NaiveDateTime>(kind, FnConverter::new(to_datetime));
    }
}

fn unexpected(cell: &CellValue, target: &str) -> RoutineError {
    format!("{} cell cannot be read as {}", cell.kind(), target).into()
}

fn text_payload<'a>(s: &'a str, config: &GlobalConfig) -> &'a str {
    if config.auto_trim {
        s.trim()
    } else {
        s
    }
}

//==============================================================================
// Text
//==============================================================================

fn to_text(cell: &CellValue, field: Field<'_>, config: &GlobalConfig) -> Result<String, RoutineError> {
    match cell {
        CellValue::String(s) => Ok(text_payload(s, config).to_string()),
        CellValue::Number(n) => Ok(format_number(*n, field.and_then(FieldDescriptor::format))),
        CellValue::Boolean(b) => Ok(b.to_string()),
        CellValue::Date(serial) => {
            let datetime = serial_to_datetime(*serial, config.use_1904_windowing)
                .ok_or_else(|| format!("date serial {} is out of range", serial))?;
            let pattern = field
                .and_then(FieldDescriptor::format)
                .unwrap_or(config.date_format.as_str());
            format_datetime(&datetime, pattern)
                .ok_or_else(|| format!("invalid date pattern '{}'", pattern).into())
        }
        CellValue::Error(e) => Ok(e.clone()),
        CellValue::Empty => Err(unexpected(cell, "text")),
    }
}

/// Render a number as text.
///
/// A pattern like `0.00` fixes the number of decimals; otherwise the shortest
/// text that reads back to the same value is used, without a trailing `.0`.
pub(crate) fn format_number(n: f64, pattern: Option<&str>) -> String {
    if let Some(decimals) = pattern.and_then(pattern_decimals) {
        return format!("{:.*}", decimals, n);
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    n.to_string()
}

/// Decimal places of a `0`, `0.0`, `#,##0.00` style pattern.
fn pattern_decimals(pattern: &str) -> Option<usize> {
    if pattern.is_empty() || !pattern.chars().all(|c| matches!(c, '0' | '#' | ',' | '.')) {
        return None;
    }
    Some(pattern.split_once('.').map_or(0, |(_, frac)| frac.len()))
}

//==============================================================================
// Numbers
//==============================================================================

fn to_f64(cell: &CellValue, _field: Field<'_>, config: &GlobalConfig) -> Result<f64, RoutineError> {
    match cell {
        CellValue::Number(n) => Ok(*n),
        CellValue::String(s) => {
            let text = text_payload(s, config);
            Ok(text
                .parse::<f64>()
                .map_err(|e| format!("'{}' is not a number: {}", text, e))?)
        }
        CellValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        _ => Err(unexpected(cell, "number")),
    }
}

fn to_i64(cell: &CellValue, _field: Field<'_>, config: &GlobalConfig) -> Result<i64, RoutineError> {
    match cell {
        CellValue::Number(n) => {
            if !n.is_finite() || n.abs() >= 9.2e18 {
                return Err(format!("{} does not fit an integer", n).into());
            }
            Ok(n.trunc() as i64)
        }
        CellValue::String(s) => {
            let text = text_payload(s, config);
            Ok(text
                .parse::<i64>()
                .map_err(|e| format!("'{}' is not an integer: {}", text, e))?)
        }
        CellValue::Boolean(b) => Ok(i64::from(*b)),
        _ => Err(unexpected(cell, "integer")),
    }
}

fn to_bool(cell: &CellValue, _field: Field<'_>, config: &GlobalConfig) -> Result<bool, RoutineError> {
    match cell {
        CellValue::Boolean(b) => Ok(*b),
        CellValue::Number(n) => Ok(*n == 1.0),
        CellValue::String(s) => {
            let text = text_payload(s, config);
            match text.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(format!("'{}' is not a boolean", text).into()),
            }
        }
        _ => Err(unexpected(cell, "boolean")),
    }
}

//==============================================================================
// Dates
//==============================================================================

fn to_datetime(
    cell: &CellValue,
    field: Field<'_>,
    config: &GlobalConfig,
) -> Result<NaiveDateTime, RoutineError> {
    match cell {
        CellValue::Date(serial) | CellValue::Number(serial) => {
            serial_to_datetime(*serial, config.use_1904_windowing)
                .ok_or_else(|| format!("date serial {} is out of range", serial).into())
        }
        CellValue::String(s) => {
            let text = text_payload(s, config);
            let pattern = field
                .and_then(FieldDescriptor::format)
                .unwrap_or(config.date_format.as_str());
            parse_datetime(text, pattern)
        }
        _ => Err(unexpected(cell, "date")),
    }
}

/// Parse with `pattern`; a date-only pattern yields midnight.
fn parse_datetime(text: &str, pattern: &str) -> Result<NaiveDateTime, RoutineError> {
    match NaiveDateTime::parse_from_str(text, pattern) {
        Ok(datetime) => Ok(datetime),
        Err(first) => chrono::NaiveDate::parse_from_str(text, pattern)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or_else(|| format!("'{}' does not match '{}': {}", text, pattern, first).into()),
    }
}
