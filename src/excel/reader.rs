//! Workbook reader - spreadsheet file → rows of tagged cell values

use crate::converter::serial_to_datetime;
use crate::error::{SheetError, SheetResult};
use crate::types::{CellValue, Row};
use calamine::{open_workbook_auto, Data, ExcelDateTime, Range, Reader, Sheets};
use chrono::NaiveDate;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads worksheets (.xlsx, .xlsm, .xlsb, .xls, .ods) into [`Row`]s.
pub struct SheetReader {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
    date_1904: bool,
}

impl SheetReader {
    /// Open a workbook; the format is picked from the file extension.
    pub fn open<P: AsRef<Path>>(path: P) -> SheetResult<Self> {
        let path = path.as_ref().to_path_buf();
        let workbook = open_workbook_auto(&path).map_err(|e| {
            SheetError::Workbook(format!("Failed to open {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), sheets = workbook.sheet_names().len(), "opened workbook");
        Ok(Self {
            path,
            workbook,
            date_1904: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// Whether the date cells of the last sheet read count from 1904-01-01.
    pub fn uses_1904_dates(&self) -> bool {
        self.date_1904
    }

    /// Read every row of `sheet` (the first sheet when `None`).
    ///
    /// Each row holds one entry per column of the used range, keyed by the
    /// absolute column index; blank cells are `CellValue::Empty`.
    pub fn read_rows(&mut self, sheet: Option<&str>) -> SheetResult<Vec<Row>> {
        let name = match sheet {
            Some(name) => {
                if !self.sheet_names().iter().any(|s| s == name) {
                    return Err(SheetError::Workbook(format!(
                        "Sheet '{}' not found in {} (available: {})",
                        name,
                        self.path.display(),
                        self.sheet_names().join(", ")
                    )));
                }
                name.to_string()
            }
            None => self.sheet_names().into_iter().next().ok_or_else(|| {
                SheetError::Workbook(format!("{} has no worksheets", self.path.display()))
            })?,
        };

        let range = self
            .workbook
            .worksheet_range(&name)
            .map_err(|e| SheetError::Workbook(format!("Failed to read sheet '{}': {}", name, e)))?;

        self.date_1904 = detect_1904_dates(&range);
        let rows = range_to_rows(&range);
        debug!(sheet = %name, rows = rows.len(), date_1904 = self.date_1904, "read sheet");
        Ok(rows)
    }
}

/// Convert a calamine range into rows keyed by absolute column index.
pub fn range_to_rows(range: &Range<Data>) -> Vec<Row> {
    if range.is_empty() {
        return Vec::new();
    }
    let first_col = range.start().map_or(0, |(_, col)| col as usize);

    range
        .rows()
        .map(|cells| {
            cells
                .iter()
                .enumerate()
                .map(|(offset, data)| (first_col + offset, CellValue::from(data)))
                .collect()
        })
        .collect()
}

/// True when the date cells of `range` use the 1904 date system.
///
/// Cells only carry the raw serial, so the first date cell decides: its
/// calendar date as calamine reads it is compared with the 1900 reading.
pub fn detect_1904_dates(range: &Range<Data>) -> bool {
    range
        .used_cells()
        .find_map(|(_, _, data)| match data {
            Data::DateTime(dt) if dt.is_datetime() => Some(is_1904_serial(dt)),
            _ => None,
        })
        .unwrap_or(false)
}

fn is_1904_serial(dt: &ExcelDateTime) -> bool {
    let (year, month, day, ..) = dt.to_ymd_hms_milli();
    let Some(date) = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
    else {
        return false;
    };
    // 1462 days apart; a day of slack covers rounding near midnight
    serial_to_datetime(dt.as_f64(), false)
        .is_some_and(|as_1900| (as_1900.date() - date).num_days().abs() > 1)
}
