use calamine::Data;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

//==============================================================================
// Cell Kind
//==============================================================================

/// Source kind tag carried by every cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Empty,
    String,
    Number,
    Boolean,
    Date,
    Error,
}

impl CellKind {
    pub const ALL: [CellKind; 6] = [
        CellKind::Empty,
        CellKind::String,
        CellKind::Number,
        CellKind::Boolean,
        CellKind::Date,
        CellKind::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CellKind::Empty => "EMPTY",
            CellKind::String => "STRING",
            CellKind::Number => "NUMBER",
            CellKind::Boolean => "BOOLEAN",
            CellKind::Date => "DATE",
            CellKind::Error => "ERROR",
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//==============================================================================
// Tagged Cell Value
//==============================================================================

/// A cell value as produced by the reader.
///
/// The variant is the kind tag; the payload is only meaningful for that kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    String(String),
    Number(f64),
    Boolean(bool),
    /// Spreadsheet serial date (days since the workbook epoch, fraction = time of day)
    Date(f64),
    /// Formula error text, e.g. `#DIV/0!`
    Error(String),
}

impl CellValue {
    pub fn kind(&self) -> CellKind {
        match self {
            CellValue::Empty => CellKind::Empty,
            CellValue::String(_) => CellKind::String,
            CellValue::Number(_) => CellKind::Number,
            CellValue::Boolean(_) => CellKind::Boolean,
            CellValue::Date(_) => CellKind::Date,
            CellValue::Error(_) => CellKind::Error,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => f.write_str("EMPTY"),
            CellValue::String(s) => write!(f, "STRING({})", s),
            CellValue::Number(n) => write!(f, "NUMBER({})", n),
            CellValue::Boolean(b) => write!(f, "BOOLEAN({})", b),
            CellValue::Date(d) => write!(f, "DATE({})", d),
            CellValue::Error(e) => write!(f, "ERROR({})", e),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::String(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::DateTime(dt) => CellValue::Date(dt.as_f64()),
            // ISO text keeps its original spelling
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
        }
    }
}

impl From<Data> for CellValue {
    fn from(data: Data) -> Self {
        CellValue::from(&data)
    }
}

//==============================================================================
// Generic Container
//==============================================================================

/// Converted payload together with the cell it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CellData<T> {
    pub cell: CellValue,
    pub data: T,
}

impl<T> CellData<T> {
    pub fn new(cell: CellValue, data: T) -> Self {
        Self { cell, data }
    }

    pub fn kind(&self) -> CellKind {
        self.cell.kind()
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

/// One row of cells keyed by column index.
pub type Row = BTreeMap<usize, CellValue>;

/// Textual projection of a row; `None` marks an empty cell.
pub type TextRow = BTreeMap<usize, Option<String>>;
