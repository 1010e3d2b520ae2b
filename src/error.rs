use crate::types::{CellKind, CellValue};
use thiserror::Error;

pub type SheetResult<T> = Result<T, SheetError>;

/// Failure raised by a conversion routine itself (malformed data, parse failure, ...).
pub type RoutineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by converter dispatch.
///
/// Both variants are terminal for the current conversion. The dispatcher never
/// substitutes a default value, so the caller decides whether to skip the row
/// or abort the read.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Converter not found, convert {kind} to {target}")]
    ConverterNotFound { kind: CellKind, target: &'static str },

    #[error("Convert data {cell} to {target} error")]
    ConversionFailed {
        cell: CellValue,
        target: &'static str,
        #[source]
        source: RoutineError,
    },
}

impl ConvertError {
    /// Name of the destination type the conversion was aimed at.
    pub fn target(&self) -> &'static str {
        match self {
            ConvertError::ConverterNotFound { target, .. } => target,
            ConvertError::ConversionFailed { target, .. } => target,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ConvertError::ConverterNotFound { .. })
    }
}

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to convert row {row}")]
    Row {
        row: usize,
        #[source]
        source: ConvertError,
    },

    #[error(transparent)]
    Convert(#[from] ConvertError),
}
