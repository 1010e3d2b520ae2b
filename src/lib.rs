//! Sheetbind - typed conversion of spreadsheet cells
//!
//! This library turns tagged cell values produced by a spreadsheet reader
//! into typed Rust values. A routine is resolved per
//! `(destination type, cell kind)` from a read-only registry, unless the
//! destination field carries its own converter.
//!
//! # Features
//!
//! - Destination types resolved ahead of time, including `CellData<T>` containers
//! - Lock-free registry lookups, shareable across threads
//! - Field converters that override the registry per field
//! - Fail-fast text projection of whole rows
//! - Built-in converters for text, numbers, booleans and dates
//! - Workbook reading through calamine
//!
//! # Example
//!
//! ```
//! use royalbit_sheetbind::config::GlobalConfig;
//! use royalbit_sheetbind::converter::{convert_row_to_text, ConverterRegistry};
//! use royalbit_sheetbind::types::{CellValue, Row};
//!
//! let registry = ConverterRegistry::with_defaults();
//! let mut row = Row::new();
//! row.insert(0, CellValue::String("bolt".to_string()));
//! row.insert(1, CellValue::Empty);
//! row.insert(2, CellValue::Number(12.0));
//!
//! let text = convert_row_to_text(&row, &registry, &GlobalConfig::default())?;
//! assert_eq!(text[&0].as_deref(), Some("bolt"));
//! assert_eq!(text[&1], None);
//! assert_eq!(text[&2].as_deref(), Some("12"));
//! # Ok::<(), royalbit_sheetbind::ConvertError>(())
//! ```

pub mod cli;
pub mod config;
pub mod converter;
pub mod error;
pub mod excel;
pub mod types;

// Re-export commonly used types
pub use config::GlobalConfig;
pub use converter::{
    convert, convert_field, convert_row_to_text, resolve_destination_type, Converter,
    ConverterRegistry, DestinationType, FieldDescriptor,
};
pub use error::{ConvertError, SheetError, SheetResult};
pub use types::{CellData, CellKind, CellValue, Row, TextRow};
