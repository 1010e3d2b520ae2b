//! Spreadsheet input
//!
//! Produces tagged cell values from workbook files via calamine. Row
//! traversal stays here; conversion lives in [`crate::converter`].

mod reader;

pub use reader::{range_to_rows, SheetReader};
