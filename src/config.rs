//! Read session configuration
//!
//! `GlobalConfig` is the ambient configuration handed to every conversion
//! routine. `ReadConfig` adds what a read session needs around it: which
//! sheet, how many header rows and which columns bind to which types.
//!
//! ```yaml
//! date_format: "%d/%m/%Y"
//! sheet: Orders
//! columns:
//!   - index: 0
//!     name: sku
//!     type: text
//!   - index: 2
//!     name: quantity
//!     type: integer
//!   - index: 3
//!     name: shipped
//!     type: cell<datetime>
//! ```

use crate::converter::{is_valid_date_pattern, FieldDescriptor, FieldType, TypeIdentity};
use crate::error::{SheetError, SheetResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Settings shared by every routine during a read. Never mutated by dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Locale tag; not read by the built-in routines, handed through to custom ones
    pub locale: String,
    /// chrono format used for date text when the field has no format of its own
    pub date_format: String,
    /// Workbook dates count from 1904-01-01 instead of 1900-01-01
    pub use_1904_windowing: bool,
    /// Trim surrounding whitespace from string cells
    pub auto_trim: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
            use_1904_windowing: false,
            auto_trim: true,
        }
    }
}

/// Column binding: which cell index feeds which field type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub index: usize,
    pub name: String,
    #[serde(rename = "type", default = "default_type_name")]
    pub type_name: String,
    #[serde(default)]
    pub format: Option<String>,
}

fn default_type_name() -> String {
    "text".to_string()
}

impl ColumnSpec {
    /// Build the field descriptor for this column.
    pub fn descriptor(&self) -> SheetResult<FieldDescriptor> {
        let field_type = parse_field_type(&self.type_name)?;
        let mut field = FieldDescriptor::with_type(self.name.clone(), field_type);
        if let Some(format) = &self.format {
            field = field.with_format(format.clone());
        }
        Ok(field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadConfig {
    #[serde(flatten)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

fn default_header_rows() -> usize {
    1
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            sheet: None,
            header_rows: default_header_rows(),
            columns: Vec::new(),
        }
    }
}

impl ReadConfig {
    /// Field descriptors for all configured columns, in config order.
    pub fn descriptors(&self) -> SheetResult<Vec<(usize, FieldDescriptor)>> {
        self.columns
            .iter()
            .map(|col| Ok((col.index, col.descriptor()?)))
            .collect()
    }
}

/// Parse a read config from YAML text.
pub fn parse_config(content: &str) -> SheetResult<ReadConfig> {
    let config: ReadConfig = serde_yaml::from_str(content)?;

    if !is_valid_date_pattern(&config.global.date_format) {
        return Err(SheetError::Config(format!(
            "Invalid date_format '{}'",
            config.global.date_format
        )));
    }

    let mut indices = HashSet::new();
    let mut names = HashSet::new();
    for col in &config.columns {
        if !indices.insert(col.index) {
            return Err(SheetError::Config(format!(
                "Column index {} is bound more than once",
                col.index
            )));
        }
        if !names.insert(col.name.as_str()) {
            return Err(SheetError::Config(format!(
                "Column name '{}' is used more than once",
                col.name
            )));
        }
        parse_field_type(&col.type_name)?;
    }

    Ok(config)
}

/// Load a read config from a YAML file.
pub fn load_config(path: &Path) -> SheetResult<ReadConfig> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Map a type name (`integer`, `cell<number>`, `cell`, ...) to a field type.
pub fn parse_field_type(name: &str) -> SheetResult<FieldType> {
    let name = name.trim();

    if name == "cell" {
        return Ok(FieldType::Container(None));
    }

    if let Some(inner) = name
        .strip_prefix("cell<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        let arg = match inner.trim() {
            "text" => FieldType::container_arg::<String>(),
            "number" => FieldType::container_arg::<f64>(),
            "integer" => FieldType::container_arg::<i64>(),
            "boolean" => FieldType::container_arg::<bool>(),
            "datetime" => FieldType::container_arg::<NaiveDateTime>(),
            other => {
                return Err(SheetError::Config(format!(
                    "Unknown container argument '{}' in '{}'",
                    other, name
                )))
            }
        };
        return Ok(FieldType::Container(Some(arg)));
    }

    let plain = match name {
        "text" => TypeIdentity::of::<String>(),
        "number" => TypeIdentity::of::<f64>(),
        "integer" => TypeIdentity::of::<i64>(),
        "boolean" => TypeIdentity::of::<bool>(),
        "datetime" => TypeIdentity::of::<NaiveDateTime>(),
        other => {
            return Err(SheetError::Config(format!(
                "Unknown column type '{}' (expected text, number, integer, boolean, datetime or cell<...>)",
                other
            )))
        }
    };
    Ok(FieldType::Plain(plain))
}
