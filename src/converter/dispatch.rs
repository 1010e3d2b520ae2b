//! Conversion dispatch

use super::{
    resolve_destination_type, ConverterKey, ConverterRegistry, Converted, DestinationType,
    FieldDescriptor, TypeIdentity,
};
use crate::config::GlobalConfig;
use crate::error::ConvertError;
use crate::types::{CellValue, Row, TextRow};
use std::any::Any;
use tracing::trace;

/// Convert one cell into `destination`.
///
/// The field's converter wins over the registry; otherwise the routine is
/// looked up by `(destination type, cell kind)`. EMPTY cells are looked up
/// like any other kind. Container destinations get the routine result wrapped
/// back into `CellData<T>`.
pub fn convert(
    cell: &CellValue,
    destination: &DestinationType,
    field: Option<&FieldDescriptor>,
    registry: &ConverterRegistry,
    config: &GlobalConfig,
) -> Result<Converted, ConvertError> {
    let target = destination.target();

    let converter = match field.and_then(FieldDescriptor::converter) {
        Some(overridden) => {
            trace!(field = field.map(FieldDescriptor::name), "using field converter");
            overridden
        }
        None => registry
            .get(&ConverterKey::new(target, cell.kind()))
            .ok_or(ConvertError::ConverterNotFound {
                kind: cell.kind(),
                target: target.name(),
            })?,
    };

    let value = converter
        .convert(cell, field, config)
        .map_err(|source| ConvertError::ConversionFailed {
            cell: cell.clone(),
            target: target.name(),
            source,
        })?;

    match destination {
        DestinationType::Concrete(_) => Ok(value),
        DestinationType::Container(arg) => {
            (arg.wrap)(cell, value).map_err(|_| ConvertError::ConversionFailed {
                cell: cell.clone(),
                target: target.name(),
                source: format!("converter did not produce a {}", target.name()).into(),
            })
        }
    }
}

/// Resolve the field's destination type, then [`convert`].
pub fn convert_field(
    cell: &CellValue,
    field: Option<&FieldDescriptor>,
    registry: &ConverterRegistry,
    config: &GlobalConfig,
) -> Result<Converted, ConvertError> {
    let destination = resolve_destination_type(field);
    convert(cell, &destination, field, registry, config)
}

/// [`convert`] followed by a downcast to `T`.
///
/// For container destinations `T` is `CellData<inner>`.
pub fn convert_as<T: Any>(
    cell: &CellValue,
    destination: &DestinationType,
    field: Option<&FieldDescriptor>,
    registry: &ConverterRegistry,
    config: &GlobalConfig,
) -> Result<T, ConvertError> {
    let value = convert(cell, destination, field, registry, config)?;
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| ConvertError::ConversionFailed {
            cell: cell.clone(),
            target: TypeIdentity::of::<T>().name(),
            source: format!(
                "converted value is a {}, not a {}",
                destination.name(),
                TypeIdentity::of::<T>().name()
            )
            .into(),
        })
}

/// Project a row to text.
///
/// EMPTY cells become `None` without a lookup. Every other cell goes through
/// the `(String, kind)` routine. The first failure aborts the whole row.
pub fn convert_row_to_text(
    row: &Row,
    registry: &ConverterRegistry,
    config: &GlobalConfig,
) -> Result<TextRow, ConvertError> {
    let text = TypeIdentity::text();
    let mut out = TextRow::new();

    for (&column, cell) in row {
        if cell.is_empty() {
            out.insert(column, None);
            continue;
        }

        let converter = registry
            .lookup(text, cell.kind())
            .ok_or(ConvertError::ConverterNotFound {
                kind: cell.kind(),
                target: text.name(),
            })?;

        let value = converter
            .convert(cell, None, config)
            .map_err(|source| ConvertError::ConversionFailed {
                cell: cell.clone(),
                target: text.name(),
                source,
            })?;

        let value = value
            .downcast::<String>()
            .map_err(|_| ConvertError::ConversionFailed {
                cell: cell.clone(),
                target: text.name(),
                source: "converter did not produce text".into(),
            })?;

        out.insert(column, Some(*value));
    }

    Ok(out)
}
