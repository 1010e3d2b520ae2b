//! Converter resolution and dispatch
//!
//! Turns tagged cell values into typed Rust values:
//! - [`resolve_destination_type`] decides the target type from field metadata
//! - [`ConverterRegistry`] maps `(target type, cell kind)` to a routine
//! - [`convert`] picks the field override or the registry routine and runs it
//! - [`convert_row_to_text`] projects a whole row to text, fail-fast
//!
//! # Example
//!
//! ```
//! use royalbit_sheetbind::config::GlobalConfig;
//! use royalbit_sheetbind::converter::{convert_as, ConverterRegistry, DestinationType};
//! use royalbit_sheetbind::types::CellValue;
//!
//! let registry = ConverterRegistry::with_defaults();
//! let config = GlobalConfig::default();
//! let qty: i64 = convert_as(
//!     &CellValue::Number(12.0),
//!     &DestinationType::of::<i64>(),
//!     None,
//!     &registry,
//!     &config,
//! )?;
//! assert_eq!(qty, 12);
//! # Ok::<(), royalbit_sheetbind::ConvertError>(())
//! ```

mod builtin;
mod dates;
mod destination;
mod dispatch;
mod registry;

pub use builtin::register_defaults;
pub use dates::{format_datetime, is_valid_date_pattern, serial_to_datetime};
pub use destination::{
    resolve_destination_type, ContainerArg, DestinationType, FieldDescriptor, FieldType,
    TypeIdentity,
};
pub use dispatch::{convert, convert_as, convert_field, convert_row_to_text};
pub use registry::{ConverterKey, ConverterRegistry, RegistryBuilder};

use crate::config::GlobalConfig;
use crate::error::RoutineError;
use crate::types::CellValue;
use std::any::Any;
use std::marker::PhantomData;

/// Type-erased result of a conversion routine.
pub type Converted = Box<dyn Any + Send + Sync>;

/// A conversion routine for one `(target type, cell kind)` pair.
///
/// Routines hold no per-call state: the cell, the field metadata and the
/// ambient config all arrive as arguments.
pub trait Converter: Send + Sync {
    fn convert(
        &self,
        cell: &CellValue,
        field: Option<&FieldDescriptor>,
        config: &GlobalConfig,
    ) -> Result<Converted, RoutineError>;
}

/// Adapts a typed closure into a [`Converter`].
pub struct FnConverter<T, F> {
    func: F,
    _target: PhantomData<fn() -> T>,
}

impl<T, F> FnConverter<T, F>
where
    T: Any + Send + Sync,
    F: Fn(&CellValue, Option<&FieldDescriptor>, &GlobalConfig) -> Result<T, RoutineError>
        + Send
        + Sync,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            _target: PhantomData,
        }
    }
}

impl<T, F> Converter for FnConverter<T, F>
where
    T: Any + Send + Sync,
    F: Fn(&CellValue, Option<&FieldDescriptor>, &GlobalConfig) -> Result<T, RoutineError>
        + Send
        + Sync,
{
    fn convert(
        &self,
        cell: &CellValue,
        field: Option<&FieldDescriptor>,
        config: &GlobalConfig,
    ) -> Result<Converted, RoutineError> {
        let value = (self.func)(cell, field, config)?;
        Ok(Box::new(value))
    }
}
