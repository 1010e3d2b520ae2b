//! Destination types and field metadata

use super::{Converted, Converter};
use crate::types::{CellData, CellValue};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a Rust type, used as half of a registry key.
#[derive(Clone, Copy)]
pub struct TypeIdentity {
    id: TypeId,
    name: &'static str,
}

impl TypeIdentity {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
        }
    }

    /// The textual type, `String`.
    pub fn text() -> Self {
        Self::of::<String>()
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// `alloc::string::String` -> `String`; generic names are kept whole.
fn short_type_name(full: &'static str) -> &'static str {
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}

impl PartialEq for TypeIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeIdentity {}

impl Hash for TypeIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Rebuilds `CellData<T>` around a routine result. Hands the value back on type mismatch.
pub(crate) type WrapFn = fn(&CellValue, Converted) -> Result<Converted, Converted>;

fn wrap_cell_data<T: Any + Send + Sync>(
    cell: &CellValue,
    value: Converted,
) -> Result<Converted, Converted> {
    let data = value.downcast::<T>()?;
    Ok(Box::new(CellData::new(cell.clone(), *data)))
}

/// Type argument of a `CellData<T>` field, captured when the field is declared.
#[derive(Clone, Copy)]
pub struct ContainerArg {
    pub(crate) inner: TypeIdentity,
    pub(crate) wrap: WrapFn,
}

impl ContainerArg {
    pub fn of<T: Any + Send + Sync>() -> Self {
        Self {
            inner: TypeIdentity::of::<T>(),
            wrap: wrap_cell_data::<T>,
        }
    }

    pub fn inner(&self) -> TypeIdentity {
        self.inner
    }
}

impl fmt::Debug for ContainerArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellData<{}>", self.inner)
    }
}

/// What a value must become: a plain type, or `CellData<T>` around an inner type.
#[derive(Clone, Copy)]
pub enum DestinationType {
    Concrete(TypeIdentity),
    Container(ContainerArg),
}

impl DestinationType {
    pub fn of<T: Any>() -> Self {
        DestinationType::Concrete(TypeIdentity::of::<T>())
    }

    pub fn container_of<T: Any + Send + Sync>() -> Self {
        DestinationType::Container(ContainerArg::of::<T>())
    }

    pub fn text() -> Self {
        Self::of::<String>()
    }

    /// Type the routine must produce (the inner type for containers).
    pub fn target(&self) -> TypeIdentity {
        match self {
            DestinationType::Concrete(ty) => *ty,
            DestinationType::Container(arg) => arg.inner,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, DestinationType::Container(_))
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.target().name()
    }
}

impl PartialEq for DestinationType {
    fn eq(&self, other: &Self) -> bool {
        self.is_container() == other.is_container() && self.target() == other.target()
    }
}

impl Eq for DestinationType {}

impl fmt::Debug for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationType::Concrete(ty) => write!(f, "{}", ty),
            DestinationType::Container(arg) => write!(f, "{:?}", arg),
        }
    }
}

/// Declared type of a destination field.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    Plain(TypeIdentity),
    /// `CellData<T>`; `None` when the argument was left off
    Container(Option<ContainerArg>),
}

impl FieldType {
    pub fn plain<T: Any>() -> Self {
        FieldType::Plain(TypeIdentity::of::<T>())
    }

    pub fn container_arg<T: Any + Send + Sync>() -> ContainerArg {
        ContainerArg::of::<T>()
    }
}

/// Metadata for one destination field.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
    format: Option<String>,
    converter: Option<Arc<dyn Converter>>,
}

impl FieldDescriptor {
    /// Field declared as plain `T`.
    pub fn new<T: Any>(name: impl Into<String>) -> Self {
        Self::with_type(name, FieldType::plain::<T>())
    }

    /// Field declared as `CellData<T>`.
    pub fn cell_data<T: Any + Send + Sync>(name: impl Into<String>) -> Self {
        Self::with_type(name, FieldType::Container(Some(ContainerArg::of::<T>())))
    }

    /// Field declared as `CellData` without a type argument.
    pub fn raw_cell_data(name: impl Into<String>) -> Self {
        Self::with_type(name, FieldType::Container(None))
    }

    pub fn with_type(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            format: None,
            converter: None,
        }
    }

    /// Per-field date/number pattern passed through to routines.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Attach a converter that takes precedence over the registry for this field.
    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn converter(&self) -> Option<&Arc<dyn Converter>> {
        self.converter.as_ref()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("format", &self.format)
            .field("converter", &self.converter.is_some())
            .finish()
    }
}

/// Decide the destination type for a field.
///
/// No field means text. A `CellData` field converts into its type argument,
/// or into text when the argument is missing.
pub fn resolve_destination_type(field: Option<&FieldDescriptor>) -> DestinationType {
    let Some(field) = field else {
        return DestinationType::text();
    };

    match field.field_type {
        FieldType::Plain(ty) => DestinationType::Concrete(ty),
        FieldType::Container(Some(arg)) => DestinationType::Container(arg),
        FieldType::Container(None) => DestinationType::container_of::<String>(),
    }
}
