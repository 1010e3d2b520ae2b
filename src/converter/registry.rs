//! Converter registry
//!
//! Built once through [`RegistryBuilder`], then read-only. Lookups need no
//! locking, so one registry can be shared by `Arc` across reader threads.

use super::{builtin, Converter, TypeIdentity};
use crate::types::CellKind;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Registry lookup key: destination type plus source cell kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConverterKey {
    pub target: TypeIdentity,
    pub kind: CellKind,
}

impl ConverterKey {
    pub fn new(target: TypeIdentity, kind: CellKind) -> Self {
        Self { target, kind }
    }

    pub fn of<T: Any>(kind: CellKind) -> Self {
        Self::new(TypeIdentity::of::<T>(), kind)
    }
}

impl fmt::Display for ConverterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {}", self.target, self.kind)
    }
}

/// Read-only table of conversion routines.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<ConverterKey, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry holding the built-in routines only.
    pub fn with_defaults() -> Self {
        let mut builder = Self::builder();
        builtin::register_defaults(&mut builder);
        builder.build()
    }

    pub fn get(&self, key: &ConverterKey) -> Option<&Arc<dyn Converter>> {
        self.converters.get(key)
    }

    pub fn lookup(&self, target: TypeIdentity, kind: CellKind) -> Option<&Arc<dyn Converter>> {
        self.get(&ConverterKey::new(target, kind))
    }

    /// Registered keys, sorted by type name then kind.
    pub fn keys(&self) -> Vec<ConverterKey> {
        let mut keys: Vec<ConverterKey> = self.converters.keys().copied().collect();
        keys.sort_by(|a, b| {
            a.target
                .name()
                .cmp(b.target.name())
                .then(a.kind.cmp(&b.kind))
        });
        keys
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

/// Populates a [`ConverterRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    converters: HashMap<ConverterKey, Arc<dyn Converter>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the built-in routines.
    pub fn with_defaults() -> Self {
        let mut builder = Self::new();
        builtin::register_defaults(&mut builder);
        builder
    }

    /// Register `converter` for target `T` and source `kind`. Replaces any earlier routine for that key.
    pub fn register<T: Any>(
        &mut self,
        kind: CellKind,
        converter: impl Converter + 'static,
    ) -> &mut Self {
        self.register_key(ConverterKey::of::<T>(kind), Arc::new(converter))
    }

    pub fn register_key(&mut self, key: ConverterKey, converter: Arc<dyn Converter>) -> &mut Self {
        if self.converters.insert(key, converter).is_some() {
            debug!(%key, "replaced converter");
        } else {
            trace!(%key, "registered converter");
        }
        self
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    pub fn build(self) -> ConverterRegistry {
        debug!(count = self.converters.len(), "converter registry built");
        ConverterRegistry {
            converters: self.converters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobalConfig;
    use crate::converter::FnConverter;
    use crate::error::RoutineError;
    use crate::types::CellValue;

    fn constant(text: &'static str) -> impl Converter {
        FnConverter::new(move |_: &CellValue, _, _: &GlobalConfig| -> Result<String, RoutineError> {
            Ok(text.to_string())
        })
    }

    #[test]
    fn test_key_equality_is_structural() {
        assert_eq!(
            ConverterKey::of::<i64>(CellKind::Number),
            ConverterKey::new(TypeIdentity::of::<i64>(), CellKind::Number)
        );
        assert_ne!(
            ConverterKey::of::<i64>(CellKind::Number),
            ConverterKey::of::<i64>(CellKind::String)
        );
        assert_ne!(
            ConverterKey::of::<i64>(CellKind::Number),
            ConverterKey::of::<f64>(CellKind::Number)
        );
    }

    #[test]
    fn test_lookup_hits_and_misses() {
        let mut builder = RegistryBuilder::new();
        builder.register::<String>(CellKind::Number, constant("n"));
        let registry = builder.build();

        assert_eq!(registry.len(), 1);
        assert!(registry
            .lookup(TypeIdentity::text(), CellKind::Number)
            .is_some());
        assert!(registry
            .lookup(TypeIdentity::text(), CellKind::Boolean)
            .is_none());
        assert!(registry
            .lookup(TypeIdentity::of::<f64>(), CellKind::Number)
            .is_none());
    }

    #[test]
    fn test_register_same_key_keeps_one_routine() {
        let mut builder = RegistryBuilder::new();
        builder
            .register::<String>(CellKind::String, constant("first"))
            .register::<String>(CellKind::String, constant("second"));
        let registry = builder.build();
        assert_eq!(registry.len(), 1);

        let routine = registry
            .get(&ConverterKey::of::<String>(CellKind::String))
            .unwrap();
        let out = routine
            .convert(&CellValue::String("x".into()), None, &GlobalConfig::default())
            .unwrap();
        assert_eq!(*out.downcast::<String>().unwrap(), "second");
    }

    #[test]
    fn test_defaults_cover_text_for_every_non_empty_kind() {
        let registry = ConverterRegistry::with_defaults();
        for kind in CellKind::ALL {
            let found = registry.lookup(TypeIdentity::text(), kind).is_some();
            assert_eq!(found, kind != CellKind::Empty, "text <- {}", kind);
        }
    }

    #[test]
    fn test_keys_are_sorted() {
        let registry = ConverterRegistry::with_defaults();
        let keys = registry.keys();
        assert_eq!(keys.len(), registry.len());
        assert!(keys
            .windows(2)
            .all(|w| (w[0].target.name(), w[0].kind) <= (w[1].target.name(), w[1].kind)));
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConverterRegistry>();
    }
}
