//! Enum registry
//!
//! Enums are described as ordered `name <-> i64` tables. Lookups in both
//! directions fail with `EnumValueNotFound`; a numeric value registered
//! under several names maps back to the first one still registered.
//! Values registered through a variant also remember it, so a number or a
//! name can be turned back into the Rust enum.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{ReflectError, ReflectResult};
use crate::options::DuplicatePolicy;
use crate::registry::Registry;

/// Runtime description of one enum
#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    name: String,
    type_id: TypeId,
    values: Vec<(String, i64)>,
    by_name: FxHashMap<String, i64>,
    by_value: FxHashMap<i64, String>,
    variants: FxHashMap<i64, Variant>,
}

#[derive(Clone)]
struct Variant(Arc<dyn Any + Send + Sync>);

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Variant")
    }
}

impl EnumDescriptor {
    fn new(name: String, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            values: Vec::new(),
            by_name: FxHashMap::default(),
            by_value: FxHashMap::default(),
            variants: FxHashMap::default(),
        }
    }

    /// Enum display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity of the described Rust type
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// `(name, value)` pairs in registration order
    pub fn values(&self) -> &[(String, i64)] {
        &self.values
    }

    /// Value names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.values.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Numeric value of a name
    pub fn value_of(&self, name: &str) -> ReflectResult<i64> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| ReflectError::EnumValueNotFound {
                enum_name: self.name.clone(),
                value: name.to_string(),
            })
    }

    /// Name of a numeric value
    pub fn name_of(&self, value: i64) -> ReflectResult<&str> {
        self.by_value
            .get(&value)
            .map(String::as_str)
            .ok_or_else(|| ReflectError::EnumValueNotFound {
                enum_name: self.name.clone(),
                value: value.to_string(),
            })
    }

    /// Rust variant registered for a numeric value.
    ///
    /// Fails with `CastMismatch` when `E` is not the described enum and with
    /// `EnumValueNotFound` when the value was registered without a variant.
    pub fn variant<E: Any + Copy>(&self, value: i64) -> ReflectResult<E> {
        if TypeId::of::<E>() != self.type_id {
            return Err(ReflectError::CastMismatch {
                expected: self.name.clone(),
                found: std::any::type_name::<E>().to_string(),
            });
        }
        self.variants
            .get(&value)
            .and_then(|variant| variant.0.downcast_ref::<E>())
            .copied()
            .ok_or_else(|| ReflectError::EnumValueNotFound {
                enum_name: self.name.clone(),
                value: value.to_string(),
            })
    }

    /// Rust variant registered under a name
    pub fn variant_named<E: Any + Copy>(&self, name: &str) -> ReflectResult<E> {
        self.variant(self.value_of(name)?)
    }

    /// Check if a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of registered values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no values are registered
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn insert(&mut self, name: &str, value: i64) {
        if let Some(old) = self.by_name.insert(name.to_string(), value) {
            self.values.retain(|(n, _)| n != name);
            if old != value && self.by_value.get(&old).map(String::as_str) == Some(name) {
                // Hand the old value to its next alias, if any
                match self.values.iter().find(|(_, v)| *v == old) {
                    Some((alias, _)) => {
                        self.by_value.insert(old, alias.clone());
                    }
                    None => {
                        self.by_value.remove(&old);
                        self.variants.remove(&old);
                    }
                }
            }
        }
        self.values.push((name.to_string(), value));
        self.by_value.entry(value).or_insert_with(|| name.to_string());
    }

    fn insert_variant<E: Any + Send + Sync>(&mut self, name: &str, value: i64, variant: E) {
        self.insert(name, value);
        self.variants
            .entry(value)
            .or_insert_with(|| Variant(Arc::new(variant)));
    }
}

/// Fluent builder for an enum descriptor; call [`build`](Self::build) to
/// publish it in the registry.
pub struct EnumRegistrar<'r, E> {
    registry: &'r Registry,
    descriptor: EnumDescriptor,
    error: Option<ReflectError>,
    _enum: PhantomData<fn() -> E>,
}

impl<'r, E: Copy + Into<i64> + Send + Sync + 'static> EnumRegistrar<'r, E> {
    pub(crate) fn new(registry: &'r Registry, name: &str) -> Self {
        Self {
            registry,
            descriptor: EnumDescriptor::new(name.to_string(), TypeId::of::<E>()),
            error: None,
            _enum: PhantomData,
        }
    }

    /// Register a variant under a name
    pub fn value(mut self, name: &str, variant: E) -> Self {
        let value = variant.into();
        if self.admit(name) {
            self.descriptor.insert_variant(name, value, variant);
        }
        self
    }

    /// Register a raw numeric value under a name. The value has no Rust
    /// variant, so it cannot be converted back into `E`.
    pub fn raw_value(mut self, name: &str, value: i64) -> Self {
        if self.admit(name) {
            self.descriptor.insert(name, value);
        }
        self
    }

    fn admit(&mut self, name: &str) -> bool {
        if self.descriptor.contains(name) {
            match self.registry.options().duplicates {
                DuplicatePolicy::Replace => {
                    log::warn!(
                        "enum value '{}' registered twice in '{}', later registration wins",
                        name,
                        self.descriptor.name
                    );
                }
                DuplicatePolicy::Reject => {
                    if self.error.is_none() {
                        self.error = Some(ReflectError::Duplicate {
                            owner: self.descriptor.name.clone(),
                            what: "enum value",
                            name: name.to_string(),
                        });
                    }
                    return false;
                }
            }
        }
        true
    }

    /// Publish the descriptor and register the enum's type name
    pub fn build(self) -> ReflectResult<Arc<EnumDescriptor>> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.registry.insert_enum::<E>(self.descriptor)
    }
}
