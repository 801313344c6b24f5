//! The reflectable-class contract
//!
//! [`Reflect`] is the static side: a class names itself and declares its
//! surface once through a [`Registrar`]. [`Introspectable`] is the dynamic,
//! object-safe side: by-name get/set/call/enumerate on a live instance,
//! built on the class descriptor. Every `Reflect` type is `Introspectable`
//! against [`Registry::global`].

use std::any::Any;
use std::sync::Arc;

use crate::descriptor::{Instance, TypeDescriptor};
use crate::error::ReflectResult;
use crate::names::Describe;
use crate::registrar::Registrar;
use crate::registry::Registry;
use crate::value::Value;

/// A class that can describe itself to a registry.
///
/// # Example
///
/// ```ignore
/// impl Reflect for Point {
///     const CLASS_NAME: &'static str = "Point";
///
///     fn register(reg: &mut Registrar<Self>) {
///         reg.member("x", |p| &p.x, |p| &mut p.x)
///             .member("y", |p| &p.y, |p| &mut p.y)
///             .method("magnitude", Point::magnitude)
///             .constructor(Point::new);
///     }
/// }
/// ```
pub trait Reflect: Describe + Send + Sized {
    /// Display name of the class
    const CLASS_NAME: &'static str;

    /// Declare members, methods and constructors. Runs once per registry.
    fn register(reg: &mut Registrar<'_, Self>);
}

/// By-name access to a live instance
pub trait Introspectable: Any + Send {
    /// Descriptor of this instance's class
    fn type_descriptor(&self) -> ReflectResult<Arc<TypeDescriptor>>;

    /// Display name of this instance's class
    fn class_name(&self) -> &'static str;

    /// Upcast for descriptor accessors
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for descriptor accessors
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Read a member by name
    fn get_member_value(&self, name: &str) -> ReflectResult<Value> {
        self.type_descriptor()?.get(self.as_any(), name)
    }

    /// Write a member by name
    fn set_member_value(&mut self, name: &str, value: Value) -> ReflectResult<()> {
        let descriptor = self.type_descriptor()?;
        descriptor.set(self.as_any_mut(), name, value)
    }

    /// Call any method by name
    fn call_method(&mut self, name: &str, args: &[Value]) -> ReflectResult<Value> {
        let descriptor = self.type_descriptor()?;
        descriptor.invoke(Instance::Exclusive(self.as_any_mut()), name, args)
    }

    /// Call a non-mutating method by name
    fn call_const_method(&self, name: &str, args: &[Value]) -> ReflectResult<Value> {
        self.type_descriptor()?
            .invoke(Instance::Shared(self.as_any()), name, args)
    }

    /// Member names in registration order
    fn member_names(&self) -> Vec<String> {
        self.type_descriptor()
            .map(|d| d.member_names())
            .unwrap_or_default()
    }

    /// Method names in registration order
    fn method_names(&self) -> Vec<String> {
        self.type_descriptor()
            .map(|d| d.method_names())
            .unwrap_or_default()
    }

    /// Check if a member exists
    fn has_member(&self, name: &str) -> bool {
        self.type_descriptor().is_ok_and(|d| d.has_member(name))
    }

    /// Check if a method exists
    fn has_method(&self, name: &str) -> bool {
        self.type_descriptor().is_ok_and(|d| d.has_method(name))
    }

    /// Pretty-printed JSON with class name, member values and method signatures
    fn to_json(&self) -> ReflectResult<String> {
        self.type_descriptor()?.to_json(self.as_any())
    }

    /// Human-readable class summary
    fn describe(&self) -> ReflectResult<String> {
        Ok(self.type_descriptor()?.describe())
    }

    /// `name (type): value` for one member
    fn format_member(&self, name: &str) -> ReflectResult<String> {
        self.type_descriptor()?.format_member(self.as_any(), name)
    }
}

impl<T: Reflect> Introspectable for T {
    fn type_descriptor(&self) -> ReflectResult<Arc<TypeDescriptor>> {
        Registry::global().class::<T>()
    }

    fn class_name(&self) -> &'static str {
        T::CLASS_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
