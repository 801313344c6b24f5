//! Object wrappers
//!
//! [`Object`] pairs a class descriptor with an instance it either owns
//! (fresh from a constructor) or borrows from the caller. The borrowed form
//! carries the referent's lifetime, so a wrapper can never outlive the
//! object it points into.
//!
//! [`Handle`] is the shareable pointer-like value: `Handle<Point>` resolves
//! to the type name `Point*`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::descriptor::{Instance, TypeDescriptor};
use crate::error::{ReflectError, ReflectResult};
use crate::introspect::Reflect;
use crate::names::{Describe, TypeNames};
use crate::registry::Registry;
use crate::value::Value;

enum Slot<'a> {
    Owned(Box<dyn Any + Send>),
    Borrowed(&'a mut (dyn Any + Send)),
}

/// A live instance together with its class descriptor
pub struct Object<'a> {
    descriptor: Arc<TypeDescriptor>,
    slot: Slot<'a>,
}

impl Object<'static> {
    /// Construct an instance through the descriptor's constructor selection
    pub fn construct(descriptor: Arc<TypeDescriptor>, args: &[Value]) -> ReflectResult<Self> {
        let instance = descriptor.construct(args)?;
        Ok(Self {
            descriptor,
            slot: Slot::Owned(instance),
        })
    }

    /// Take ownership of an already boxed instance
    pub fn from_boxed(
        descriptor: Arc<TypeDescriptor>,
        instance: Box<dyn Any + Send>,
    ) -> ReflectResult<Self> {
        if !descriptor.describes(&*instance) {
            return Err(ReflectError::InstanceMismatch {
                expected: descriptor.class_name().to_string(),
            });
        }
        Ok(Self {
            descriptor,
            slot: Slot::Owned(instance),
        })
    }

    /// Take ownership of a value of a reflectable class
    pub fn new<C: Reflect>(registry: &Registry, value: C) -> ReflectResult<Self> {
        Ok(Self {
            descriptor: registry.class::<C>()?,
            slot: Slot::Owned(Box::new(value)),
        })
    }
}

impl<'a> Object<'a> {
    /// Borrow a value of a reflectable class without taking ownership
    pub fn borrowed<C: Reflect>(registry: &Registry, value: &'a mut C) -> ReflectResult<Self> {
        Ok(Self {
            descriptor: registry.class::<C>()?,
            slot: Slot::Borrowed(value),
        })
    }

    /// Borrow an erased instance described by `descriptor`
    pub fn borrowed_with(
        descriptor: Arc<TypeDescriptor>,
        instance: &'a mut (dyn Any + Send),
    ) -> ReflectResult<Self> {
        if !descriptor.describes(&*instance) {
            return Err(ReflectError::InstanceMismatch {
                expected: descriptor.class_name().to_string(),
            });
        }
        Ok(Self {
            descriptor,
            slot: Slot::Borrowed(instance),
        })
    }

    fn instance(&self) -> &dyn Any {
        match &self.slot {
            Slot::Owned(b) => &**b,
            Slot::Borrowed(r) => &**r,
        }
    }

    fn instance_mut(&mut self) -> &mut dyn Any {
        match &mut self.slot {
            Slot::Owned(b) => &mut **b,
            Slot::Borrowed(r) => &mut **r,
        }
    }

    /// Class descriptor
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// Class display name
    pub fn class_name(&self) -> &str {
        self.descriptor.class_name()
    }

    /// Check if this wrapper owns its instance
    pub fn is_owned(&self) -> bool {
        matches!(self.slot, Slot::Owned(_))
    }

    /// Read a member by name
    pub fn get(&self, name: &str) -> ReflectResult<Value> {
        self.descriptor.get(self.instance(), name)
    }

    /// Write a member by name
    pub fn set(&mut self, name: &str, value: Value) -> ReflectResult<()> {
        let descriptor = self.descriptor.clone();
        descriptor.set(self.instance_mut(), name, value)
    }

    /// Call any method by name
    pub fn call(&mut self, name: &str, args: &[Value]) -> ReflectResult<Value> {
        let descriptor = self.descriptor.clone();
        descriptor.invoke(Instance::Exclusive(self.instance_mut()), name, args)
    }

    /// Call a non-mutating method by name
    pub fn call_const(&self, name: &str, args: &[Value]) -> ReflectResult<Value> {
        self.descriptor
            .invoke(Instance::Shared(self.instance()), name, args)
    }

    /// Member names in registration order
    pub fn member_names(&self) -> Vec<String> {
        self.descriptor.member_names()
    }

    /// Method names in registration order
    pub fn method_names(&self) -> Vec<String> {
        self.descriptor.method_names()
    }

    /// Check if a member exists
    pub fn has_member(&self, name: &str) -> bool {
        self.descriptor.has_member(name)
    }

    /// Check if a method exists
    pub fn has_method(&self, name: &str) -> bool {
        self.descriptor.has_method(name)
    }

    /// Pretty-printed JSON of the instance
    pub fn to_json(&self) -> ReflectResult<String> {
        self.descriptor.to_json(self.instance())
    }

    /// `name (type): value` for one member
    pub fn format_member(&self, name: &str) -> ReflectResult<String> {
        self.descriptor.format_member(self.instance(), name)
    }

    /// Borrow the instance as a `C`
    pub fn downcast_ref<C: Any>(&self) -> Option<&C> {
        self.instance().downcast_ref::<C>()
    }

    /// Mutably borrow the instance as a `C`
    pub fn downcast_mut<C: Any>(&mut self) -> Option<&mut C> {
        self.instance_mut().downcast_mut::<C>()
    }

    /// Unwrap an owned instance; borrowed or mismatched wrappers come back as `Err`
    pub fn into_inner<C: Any>(self) -> Result<C, Self> {
        match self.slot {
            Slot::Owned(b) => match b.downcast::<C>() {
                Ok(c) => Ok(*c),
                Err(b) => Err(Self {
                    descriptor: self.descriptor,
                    slot: Slot::Owned(b),
                }),
            },
            slot @ Slot::Borrowed(_) => Err(Self {
                descriptor: self.descriptor,
                slot,
            }),
        }
    }
}

impl fmt::Debug for Object<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class_name())
            .field("owned", &self.is_owned())
            .finish()
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Shared, lockable pointer to a value; resolves to the type name `T*`
pub struct Handle<T>(Arc<RwLock<T>>);

impl<T> Handle<T> {
    /// Create a handle owning `value`
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Lock for reading
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    /// Lock for writing
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }

    /// Check if two handles point to the same value
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of handles sharing the value
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle<{}>", std::any::type_name::<T>())
    }
}

impl<T: Describe> Describe for Handle<T> {
    fn structural_name(names: &TypeNames) -> Option<String> {
        Some(format!("{}*", names.resolve::<T>()))
    }
}
