//! Type descriptors
//!
//! The runtime model of one class's reflectable surface. A [`TypeDescriptor`]
//! is built once by a [`Registrar`](crate::Registrar) and is immutable
//! afterwards; every accessor it holds is a type-erased closure that
//! downcasts the instance back to the concrete class before touching it.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::{ReflectError, ReflectResult};
use crate::options::ConstructorFallback;
use crate::value::Value;

pub(crate) type Getter = Arc<dyn Fn(&dyn Any) -> ReflectResult<Value> + Send + Sync>;
pub(crate) type Setter = Arc<dyn Fn(&mut dyn Any, Value) -> ReflectResult<()> + Send + Sync>;
pub(crate) type Invoker = Arc<dyn Fn(Instance<'_>, &[Value]) -> ReflectResult<Value> + Send + Sync>;
pub(crate) type Factory =
    Arc<dyn Fn(&[Value]) -> ReflectResult<Box<dyn Any + Send>> + Send + Sync>;

// ============================================================================
// Instance
// ============================================================================

/// Type-erased receiver of a method call
pub enum Instance<'a> {
    /// Shared access; only non-mutating methods can run
    Shared(&'a dyn Any),
    /// Exclusive access; every method can run
    Exclusive(&'a mut dyn Any),
}

impl<'a> Instance<'a> {
    /// Borrow the receiver as a `C`
    pub fn downcast_ref<C: Any>(&self) -> Option<&C> {
        match self {
            Instance::Shared(r) => (**r).downcast_ref::<C>(),
            Instance::Exclusive(r) => (**r).downcast_ref::<C>(),
        }
    }

    /// Mutably borrow the receiver as a `C`; `None` for shared receivers
    pub fn downcast_mut<C: Any>(&mut self) -> Option<&mut C> {
        match self {
            Instance::Shared(_) => None,
            Instance::Exclusive(r) => (**r).downcast_mut::<C>(),
        }
    }

    /// Check if the receiver allows mutation
    pub fn is_exclusive(&self) -> bool {
        matches!(self, Instance::Exclusive(_))
    }

    /// Reborrow with a shorter lifetime
    pub fn reborrow(&mut self) -> Instance<'_> {
        match self {
            Instance::Shared(r) => Instance::Shared(*r),
            Instance::Exclusive(r) => Instance::Exclusive(&mut **r),
        }
    }
}

// ============================================================================
// Members
// ============================================================================

/// How a member is backed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    /// A struct field, read and written in place
    Field,
    /// An explicit getter (and optional setter) pair
    Property,
}

/// One reflectable member of a class
#[derive(Clone)]
pub struct MemberDescriptor {
    pub(crate) owner: String,
    pub(crate) name: String,
    pub(crate) type_name: String,
    pub(crate) kind: MemberKind,
    pub(crate) getter: Getter,
    pub(crate) setter: Option<Setter>,
}

impl MemberDescriptor {
    /// Member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved type name, fixed at registration
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Field or property
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Check if the member has no setter
    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }

    /// Read the member from an instance
    pub fn get(&self, instance: &dyn Any) -> ReflectResult<Value> {
        (self.getter)(instance)
    }

    /// Write the member on an instance
    pub fn set(&self, instance: &mut dyn Any, value: Value) -> ReflectResult<()> {
        match &self.setter {
            Some(setter) => setter(instance, value),
            None => Err(ReflectError::ReadOnly {
                class: self.owner.clone(),
                name: self.name.clone(),
            }),
        }
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

// ============================================================================
// Methods
// ============================================================================

/// Receiver a method needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverKind {
    /// `&self`
    Shared,
    /// `&mut self`
    Exclusive,
}

/// One reflectable method of a class
#[derive(Clone)]
pub struct MethodDescriptor {
    pub(crate) owner: String,
    pub(crate) name: String,
    pub(crate) return_type: String,
    pub(crate) parameter_types: Vec<String>,
    pub(crate) receiver: ReceiverKind,
    pub(crate) invoker: Invoker,
}

impl MethodDescriptor {
    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved return type name (`void` for `()`)
    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    /// Resolved parameter type names, in order
    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }

    /// Receiver the method needs
    pub fn receiver(&self) -> ReceiverKind {
        self.receiver
    }

    /// Check if the method needs `&mut self`
    pub fn is_mutating(&self) -> bool {
        self.receiver == ReceiverKind::Exclusive
    }

    /// Invoke the method on an instance
    pub fn invoke(&self, instance: Instance<'_>, args: &[Value]) -> ReflectResult<Value> {
        if self.is_mutating() && !instance.is_exclusive() {
            return Err(ReflectError::ExclusiveReceiver {
                class: self.owner.clone(),
                name: self.name.clone(),
            });
        }
        (self.invoker)(instance, args)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .field("parameter_types", &self.parameter_types)
            .field("receiver", &self.receiver)
            .finish()
    }
}

// ============================================================================
// Constructors
// ============================================================================

/// One registered constructor of a class
#[derive(Clone)]
pub struct ConstructorDescriptor {
    pub(crate) parameter_types: Vec<String>,
    pub(crate) is_default: bool,
    pub(crate) factory: Factory,
}

impl ConstructorDescriptor {
    /// Resolved parameter type names, in order
    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }

    /// Check if this is the `Default` constructor
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Build a new instance; ownership passes to the caller
    pub fn construct(&self, args: &[Value]) -> ReflectResult<Box<dyn Any + Send>> {
        (self.factory)(args)
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("parameter_types", &self.parameter_types)
            .field("is_default", &self.is_default)
            .finish()
    }
}

// ============================================================================
// TypeDescriptor
// ============================================================================

/// Runtime model of one class: members, methods and constructors by name
pub struct TypeDescriptor {
    class_name: String,
    type_id: TypeId,
    members: FxHashMap<String, MemberDescriptor>,
    member_order: Vec<String>,
    methods: FxHashMap<String, MethodDescriptor>,
    method_order: Vec<String>,
    constructors: Vec<ConstructorDescriptor>,
    fallback: ConstructorFallback,
}

impl TypeDescriptor {
    pub(crate) fn new(class_name: String, type_id: TypeId, fallback: ConstructorFallback) -> Self {
        Self {
            class_name,
            type_id,
            members: FxHashMap::default(),
            member_order: Vec::new(),
            methods: FxHashMap::default(),
            method_order: Vec::new(),
            constructors: Vec::new(),
            fallback,
        }
    }

    /// Insert a member, returning the one it replaces
    pub(crate) fn insert_member(&mut self, member: MemberDescriptor) -> Option<MemberDescriptor> {
        let name = member.name.clone();
        let previous = self.members.insert(name.clone(), member);
        if previous.is_none() {
            self.member_order.push(name);
        }
        previous
    }

    /// Insert a method, returning the one it replaces
    pub(crate) fn insert_method(&mut self, method: MethodDescriptor) -> Option<MethodDescriptor> {
        let name = method.name.clone();
        let previous = self.methods.insert(name.clone(), method);
        if previous.is_none() {
            self.method_order.push(name);
        }
        previous
    }

    pub(crate) fn push_constructor(&mut self, constructor: ConstructorDescriptor) {
        self.constructors.push(constructor);
    }

    /// Class display name
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Identity of the described Rust type
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Check if `instance` is of the described class
    pub fn describes(&self, instance: &dyn Any) -> bool {
        instance.type_id() == self.type_id
    }

    /// Look up a member by name
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.get(name)
    }

    /// Look up a method by name
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.get(name)
    }

    /// Members in registration order
    pub fn members(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.member_order.iter().filter_map(|n| self.members.get(n))
    }

    /// Methods in registration order
    pub fn methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.method_order.iter().filter_map(|n| self.methods.get(n))
    }

    /// Constructors in registration order
    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    /// Member names in registration order
    pub fn member_names(&self) -> Vec<String> {
        self.member_order.clone()
    }

    /// Method names in registration order
    pub fn method_names(&self) -> Vec<String> {
        self.method_order.clone()
    }

    /// Check if a member exists
    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Check if a method exists
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Constructor selection policy when no arity matches
    pub fn constructor_fallback(&self) -> ConstructorFallback {
        self.fallback
    }

    fn member_or_err(&self, name: &str) -> ReflectResult<&MemberDescriptor> {
        self.members
            .get(name)
            .ok_or_else(|| ReflectError::MemberNotFound {
                class: self.class_name.clone(),
                name: name.to_string(),
            })
    }

    /// Read a member by name
    pub fn get(&self, instance: &dyn Any, name: &str) -> ReflectResult<Value> {
        self.member_or_err(name)?.get(instance)
    }

    /// Write a member by name
    pub fn set(&self, instance: &mut dyn Any, name: &str, value: Value) -> ReflectResult<()> {
        self.member_or_err(name)?.set(instance, value)
    }

    /// Invoke a method by name
    pub fn invoke(&self, instance: Instance<'_>, name: &str, args: &[Value]) -> ReflectResult<Value> {
        let method = self
            .methods
            .get(name)
            .ok_or_else(|| ReflectError::MethodNotFound {
                class: self.class_name.clone(),
                name: name.to_string(),
            })?;
        method.invoke(instance, args)
    }

    /// Select a constructor by argument count and build an instance.
    ///
    /// The first constructor in registration order whose arity equals
    /// `args.len()` wins. With no match the configured
    /// [`ConstructorFallback`] decides.
    pub fn construct(&self, args: &[Value]) -> ReflectResult<Box<dyn Any + Send>> {
        if let Some(ctor) = self.constructors.iter().find(|c| c.arity() == args.len()) {
            return ctor.construct(args);
        }

        let no_match = || ReflectError::NoMatchingConstructor {
            class: self.class_name.clone(),
            got: args.len(),
        };
        match self.fallback {
            ConstructorFallback::Strict => Err(no_match()),
            ConstructorFallback::DefaultConstruct => {
                let ctor = self
                    .constructors
                    .iter()
                    .find(|c| c.is_default)
                    .or_else(|| self.constructors.iter().find(|c| c.arity() == 0))
                    .ok_or_else(no_match)?;
                log::debug!(
                    "no {}-argument constructor for '{}', default-constructing",
                    args.len(),
                    self.class_name
                );
                ctor.construct(&[])
            }
        }
    }

    /// Plain-data summary of the descriptor
    pub fn summary(&self) -> ClassSummary {
        ClassSummary {
            class_name: self.class_name.clone(),
            members: self
                .members()
                .map(|m| MemberSummary {
                    name: m.name.clone(),
                    type_name: m.type_name.clone(),
                    kind: m.kind,
                    read_only: m.is_read_only(),
                })
                .collect(),
            methods: self
                .methods()
                .map(|m| MethodSummary {
                    name: m.name.clone(),
                    return_type: m.return_type.clone(),
                    parameters: m.parameter_types.clone(),
                    mutating: m.is_mutating(),
                })
                .collect(),
            constructors: self
                .constructors
                .iter()
                .map(|c| ConstructorSummary {
                    parameters: c.parameter_types.clone(),
                })
                .collect(),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("class_name", &self.class_name)
            .field("members", &self.member_order)
            .field("methods", &self.method_order)
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

// ============================================================================
// Summaries
// ============================================================================

/// Serializable description of a class
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    /// Class display name
    pub class_name: String,
    /// Members in registration order
    pub members: Vec<MemberSummary>,
    /// Methods in registration order
    pub methods: Vec<MethodSummary>,
    /// Constructors in registration order
    pub constructors: Vec<ConstructorSummary>,
}

/// Serializable description of a member
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    /// Member name
    pub name: String,
    /// Resolved type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Field or property
    pub kind: MemberKind,
    /// No setter registered
    pub read_only: bool,
}

/// Serializable description of a method
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodSummary {
    /// Method name
    pub name: String,
    /// Resolved return type name
    pub return_type: String,
    /// Resolved parameter type names
    pub parameters: Vec<String>,
    /// Needs a mutable receiver
    pub mutating: bool,
}

/// Serializable description of a constructor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructorSummary {
    /// Resolved parameter type names
    pub parameters: Vec<String>,
}
