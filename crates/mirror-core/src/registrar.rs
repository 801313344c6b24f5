//! Registrar - the compile-time-typed builder of a class descriptor
//!
//! A class's `Reflect::register` receives a `Registrar<Self>` and declares
//! its surface with real field accessors, methods and constructors. Each
//! declaration captures the static types involved, resolves their names
//! once, and stores a type-erased closure in the descriptor.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::callable::{CallSite, Callable, MethodFn};
use crate::descriptor::{
    ConstructorDescriptor, Factory, Getter, Instance, Invoker, MemberDescriptor, MemberKind,
    MethodDescriptor, Setter, TypeDescriptor,
};
use crate::error::{ReflectError, ReflectResult};
use crate::introspect::Reflect;
use crate::names::Describe;
use crate::options::DuplicatePolicy;
use crate::registry::Registry;
use crate::value::Value;

fn instance_mismatch(owner: &str) -> ReflectError {
    ReflectError::InstanceMismatch {
        expected: owner.to_string(),
    }
}

fn erase_invoker<F>(f: F) -> Invoker
where
    F: Fn(Instance<'_>, &[Value]) -> ReflectResult<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Fluent builder populating the descriptor of class `C`
pub struct Registrar<'a, C> {
    descriptor: &'a mut TypeDescriptor,
    registry: &'a Registry,
    duplicates: DuplicatePolicy,
    error: Option<ReflectError>,
    _class: PhantomData<fn() -> C>,
}

impl<'a, C: Any + Send> Registrar<'a, C> {
    pub(crate) fn new(
        descriptor: &'a mut TypeDescriptor,
        registry: &'a Registry,
        duplicates: DuplicatePolicy,
    ) -> Self {
        Self {
            descriptor,
            registry,
            duplicates,
            error: None,
            _class: PhantomData,
        }
    }

    /// First error recorded during registration, if any
    pub(crate) fn finish(self) -> ReflectResult<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Display name of the class being registered
    pub fn class_name(&self) -> &str {
        self.descriptor.class_name()
    }

    /// Registry this class is being registered into
    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// Register class `D` first, so members and signatures of this class
    /// that mention `D` resolve to its class name.
    ///
    /// ```ignore
    /// reg.depends_on::<Wheel>()
    ///    .member("front", |c| &c.front, |c| &mut c.front);
    /// ```
    pub fn depends_on<D: Reflect>(&mut self) -> &mut Self {
        if let Err(err) = self.registry.register::<D>() {
            self.fail(err);
        }
        self
    }

    fn fail(&mut self, err: ReflectError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Returns false when the new entry must be dropped
    fn admit(&mut self, what: &'static str, name: &str, exists: bool) -> bool {
        if !exists {
            return true;
        }
        match self.duplicates {
            DuplicatePolicy::Replace => {
                log::warn!(
                    "{} '{}' registered twice in class '{}', later registration wins",
                    what,
                    name,
                    self.descriptor.class_name()
                );
                true
            }
            DuplicatePolicy::Reject => {
                let owner = self.descriptor.class_name().to_string();
                self.fail(ReflectError::Duplicate {
                    owner,
                    what,
                    name: name.to_string(),
                });
                false
            }
        }
    }

    fn insert_member(&mut self, member: MemberDescriptor) -> &mut Self {
        let exists = self.descriptor.has_member(&member.name);
        if self.admit("member", &member.name, exists) {
            self.descriptor.insert_member(member);
        }
        self
    }

    /// Register a field through a pair of accessors.
    ///
    /// ```ignore
    /// reg.member("x", |p| &p.x, |p| &mut p.x);
    /// ```
    pub fn member<T, G, M>(&mut self, name: &str, get: G, get_mut: M) -> &mut Self
    where
        T: Any + Clone + Send + Describe,
        G: Fn(&C) -> &T + Send + Sync + 'static,
        M: Fn(&mut C) -> &mut T + Send + Sync + 'static,
    {
        let owner = self.class_name().to_string();
        let getter: Getter = {
            let owner = owner.clone();
            Arc::new(move |instance: &dyn Any| -> ReflectResult<Value> {
                let this = instance
                    .downcast_ref::<C>()
                    .ok_or_else(|| instance_mismatch(&owner))?;
                Ok(Value::new(get(this).clone()))
            })
        };
        let setter: Setter = {
            let owner = owner.clone();
            Arc::new(move |instance: &mut dyn Any, value: Value| -> ReflectResult<()> {
                let this = instance
                    .downcast_mut::<C>()
                    .ok_or_else(|| instance_mismatch(&owner))?;
                *get_mut(this) = value.take::<T>()?;
                Ok(())
            })
        };

        let member = MemberDescriptor {
            owner,
            name: name.to_string(),
            type_name: self.registry.resolve::<T>(),
            kind: MemberKind::Field,
            getter,
            setter: Some(setter),
        };
        self.insert_member(member)
    }

    /// Register a virtual member backed by a getter and a setter
    pub fn property<T, G, S>(&mut self, name: &str, get: G, set: S) -> &mut Self
    where
        T: Any + Clone + Send + Describe,
        G: Fn(&C) -> T + Send + Sync + 'static,
        S: Fn(&mut C, T) + Send + Sync + 'static,
    {
        let owner = self.class_name().to_string();
        let setter: Setter = {
            let owner = owner.clone();
            Arc::new(move |instance: &mut dyn Any, value: Value| -> ReflectResult<()> {
                let this = instance
                    .downcast_mut::<C>()
                    .ok_or_else(|| instance_mismatch(&owner))?;
                set(this, value.take::<T>()?);
                Ok(())
            })
        };
        let member = MemberDescriptor {
            owner: owner.clone(),
            name: name.to_string(),
            type_name: self.registry.resolve::<T>(),
            kind: MemberKind::Property,
            getter: Self::property_getter(owner, get),
            setter: Some(setter),
        };
        self.insert_member(member)
    }

    /// Register a virtual member backed by a getter only
    pub fn readonly_property<T, G>(&mut self, name: &str, get: G) -> &mut Self
    where
        T: Any + Clone + Send + Describe,
        G: Fn(&C) -> T + Send + Sync + 'static,
    {
        let owner = self.class_name().to_string();
        let member = MemberDescriptor {
            owner: owner.clone(),
            name: name.to_string(),
            type_name: self.registry.resolve::<T>(),
            kind: MemberKind::Property,
            getter: Self::property_getter(owner, get),
            setter: None,
        };
        self.insert_member(member)
    }

    fn property_getter<T, G>(owner: String, get: G) -> Getter
    where
        T: Any + Clone + Send,
        G: Fn(&C) -> T + Send + Sync + 'static,
    {
        Arc::new(move |instance: &dyn Any| -> ReflectResult<Value> {
            let this = instance
                .downcast_ref::<C>()
                .ok_or_else(|| instance_mismatch(&owner))?;
            Ok(Value::new(get(this)))
        })
    }

    /// Register a method: any `Fn(&C, ..) -> R` or `Fn(&mut C, ..) -> R`
    /// of up to eight parameters.
    ///
    /// ```ignore
    /// reg.method("magnitude", Point::magnitude)
    ///    .method("scale", Point::scale);
    /// ```
    pub fn method<F, M>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: MethodFn<C, M>,
    {
        let owner = self.class_name().to_string();
        let invoker = {
            let owner = owner.clone();
            let name = name.to_string();
            erase_invoker(move |this, args| {
                f.call(
                    this,
                    args,
                    &CallSite {
                        owner: &owner,
                        name: &name,
                    },
                )
            })
        };

        let method = MethodDescriptor {
            owner,
            name: name.to_string(),
            return_type: self.registry.resolve::<F::Output>(),
            parameter_types: F::parameter_types(&self.registry.type_names()),
            receiver: F::RECEIVER,
            invoker,
        };
        let exists = self.descriptor.has_method(name);
        if self.admit("method", name, exists) {
            self.descriptor.insert_method(method);
        }
        self
    }

    fn push_constructor(&mut self, constructor: ConstructorDescriptor) -> &mut Self {
        let arity = constructor.arity();
        let exists = self.descriptor.constructors().iter().any(|c| c.arity() == arity);
        if exists && self.duplicates == DuplicatePolicy::Replace {
            log::warn!(
                "class '{}' has two {}-argument constructors, only the first is reachable",
                self.class_name(),
                arity
            );
            self.descriptor.push_constructor(constructor);
        } else if self.admit("constructor", &format!("{}-argument", arity), exists) {
            self.descriptor.push_constructor(constructor);
        }
        self
    }

    /// Register a constructor: any `Fn(A1..An) -> C` of up to eight parameters
    pub fn constructor<F, M>(&mut self, f: F) -> &mut Self
    where
        F: Callable<M, Output = C>,
    {
        let owner = self.class_name().to_string();
        let factory: Factory = Arc::new(move |args: &[Value]| -> ReflectResult<Box<dyn Any + Send>> {
            let site = CallSite {
                owner: &owner,
                name: &owner,
            };
            let instance = f.call(args, &site)?;
            Ok(Box::new(instance) as Box<dyn Any + Send>)
        });

        self.push_constructor(ConstructorDescriptor {
            parameter_types: F::parameter_types(&self.registry.type_names()),
            is_default: false,
            factory,
        })
    }

    /// Register `C::default` as the zero-argument constructor
    pub fn default_constructor(&mut self) -> &mut Self
    where
        C: Default,
    {
        let owner = self.class_name().to_string();
        let factory: Factory = Arc::new(move |args: &[Value]| -> ReflectResult<Box<dyn Any + Send>> {
            if !args.is_empty() {
                return Err(ReflectError::ArgumentCount {
                    name: owner.clone(),
                    expected: 0,
                    got: args.len(),
                });
            }
            Ok(Box::new(C::default()) as Box<dyn Any + Send>)
        });

        self.push_constructor(ConstructorDescriptor {
            parameter_types: Vec::new(),
            is_default: true,
            factory,
        })
    }
}
