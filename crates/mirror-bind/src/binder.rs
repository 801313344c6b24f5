//! Binding of registered classes and functions to a host runtime
//!
//! A [`Binder`] pairs a [`Registry`] with a [`Converters`] table. Every
//! crossing between host values and erased values goes through the type
//! name the descriptor recorded at registration time.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use mirror_core::{
    ConstructorDescriptor, FunctionDescriptor, Object, Reflect, ReflectError, ReflectResult,
    Registry, TypeDescriptor, Value,
};

use crate::convert::Converters;
use crate::host::Host;

/// Binding behaviour knobs
#[derive(Debug, Clone)]
pub struct BindOptions {
    /// Outbound values with no registered converter become `undefined`
    /// instead of failing with `UnregisteredType`
    pub degrade_unregistered: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            degrade_unregistered: true,
        }
    }
}

impl BindOptions {
    /// Fail on every outbound value without a converter
    pub fn strict() -> Self {
        Self {
            degrade_unregistered: false,
        }
    }
}

/// Registry and converters for one host
pub struct Binder<'r, H: Host> {
    registry: &'r Registry,
    converters: Converters<H>,
    options: BindOptions,
}

impl<'r, H: Host> Binder<'r, H> {
    /// Binder with the built-in converters and default options
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_options(registry, BindOptions::default())
    }

    /// Binder with the built-in converters and explicit options
    pub fn with_options(registry: &'r Registry, options: BindOptions) -> Self {
        Self {
            registry,
            converters: Converters::new(),
            options,
        }
    }

    /// Underlying registry
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Converter table
    pub fn converters(&self) -> &Converters<H> {
        &self.converters
    }

    /// Converter table, for registering custom types
    pub fn converters_mut(&mut self) -> &mut Converters<H> {
        &mut self.converters
    }

    /// Options in effect
    pub fn options(&self) -> &BindOptions {
        &self.options
    }

    /// Bind a class, registering it if needed
    pub fn bind<C: Reflect>(&self) -> ReflectResult<ClassBinding<'_, H>> {
        Ok(ClassBinding {
            binder: self,
            descriptor: self.registry.class::<C>()?,
        })
    }

    /// Bind an already registered class by its display name
    pub fn bind_by_name(&self, class_name: &str) -> ReflectResult<ClassBinding<'_, H>> {
        Ok(ClassBinding {
            binder: self,
            descriptor: self.registry.descriptor_by_name(class_name)?,
        })
    }

    /// Make a registered enum convertible: members, parameters and return
    /// values of type `E` cross as integers or value names
    pub fn bind_enum<E>(&mut self, name: &str) -> ReflectResult<()>
    where
        E: Any + Copy + Into<i64> + Send + Sync,
    {
        let descriptor = self.registry.enumeration(name)?;
        if descriptor.type_id() != TypeId::of::<E>() {
            return Err(ReflectError::CastMismatch {
                expected: name.to_string(),
                found: std::any::type_name::<E>().to_string(),
            });
        }
        self.converters.register_enum::<E>(descriptor);
        Ok(())
    }

    /// Bind a free function
    pub fn bind_function(&self, name: &str) -> ReflectResult<FunctionBinding<'_, H>> {
        Ok(FunctionBinding {
            binder: self,
            function: self.registry.function(name)?,
        })
    }

    /// Call a free function with host arguments
    pub fn call_function(&self, name: &str, args: &[H::Value]) -> ReflectResult<H::Value> {
        self.bind_function(name)?.call(args)
    }

    /// Convert an erased value to the host, applying the degrade policy
    pub fn to_host(&self, type_name: &str, value: &Value) -> ReflectResult<H::Value> {
        match self.converters.to_host(type_name, value) {
            Err(ReflectError::UnregisteredType(name)) if self.options.degrade_unregistered => {
                log::debug!("no converter for '{}', passing undefined", name);
                Ok(H::undefined())
            }
            other => other,
        }
    }

    /// Convert a host value to an erased value of the named type
    pub fn from_host(&self, type_name: &str, value: &H::Value) -> ReflectResult<Value> {
        self.converters.from_host(type_name, value)
    }

    /// Arity is checked before any argument is converted
    fn args_from_host(
        &self,
        name: &str,
        parameter_types: &[String],
        args: &[H::Value],
    ) -> ReflectResult<Vec<Value>> {
        if args.len() != parameter_types.len() {
            return Err(ReflectError::ArgumentCount {
                name: name.to_string(),
                expected: parameter_types.len(),
                got: args.len(),
            });
        }
        parameter_types
            .iter()
            .zip(args)
            .map(|(ty, arg)| self.from_host(ty, arg))
            .collect()
    }
}

impl<H: Host> fmt::Debug for Binder<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("registry", self.registry)
            .field("converters", &self.converters)
            .field("options", &self.options)
            .finish()
    }
}

/// Host-facing view of one registered class
pub struct ClassBinding<'b, H: Host> {
    binder: &'b Binder<'b, H>,
    descriptor: Arc<TypeDescriptor>,
}

impl<'b, H: Host> ClassBinding<'b, H> {
    /// Class display name
    pub fn class_name(&self) -> &str {
        self.descriptor.class_name()
    }

    /// Class descriptor
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// Members exposed as host properties
    pub fn property_names(&self) -> Vec<String> {
        self.descriptor.member_names()
    }

    /// Methods exposed to the host
    pub fn method_names(&self) -> Vec<String> {
        self.descriptor.method_names()
    }

    /// Arities of the registered constructors, in registration order
    pub fn constructor_arities(&self) -> Vec<usize> {
        self.descriptor
            .constructors()
            .iter()
            .map(ConstructorDescriptor::arity)
            .collect()
    }

    /// Construct an owned instance from host arguments.
    ///
    /// The constructor is chosen by argument count, then each argument is
    /// converted to that constructor's parameter type.
    pub fn construct(&self, args: &[H::Value]) -> ReflectResult<BoundObject<'b, 'static, H>> {
        let selected = self
            .descriptor
            .constructors()
            .iter()
            .find(|c| c.arity() == args.len());

        let object = match selected {
            Some(ctor) => {
                let values =
                    self.binder
                        .args_from_host(self.class_name(), ctor.parameter_types(), args)?;
                Object::from_boxed(self.descriptor.clone(), ctor.construct(&values)?)?
            }
            None => {
                // No arity matches, so the placeholders are never read and the
                // descriptor's fallback policy decides.
                let placeholders = vec![Value::empty(); args.len()];
                Object::construct(self.descriptor.clone(), &placeholders)?
            }
        };

        Ok(BoundObject {
            binder: self.binder,
            object,
        })
    }

    /// Expose an instance the caller keeps ownership of
    pub fn wrap<'o, C: Any + Send>(&self, instance: &'o mut C) -> ReflectResult<BoundObject<'b, 'o, H>> {
        Ok(BoundObject {
            binder: self.binder,
            object: Object::borrowed_with(self.descriptor.clone(), instance)?,
        })
    }

    /// Expose an existing object of this class
    pub fn adopt<'o>(&self, object: Object<'o>) -> ReflectResult<BoundObject<'b, 'o, H>> {
        if object.descriptor().type_id() != self.descriptor.type_id() {
            return Err(ReflectError::InstanceMismatch {
                expected: self.class_name().to_string(),
            });
        }
        Ok(BoundObject {
            binder: self.binder,
            object,
        })
    }
}

impl<H: Host> fmt::Debug for ClassBinding<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassBinding")
            .field("class", &self.class_name())
            .finish()
    }
}

/// An instance reachable from the host
pub struct BoundObject<'b, 'o, H: Host> {
    binder: &'b Binder<'b, H>,
    object: Object<'o>,
}

impl<'b, 'o, H: Host> BoundObject<'b, 'o, H> {
    /// Class display name
    pub fn class_name(&self) -> &str {
        self.object.class_name()
    }

    fn member_type(&self, name: &str) -> ReflectResult<String> {
        self.object
            .descriptor()
            .member(name)
            .map(|m| m.type_name().to_string())
            .ok_or_else(|| ReflectError::MemberNotFound {
                class: self.class_name().to_string(),
                name: name.to_string(),
            })
    }

    /// Read a property
    pub fn get(&self, name: &str) -> ReflectResult<H::Value> {
        let ty = self.member_type(name)?;
        let value = self.object.get(name)?;
        self.binder.to_host(&ty, &value)
    }

    /// Write a property
    pub fn set(&mut self, name: &str, value: &H::Value) -> ReflectResult<()> {
        let ty = self.member_type(name)?;
        let value = self.binder.from_host(&ty, value)?;
        self.object.set(name, value)
    }

    /// Call a method with host arguments
    pub fn call(&mut self, name: &str, args: &[H::Value]) -> ReflectResult<H::Value> {
        let descriptor = self.object.descriptor().clone();
        let method = descriptor
            .method(name)
            .ok_or_else(|| ReflectError::MethodNotFound {
                class: self.class_name().to_string(),
                name: name.to_string(),
            })?;
        let values = self
            .binder
            .args_from_host(name, method.parameter_types(), args)?;
        let result = self.object.call(name, &values)?;
        self.binder.to_host(method.return_type(), &result)
    }

    /// Property names
    pub fn property_names(&self) -> Vec<String> {
        self.object.member_names()
    }

    /// Method names
    pub fn method_names(&self) -> Vec<String> {
        self.object.method_names()
    }

    /// Pretty JSON rendering of the instance
    pub fn to_json(&self) -> ReflectResult<String> {
        self.object.to_json()
    }

    /// Underlying object
    pub fn object(&self) -> &Object<'o> {
        &self.object
    }

    /// Underlying object, mutably
    pub fn object_mut(&mut self) -> &mut Object<'o> {
        &mut self.object
    }

    /// Release the underlying object
    pub fn into_object(self) -> Object<'o> {
        self.object
    }
}

impl<H: Host> fmt::Debug for BoundObject<'_, '_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundObject")
            .field("object", &self.object)
            .finish()
    }
}

/// Host-facing view of one free function
pub struct FunctionBinding<'b, H: Host> {
    binder: &'b Binder<'b, H>,
    function: Arc<FunctionDescriptor>,
}

impl<H: Host> FunctionBinding<'_, H> {
    /// Function name
    pub fn name(&self) -> &str {
        self.function.name()
    }

    /// Parameter type names
    pub fn parameter_types(&self) -> &[String] {
        self.function.parameter_types()
    }

    /// Call with host arguments
    pub fn call(&self, args: &[H::Value]) -> ReflectResult<H::Value> {
        let values = self
            .binder
            .args_from_host(self.function.name(), self.function.parameter_types(), args)?;
        let result = self.function.invoke(&values)?;
        self.binder.to_host(self.function.return_type(), &result)
    }
}

impl<H: Host> fmt::Debug for FunctionBinding<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionBinding")
            .field("function", &self.function)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::JsonHost;
    use mirror_core::{ConstructorFallback, Describe, Registrar, RegistryOptions};
    use serde_json::json;

    #[derive(Clone, Default)]
    struct Lamp {
        watts: u32,
        label: String,
        lit: bool,
    }

    impl Describe for Lamp {}

    impl Lamp {
        fn toggle(&mut self) -> bool {
            self.lit = !self.lit;
            self.lit
        }

        fn dimmed(&self, factor: f64) -> f64 {
            f64::from(self.watts) * factor
        }
    }

    impl Reflect for Lamp {
        const CLASS_NAME: &'static str = "Lamp";

        fn register(reg: &mut Registrar<'_, Self>) {
            reg.member("watts", |l| &l.watts, |l| &mut l.watts);
            reg.member("label", |l| &l.label, |l| &mut l.label);
            reg.method("toggle", Lamp::toggle);
            reg.method("dimmed", Lamp::dimmed);
            reg.default_constructor();
            reg.constructor(|watts: u32, label: String| Lamp {
                watts,
                label,
                lit: false,
            });
        }
    }

    #[test]
    fn test_construct_and_access() {
        let registry = Registry::new();
        let binder = Binder::<JsonHost>::new(&registry);
        let class = binder.bind::<Lamp>().unwrap();
        assert_eq!(class.constructor_arities(), vec![0, 2]);

        let mut lamp = class.construct(&[json!(60), json!("desk")]).unwrap();
        assert_eq!(lamp.get("watts").unwrap(), json!(60));
        assert_eq!(lamp.get("label").unwrap(), json!("desk"));

        lamp.set("watts", &json!(40)).unwrap();
        assert_eq!(lamp.call("dimmed", &[json!(0.5)]).unwrap(), json!(20.0));
        assert_eq!(lamp.call("toggle", &[]).unwrap(), json!(true));
    }

    #[test]
    fn test_arity_checked_before_conversion() {
        let registry = Registry::new();
        let binder = Binder::<JsonHost>::new(&registry);
        let mut lamp = binder.bind::<Lamp>().unwrap().construct(&[]).unwrap();

        // "x" would fail conversion, but the count is wrong first
        let err = lamp.call("dimmed", &[json!("x"), json!(1)]).unwrap_err();
        assert!(matches!(err, ReflectError::ArgumentCount { expected: 1, got: 2, .. }));

        let err = lamp.call("dimmed", &[json!("x")]).unwrap_err();
        assert!(matches!(err, ReflectError::CastMismatch { .. }));
    }

    #[test]
    fn test_constructor_fallback() {
        let registry = Registry::new();
        let binder = Binder::<JsonHost>::new(&registry);
        let class = binder.bind::<Lamp>().unwrap();
        assert!(matches!(
            class.construct(&[json!(1)]),
            Err(ReflectError::NoMatchingConstructor { got: 1, .. })
        ));

        let lenient = Registry::with_options(
            RegistryOptions::default().with_constructor_fallback(ConstructorFallback::DefaultConstruct),
        );
        let binder = Binder::<JsonHost>::new(&lenient);
        let lamp = binder.bind::<Lamp>().unwrap().construct(&[json!(1)]).unwrap();
        assert_eq!(lamp.get("watts").unwrap(), json!(0));
    }

    #[test]
    fn test_wrap_leaves_ownership_with_caller() {
        let registry = Registry::new();
        let binder = Binder::<JsonHost>::new(&registry);
        let class = binder.bind::<Lamp>().unwrap();

        let mut native = Lamp::default();
        {
            let mut bound = class.wrap(&mut native).unwrap();
            bound.set("label", &json!("hall")).unwrap();
            bound.call("toggle", &[]).unwrap();
        }
        assert_eq!(native.label, "hall");
        assert!(native.lit);

        let mut wrong = 5i32;
        assert!(matches!(
            class.wrap(&mut wrong),
            Err(ReflectError::InstanceMismatch { .. })
        ));
    }

    #[test]
    fn test_unregistered_outbound_type() {
        #[derive(Clone, Default)]
        struct Socket {
            pins: u8,
        }
        impl Describe for Socket {}

        #[derive(Clone, Default)]
        struct Plug {
            socket: Socket,
        }
        impl Describe for Plug {}
        impl Reflect for Plug {
            const CLASS_NAME: &'static str = "Plug";
            fn register(reg: &mut Registrar<'_, Self>) {
                reg.member("socket", |p| &p.socket, |p| &mut p.socket);
                reg.default_constructor();
            }
        }

        let registry = Registry::new();
        let lenient = Binder::<JsonHost>::new(&registry);
        let plug = lenient.bind::<Plug>().unwrap().construct(&[]).unwrap();
        assert_eq!(plug.get("socket").unwrap(), json!(null));

        let strict = Binder::<JsonHost>::with_options(&registry, BindOptions::strict());
        let plug = strict.bind::<Plug>().unwrap().construct(&[]).unwrap();
        assert!(matches!(
            plug.get("socket"),
            Err(ReflectError::UnregisteredType(_))
        ));

        let mut custom = Binder::<JsonHost>::new(&registry);
        custom.converters_mut().register_type::<Socket, _, _>(
            &registry.resolve::<Socket>(),
            |s: &Socket| json!({ "pins": s.pins }),
            |h: &serde_json::Value| Some(Socket { pins: h.get("pins")?.as_u64()? as u8 }),
        );
        let mut plug = custom.bind::<Plug>().unwrap().construct(&[]).unwrap();
        plug.set("socket", &json!({ "pins": 3 })).unwrap();
        assert_eq!(plug.get("socket").unwrap(), json!({ "pins": 3 }));
    }

    #[test]
    fn test_functions() {
        let registry = Registry::new();
        registry
            .register_function("clamp", |v: i32, lo: i32, hi: i32| v.max(lo).min(hi))
            .unwrap();
        registry.register_function("noop", || ()).unwrap();

        let binder = Binder::<JsonHost>::new(&registry);
        assert_eq!(
            binder.call_function("clamp", &[json!(15), json!(0), json!(10)]).unwrap(),
            json!(10)
        );
        assert_eq!(binder.call_function("noop", &[]).unwrap(), json!(null));
        assert!(matches!(
            binder.call_function("clamp", &[json!(1)]),
            Err(ReflectError::ArgumentCount { .. })
        ));
        assert!(binder.bind_function("missing").unwrap_err().is_not_found());
    }
}
