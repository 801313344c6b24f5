//! Mirror Core - runtime type registry and by-name dispatch
//!
//! Classes describe themselves once through a [`Registrar`]; the result is a
//! [`TypeDescriptor`] that any consumer (a binding generator, a debugger, a
//! serializer) can walk and use without knowing the static type again.
//!
//! # Example
//!
//! ```ignore
//! use mirror_core::{args, Introspectable, Reflect, Registrar};
//!
//! #[derive(Clone, Default, Reflect)]
//! #[reflect(with = Point::register_methods)]
//! struct Point {
//!     x: f64,
//!     y: f64,
//! }
//!
//! impl Point {
//!     fn new(x: f64, y: f64) -> Self {
//!         Self { x, y }
//!     }
//!
//!     fn magnitude(&self) -> f64 {
//!         (self.x * self.x + self.y * self.y).sqrt()
//!     }
//!
//!     fn register_methods(reg: &mut Registrar<Self>) {
//!         reg.method("magnitude", Point::magnitude).constructor(Point::new);
//!     }
//! }
//!
//! let p = Point::new(3.0, 4.0);
//! let m = p.call_const_method("magnitude", &args![])?.cast::<f64>()?;
//! assert_eq!(m, 5.0);
//! ```

#![warn(missing_docs)]

extern crate self as mirror_core;

pub mod callable;
pub mod descriptor;
pub mod enums;
pub mod error;
pub mod function;
pub mod introspect;
pub mod names;
pub mod object;
pub mod options;
pub mod registrar;
pub mod registry;
pub mod render;
pub mod value;

pub use callable::{CallSite, Callable, MethodFn};
pub use descriptor::{
    ClassSummary, ConstructorDescriptor, ConstructorSummary, Instance, MemberDescriptor,
    MemberKind, MemberSummary, MethodDescriptor, MethodSummary, ReceiverKind, TypeDescriptor,
};
pub use enums::{EnumDescriptor, EnumRegistrar};
pub use error::{ErrorKind, ReflectError, ReflectResult};
pub use function::FunctionDescriptor;
pub use introspect::{Introspectable, Reflect};
pub use names::{Describe, TypeNames};
pub use object::{Handle, Object};
pub use options::{ConstructorFallback, DuplicatePolicy, RegistryOptions};
pub use registrar::Registrar;
pub use registry::{Phase, Registry};
pub use render::scalar_to_json;
pub use value::Value;

#[cfg(feature = "derive")]
pub use mirror_derive::Reflect;
