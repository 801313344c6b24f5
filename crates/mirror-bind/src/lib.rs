//! mirror-bind - host-runtime binding contract over the mirror registry
//!
//! This crate is the seam between registered classes and an embedding
//! runtime. A runtime adapter implements [`Host`] for its value handles;
//! a [`Binder`] then exposes constructors, properties, methods and free
//! functions with conversions chosen by the registered type names.
//!
//! # Example
//!
//! ```ignore
//! use mirror_bind::{Binder, JsonHost};
//! use mirror_core::Registry;
//! use serde_json::json;
//!
//! let registry = Registry::global();
//! let binder = Binder::<JsonHost>::new(registry);
//! let mut point = binder.bind::<Point>()?.construct(&[json!(3.0), json!(4.0)])?;
//! assert_eq!(point.call("magnitude", &[])?, json!(5.0));
//! ```

#![warn(missing_docs)]

pub mod binder;
pub mod convert;
pub mod host;

pub use binder::{BindOptions, Binder, BoundObject, ClassBinding, FunctionBinding};
pub use convert::{Converters, FromHostFn, ToHostFn};
pub use host::{Host, JsonHost};
