//! Type-name keyed converters between erased values and host values
//!
//! The converter table is the seam through which custom, container and
//! pointer types become host-visible: a binder looks up the type name a
//! descriptor recorded and uses whatever converter is registered under it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use mirror_core::{EnumDescriptor, ReflectError, ReflectResult, Value};
use rustc_hash::FxHashMap;

use crate::host::Host;

/// Erased value -> host value
pub type ToHostFn<H> = Arc<dyn Fn(&Value) -> ReflectResult<<H as Host>::Value> + Send + Sync>;

/// Host value -> erased value
pub type FromHostFn<H> = Arc<dyn Fn(&<H as Host>::Value) -> ReflectResult<Value> + Send + Sync>;

struct Converter<H: Host> {
    to_host: ToHostFn<H>,
    from_host: FromHostFn<H>,
}

/// Bidirectional converters for one host, keyed by resolved type name
pub struct Converters<H: Host> {
    entries: FxHashMap<String, Converter<H>>,
}

impl<H: Host> Converters<H> {
    /// Converter table pre-loaded with the built-in scalars and their vectors
    pub fn new() -> Self {
        let mut converters = Self::empty();
        converters.load_builtins();
        converters
    }

    /// Converter table with nothing registered
    pub fn empty() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// Register raw converters under a type name, replacing any previous pair
    pub fn register(&mut self, type_name: &str, to_host: ToHostFn<H>, from_host: FromHostFn<H>) {
        if self
            .entries
            .insert(type_name.to_string(), Converter { to_host, from_host })
            .is_some()
        {
            log::debug!("converter for '{}' replaced", type_name);
        }
    }

    /// Register typed converters for `T` under a type name.
    ///
    /// `from_host` returns `None` when the host value has the wrong shape;
    /// that surfaces as a cast mismatch naming the host value's kind.
    ///
    /// Callables cross the same way, as a boxed `Fn` newtype whose inbound
    /// converter wraps the host function:
    ///
    /// ```ignore
    /// #[derive(Clone)]
    /// struct Callback(Arc<dyn Fn(f64) -> f64 + Send + Sync>);
    ///
    /// converters.register_type::<Callback, _, _>(
    ///     "function<double(double)>",
    ///     |_| JsonHost::null(),
    ///     |h| {
    ///         let k = h.as_f64()?;
    ///         Some(Callback(Arc::new(move |x| x * k)))
    ///     },
    /// );
    /// ```
    pub fn register_type<T, F, G>(&mut self, type_name: &str, to_host: F, from_host: G)
    where
        T: Any + Clone + Send,
        F: Fn(&T) -> H::Value + Send + Sync + 'static,
        G: Fn(&H::Value) -> Option<T> + Send + Sync + 'static,
    {
        let expected = type_name.to_string();
        let to: ToHostFn<H> = Arc::new(move |value: &Value| -> ReflectResult<H::Value> {
            Ok(to_host(value.downcast_ref::<T>()?))
        });
        let from: FromHostFn<H> = Arc::new(move |host: &H::Value| -> ReflectResult<Value> {
            from_host(host)
                .map(Value::new)
                .ok_or_else(|| ReflectError::CastMismatch {
                    expected: expected.clone(),
                    found: H::kind_name(host).to_string(),
                })
        });
        self.register(type_name, to, from);
    }

    /// Register `T` and `Vec<T>` (as `vector<name>`)
    pub fn register_with_vector<T, F, G>(&mut self, type_name: &str, to_host: F, from_host: G)
    where
        T: Any + Clone + Send,
        F: Fn(&T) -> H::Value + Clone + Send + Sync + 'static,
        G: Fn(&H::Value) -> Option<T> + Clone + Send + Sync + 'static,
    {
        self.register_type::<T, _, _>(type_name, to_host.clone(), from_host.clone());
        self.register_type::<Vec<T>, _, _>(
            &format!("vector<{}>", type_name),
            move |items: &Vec<T>| H::from_array(items.iter().map(&to_host).collect()),
            move |host: &H::Value| H::as_array(host)?.iter().map(&from_host).collect(),
        );
    }

    /// Register converters for a registered enum and its vector, under the
    /// enum's name.
    ///
    /// Variants go out as integers. Coming in, an integer or a value name is
    /// accepted and checked against the descriptor.
    pub fn register_enum<E>(&mut self, descriptor: Arc<EnumDescriptor>)
    where
        E: Any + Copy + Into<i64> + Send + Sync,
    {
        let name = descriptor.name().to_string();
        let inbound = move |host: &H::Value| -> ReflectResult<E> {
            if let Some(value) = H::as_integer(host) {
                return descriptor.variant::<E>(value);
            }
            match H::as_string(host) {
                Some(value_name) => descriptor.variant_named::<E>(&value_name),
                None => Err(ReflectError::CastMismatch {
                    expected: descriptor.name().to_string(),
                    found: H::kind_name(host).to_string(),
                }),
            }
        };
        let inbound = Arc::new(inbound);

        let to: ToHostFn<H> = Arc::new(|value: &Value| -> ReflectResult<H::Value> {
            Ok(H::from_integer((*value.downcast_ref::<E>()?).into()))
        });
        let from: FromHostFn<H> = {
            let inbound = inbound.clone();
            Arc::new(move |host: &H::Value| inbound(host).map(Value::new))
        };
        self.register(&name, to, from);

        let to: ToHostFn<H> = Arc::new(|value: &Value| -> ReflectResult<H::Value> {
            let items = value.downcast_ref::<Vec<E>>()?;
            Ok(H::from_array(
                items.iter().map(|item| H::from_integer((*item).into())).collect(),
            ))
        });
        let from: FromHostFn<H> = {
            let expected = format!("vector<{}>", name);
            Arc::new(move |host: &H::Value| -> ReflectResult<Value> {
                let items = H::as_array(host).ok_or_else(|| ReflectError::CastMismatch {
                    expected: expected.clone(),
                    found: H::kind_name(host).to_string(),
                })?;
                let variants = items
                    .iter()
                    .map(|item| inbound(item))
                    .collect::<ReflectResult<Vec<E>>>()?;
                Ok(Value::new(variants))
            })
        };
        self.register(&format!("vector<{}>", name), to, from);
    }

    fn load_builtins(&mut self) {
        macro_rules! integers {
            ($wide:ty, $from:ident, $as:ident; $($ty:ty => $name:literal),* $(,)?) => {
                $(
                    self.register_with_vector::<$ty, _, _>(
                        $name,
                        |v: &$ty| match <$wide>::try_from(*v) {
                            Ok(wide) => H::$from(wide),
                            Err(_) => H::from_number(*v as f64),
                        },
                        |h: &H::Value| H::$as(h).and_then(|wide| <$ty>::try_from(wide).ok()),
                    );
                )*
            };
        }

        integers! { i64, from_integer, as_integer;
            i8 => "int8",
            i16 => "short",
            i32 => "int",
            i64 => "long long",
            isize => "ptrdiff_t",
        }
        integers! { u64, from_unsigned, as_unsigned;
            u8 => "uint8",
            u16 => "unsigned short",
            u32 => "unsigned int",
            u64 => "unsigned long long",
            usize => "size_t",
        }

        self.register_with_vector::<f64, _, _>("double", |v: &f64| H::from_number(*v), |h: &H::Value| H::as_number(h));
        self.register_with_vector::<f32, _, _>(
            "float",
            |v: &f32| H::from_number(f64::from(*v)),
            |h: &H::Value| H::as_number(h).map(|n| n as f32),
        );
        self.register_with_vector::<bool, _, _>("bool", |v: &bool| H::from_bool(*v), |h: &H::Value| H::as_bool(h));
        self.register_with_vector::<String, _, _>(
            "string",
            |v: &String| H::from_string(v),
            |h: &H::Value| H::as_string(h),
        );
        self.register_with_vector::<char, _, _>(
            "char",
            |v: &char| H::from_string(v.encode_utf8(&mut [0; 4])),
            |h: &H::Value| {
                let s = H::as_string(h)?;
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            },
        );
    }

    /// Check if a converter is registered
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Convert an erased value of the named type to a host value.
    ///
    /// Empty values and `void` become `undefined`; a missing converter is
    /// `UnregisteredType`.
    pub fn to_host(&self, type_name: &str, value: &Value) -> ReflectResult<H::Value> {
        if value.is_empty() || type_name == "void" {
            return Ok(H::undefined());
        }
        match self.entries.get(type_name) {
            Some(converter) => (converter.to_host)(value),
            None => Err(ReflectError::UnregisteredType(type_name.to_string())),
        }
    }

    /// Convert a host value to an erased value of the named type
    pub fn from_host(&self, type_name: &str, value: &H::Value) -> ReflectResult<Value> {
        match self.entries.get(type_name) {
            Some(converter) => (converter.from_host)(value),
            None => Err(ReflectError::UnregisteredType(type_name.to_string())),
        }
    }
}

impl<H: Host> Default for Converters<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Host> fmt::Debug for Converters<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converters")
            .field("types", &self.type_names())
            .finish()
    }
}
