//! Value - the type-erased currency of the registry
//!
//! Every member value, argument and return value crosses the registry as a
//! [`Value`]. A value owns at most one payload of any `Clone + Send` type and
//! only gives it back to a caller that names the exact type it holds:
//!
//! ```text
//! Value::new(42i32).cast::<i32>()  -> Ok(42)
//! Value::new(42i32).cast::<f64>()  -> Err(CastMismatch { expected: "f64", found: "i32" })
//! Value::empty()                   -> the result of a `()` method
//! ```
//!
//! There is no numeric coercion at this level; converting between host
//! numbers and native widths is the job of the binding layer.

use std::any::{Any, TypeId};
use std::fmt;

use crate::error::{ReflectError, ReflectResult};

/// Object-safe view of a payload: clonable, sendable, downcastable.
trait Payload: Any + Send {
    fn clone_payload(&self) -> Box<dyn Payload>;
    fn payload_type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any + Clone + Send> Payload for T {
    fn clone_payload(&self) -> Box<dyn Payload> {
        Box::new(self.clone())
    }

    fn payload_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Type-erased container for one value of any `Clone + Send` type.
///
/// # Thread Safety
///
/// `Value` is `Send`; each value owns its payload exclusively and cloning
/// deep-copies it.
#[derive(Default)]
pub struct Value {
    payload: Option<Box<dyn Payload>>,
}

impl Value {
    /// Wrap a value
    pub fn new<T: Any + Clone + Send>(value: T) -> Self {
        Self {
            payload: Some(Box::new(value)),
        }
    }

    /// The empty value (result of a method returning `()`)
    pub fn empty() -> Self {
        Self { payload: None }
    }

    /// Wrap a call result, mapping `()` to the empty value
    pub fn from_return<R: Any + Clone + Send>(value: R) -> Self {
        if TypeId::of::<R>() == TypeId::of::<()>() {
            Self::empty()
        } else {
            Self::new(value)
        }
    }

    /// Check if this value holds nothing
    pub fn is_empty(&self) -> bool {
        self.payload.is_none()
    }

    /// Check if this value holds exactly a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.payload
            .as_ref()
            .is_some_and(|p| (**p).as_any().is::<T>())
    }

    /// Rust type name of the payload, `"void"` when empty
    pub fn type_name(&self) -> &'static str {
        match &self.payload {
            Some(p) => (**p).payload_type_name(),
            None => "void",
        }
    }

    /// Borrow the payload as a `T`
    pub fn downcast_ref<T: Any>(&self) -> ReflectResult<&T> {
        self.payload
            .as_ref()
            .and_then(|p| (**p).as_any().downcast_ref::<T>())
            .ok_or_else(|| ReflectError::cast::<T>(self.type_name()))
    }

    /// Mutably borrow the payload as a `T`
    pub fn downcast_mut<T: Any>(&mut self) -> ReflectResult<&mut T> {
        let found = self.type_name();
        self.payload
            .as_mut()
            .and_then(|p| (**p).as_any_mut().downcast_mut::<T>())
            .ok_or_else(|| ReflectError::cast::<T>(found))
    }

    /// Clone the payload out as a `T`
    pub fn cast<T: Any + Clone>(&self) -> ReflectResult<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Move the payload out as a `T`
    pub fn take<T: Any>(self) -> ReflectResult<T> {
        let found = self.type_name();
        match self.payload {
            Some(p) => p
                .into_any()
                .downcast::<T>()
                .map(|b| *b)
                .map_err(|_| ReflectError::cast::<T>(found)),
            None => Err(ReflectError::cast::<T>(found)),
        }
    }

    fn scalar_repr(&self) -> Option<String> {
        macro_rules! try_scalar {
            ($($ty:ty),*) => {
                $(
                    if let Ok(v) = self.downcast_ref::<$ty>() {
                        return Some(format!("{:?}", v));
                    }
                )*
            };
        }
        try_scalar!(bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String);
        None
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        Self {
            payload: self.payload.as_ref().map(|p| (**p).clone_payload()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Value::Empty");
        }
        match self.scalar_repr() {
            Some(repr) => write!(f, "Value({}: {})", self.type_name(), repr),
            None => write!(f, "Value({})", self.type_name()),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::new(value)
                }
            }
        )*
    };
}

impl_from_scalar!(bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::new(value.to_string())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::empty()
    }
}

/// Build a `Vec<Value>` argument list from heterogeneous expressions.
///
/// ```ignore
/// obj.call_method("resize", &args![2.0, 3.0])?;
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Mesh {
        vertices: Vec<f64>,
    }

    #[test]
    fn test_scalar_round_trip() {
        for v in [-7i32, 0, 42] {
            assert_eq!(Value::new(v).cast::<i32>().unwrap(), v);
        }
        for v in [0.0f64, -3.14, 1e10] {
            assert_eq!(Value::new(v).cast::<f64>().unwrap(), v);
        }
        for v in [true, false] {
            assert_eq!(Value::from(v).cast::<bool>().unwrap(), v);
        }
        for v in ["", "hello"] {
            assert_eq!(Value::from(v).cast::<String>().unwrap(), v);
        }
    }

    #[test]
    fn test_wrong_type_is_cast_mismatch() {
        let v = Value::new(42i32);
        let err = v.cast::<f64>().unwrap_err();
        assert_eq!(
            err,
            ReflectError::CastMismatch {
                expected: "f64".to_string(),
                found: "i32".to_string(),
            }
        );
        assert!(v.take::<u32>().is_err());
    }

    #[test]
    fn test_empty_value() {
        let v = Value::empty();
        assert!(v.is_empty());
        assert_eq!(v.type_name(), "void");
        assert!(v.cast::<i32>().is_err());
        assert!(Value::from_return(()).is_empty());
        assert!(!Value::from_return(1u8).is_empty());
    }

    #[test]
    fn test_custom_payload_clone_is_deep() {
        let original = Value::new(Mesh {
            vertices: vec![1.0, 2.0],
        });
        let mut copy = original.clone();
        copy.downcast_mut::<Mesh>().unwrap().vertices.push(3.0);

        assert_eq!(original.downcast_ref::<Mesh>().unwrap().vertices.len(), 2);
        assert_eq!(copy.take::<Mesh>().unwrap().vertices, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_is_and_type_name() {
        let v = Value::from("x");
        assert!(v.is::<String>());
        assert!(!v.is::<&str>());
        assert_eq!(v.type_name(), "alloc::string::String");
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", Value::new(42i32)), "Value(i32: 42)");
        assert_eq!(format!("{:?}", Value::empty()), "Value::Empty");
        let s = format!("{:?}", Value::new(Mesh { vertices: vec![] }));
        assert!(s.contains("Mesh"));
    }

    #[test]
    fn test_args_macro() {
        let args = args![1i32, 2.5f64, "three"];
        assert_eq!(args.len(), 3);
        assert_eq!(args[0].cast::<i32>().unwrap(), 1);
        assert_eq!(args[2].cast::<String>().unwrap(), "three");
        assert!(args![].is_empty());
    }
}
