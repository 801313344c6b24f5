//! Host value model
//!
//! A [`Host`] is the black-box value representation of one embedding
//! runtime. Adapters for a JavaScript engine, a Python interpreter or a Lua
//! state implement it over their own value handles; [`JsonHost`] is the
//! reference implementation used for tests and tooling.

use std::fmt;

/// 2^63; the smallest double above `i64::MAX`
const I64_END: f64 = 9_223_372_036_854_775_808.0;
/// 2^64; the smallest double above `u64::MAX`
const U64_END: f64 = 18_446_744_073_709_551_616.0;

/// Exact integral double inside the `i64` range
fn integral_i64(n: f64) -> Option<i64> {
    (n.fract() == 0.0 && n >= -I64_END && n < I64_END).then(|| n as i64)
}

/// Exact integral double inside the `u64` range
fn integral_u64(n: f64) -> Option<u64> {
    (n.fract() == 0.0 && n >= 0.0 && n < U64_END).then(|| n as u64)
}

/// Value model of an embedding runtime
pub trait Host: 'static {
    /// Host value handle
    type Value: Clone + fmt::Debug + Send;

    /// The "no value" marker (`undefined`, `None`, `nil`)
    fn undefined() -> Self::Value;

    /// Explicit null
    fn null() -> Self::Value;

    /// Boolean
    fn from_bool(value: bool) -> Self::Value;

    /// Floating-point number
    fn from_number(value: f64) -> Self::Value;

    /// Integer; hosts without a separate integer type store a number
    fn from_integer(value: i64) -> Self::Value {
        Self::from_number(value as f64)
    }

    /// Unsigned integer; values past `i64::MAX` become numbers unless the
    /// host keeps them exactly
    fn from_unsigned(value: u64) -> Self::Value {
        match i64::try_from(value) {
            Ok(value) => Self::from_integer(value),
            Err(_) => Self::from_number(value as f64),
        }
    }

    /// String
    fn from_string(value: &str) -> Self::Value;

    /// Array of values
    fn from_array(items: Vec<Self::Value>) -> Self::Value;

    /// Check for the "no value" marker
    fn is_undefined(value: &Self::Value) -> bool;

    /// Read a boolean
    fn as_bool(value: &Self::Value) -> Option<bool>;

    /// Read a number
    fn as_number(value: &Self::Value) -> Option<f64>;

    /// Read an integer; numbers with a fractional part are rejected
    fn as_integer(value: &Self::Value) -> Option<i64> {
        Self::as_number(value).and_then(integral_i64)
    }

    /// Read a non-negative integer
    fn as_unsigned(value: &Self::Value) -> Option<u64> {
        Self::as_number(value).and_then(integral_u64)
    }

    /// Read a string
    fn as_string(value: &Self::Value) -> Option<String>;

    /// Read an array
    fn as_array(value: &Self::Value) -> Option<Vec<Self::Value>>;

    /// Short name of the value's kind, for error messages
    fn kind_name(value: &Self::Value) -> &'static str;
}

/// Reference host whose values are `serde_json::Value`.
///
/// `undefined` and `null` both map to JSON `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHost;

impl Host for JsonHost {
    type Value = serde_json::Value;

    fn undefined() -> Self::Value {
        serde_json::Value::Null
    }

    fn null() -> Self::Value {
        serde_json::Value::Null
    }

    fn from_bool(value: bool) -> Self::Value {
        serde_json::Value::Bool(value)
    }

    fn from_number(value: f64) -> Self::Value {
        serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }

    fn from_integer(value: i64) -> Self::Value {
        serde_json::Value::Number(value.into())
    }

    fn from_unsigned(value: u64) -> Self::Value {
        serde_json::Value::Number(value.into())
    }

    fn from_string(value: &str) -> Self::Value {
        serde_json::Value::String(value.to_string())
    }

    fn from_array(items: Vec<Self::Value>) -> Self::Value {
        serde_json::Value::Array(items)
    }

    fn is_undefined(value: &Self::Value) -> bool {
        value.is_null()
    }

    fn as_bool(value: &Self::Value) -> Option<bool> {
        value.as_bool()
    }

    fn as_number(value: &Self::Value) -> Option<f64> {
        value.as_f64()
    }

    fn as_integer(value: &Self::Value) -> Option<i64> {
        value
            .as_i64()
            .or_else(|| value.as_f64().and_then(integral_i64))
    }

    fn as_unsigned(value: &Self::Value) -> Option<u64> {
        value
            .as_u64()
            .or_else(|| value.as_f64().and_then(integral_u64))
    }

    fn as_string(value: &Self::Value) -> Option<String> {
        value.as_str().map(str::to_string)
    }

    fn as_array(value: &Self::Value) -> Option<Vec<Self::Value>> {
        value.as_array().cloned()
    }

    fn kind_name(value: &Self::Value) -> &'static str {
        match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "boolean",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Array(_) => "array",
            serde_json::Value::Object(_) => "object",
        }
    }
}
