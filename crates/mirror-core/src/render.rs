//! Text and JSON rendering of descriptors and live instances

use std::any::Any;
use std::fmt::Write;

use serde::Serialize;

use crate::descriptor::{MemberDescriptor, TypeDescriptor};
use crate::error::ReflectResult;
use crate::value::Value;

/// JSON form of a scalar value; `null` for everything else.
///
/// Strings, booleans, every integer width and both float widths are
/// rendered faithfully.
pub fn scalar_to_json(value: &Value) -> serde_json::Value {
    macro_rules! try_scalar {
        ($($ty:ty),*) => {
            $(
                if let Ok(v) = value.downcast_ref::<$ty>() {
                    return serde_json::json!(v);
                }
            )*
        };
    }
    try_scalar!(String, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
    serde_json::Value::Null
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InstanceJson<'a> {
    class_name: &'a str,
    members: Vec<MemberJson<'a>>,
    methods: Vec<MethodJson<'a>>,
}

#[derive(Serialize)]
struct MemberJson<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    type_name: &'a str,
    value: serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MethodJson<'a> {
    name: &'a str,
    return_type: &'a str,
    parameters: &'a [String],
}

fn member_repr(member: &MemberDescriptor, instance: &dyn Any) -> ReflectResult<String> {
    let value = member.get(instance)?;
    Ok(match scalar_to_json(&value) {
        serde_json::Value::Null if !value.is_empty() => format!("<{}>", member.type_name()),
        json => json.to_string(),
    })
}

impl TypeDescriptor {
    /// Pretty-printed JSON description of a live instance.
    ///
    /// Members carry their current value, methods are described but never
    /// invoked.
    pub fn to_json(&self, instance: &dyn Any) -> ReflectResult<String> {
        let members = self
            .members()
            .map(|m| {
                Ok(MemberJson {
                    name: m.name(),
                    type_name: m.type_name(),
                    value: scalar_to_json(&m.get(instance)?),
                })
            })
            .collect::<ReflectResult<Vec<_>>>()?;
        let methods = self
            .methods()
            .map(|m| MethodJson {
                name: m.name(),
                return_type: m.return_type(),
                parameters: m.parameter_types(),
            })
            .collect();

        let doc = InstanceJson {
            class_name: self.class_name(),
            members,
            methods,
        };
        // Serializing borrowed strings and json values cannot fail
        Ok(serde_json::to_string_pretty(&doc).unwrap_or_default())
    }

    /// Human-readable summary of the class surface
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "class {}", self.class_name());

        let _ = writeln!(out, "  members:");
        for m in self.members() {
            let suffix = if m.is_read_only() { " (read-only)" } else { "" };
            let _ = writeln!(out, "    {} {}{}", m.type_name(), m.name(), suffix);
        }

        let _ = writeln!(out, "  methods:");
        for m in self.methods() {
            let suffix = if m.is_mutating() { " mut" } else { "" };
            let _ = writeln!(
                out,
                "    {} {}({}){}",
                m.return_type(),
                m.name(),
                m.parameter_types().join(", "),
                suffix
            );
        }

        let _ = writeln!(out, "  constructors:");
        for c in self.constructors() {
            let _ = writeln!(out, "    {}({})", self.class_name(), c.parameter_types().join(", "));
        }
        out
    }

    /// `name (type): value` line for one member of a live instance
    pub fn format_member(&self, instance: &dyn Any, name: &str) -> ReflectResult<String> {
        let member = self
            .member(name)
            .ok_or_else(|| crate::error::ReflectError::MemberNotFound {
                class: self.class_name().to_string(),
                name: name.to_string(),
            })?;
        Ok(format!(
            "{} ({}): {}",
            member.name(),
            member.type_name(),
            member_repr(member, instance)?
        ))
    }
}
