//! Free-function registry (name-based dispatch)

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::callable::{CallSite, Callable};
use crate::error::{ReflectError, ReflectResult};
use crate::names::{Describe, TypeNames};
use crate::value::Value;

/// Type-erased function entry point
pub type FunctionInvoker = Arc<dyn Fn(&[Value]) -> ReflectResult<Value> + Send + Sync>;

/// One registered free function
#[derive(Clone)]
pub struct FunctionDescriptor {
    name: String,
    return_type: String,
    parameter_types: Vec<String>,
    invoker: FunctionInvoker,
}

impl FunctionDescriptor {
    pub(crate) fn new<F, M>(name: &str, f: F, names: &TypeNames) -> Self
    where
        F: Callable<M>,
        F::Output: Clone + Describe,
    {
        let owned = name.to_string();
        let invoker: FunctionInvoker = Arc::new(move |args: &[Value]| -> ReflectResult<Value> {
            let site = CallSite {
                owner: "functions",
                name: &owned,
            };
            f.call(args, &site).map(Value::from_return)
        });
        Self {
            name: name.to_string(),
            return_type: names.resolve::<F::Output>(),
            parameter_types: F::parameter_types(names),
            invoker,
        }
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved return type name
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

    /// Call the function
    pub fn invoke(&self, args: &[Value]) -> ReflectResult<Value> {
        (self.invoker)(args)
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .field("parameter_types", &self.parameter_types)
            .finish()
    }
}

/// Functions indexed by name
#[derive(Debug, Default)]
pub(crate) struct FunctionTable {
    functions: FxHashMap<String, Arc<FunctionDescriptor>>,
}

impl FunctionTable {
    /// Insert a function, returning the one it replaces
    pub fn insert(&mut self, function: FunctionDescriptor) -> Option<Arc<FunctionDescriptor>> {
        self.functions
            .insert(function.name.clone(), Arc::new(function))
    }

    pub fn get(&self, name: &str) -> ReflectResult<Arc<FunctionDescriptor>> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| ReflectError::FunctionNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort_unstable();
        names
    }
}
