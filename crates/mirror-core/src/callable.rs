//! Typed call adapters
//!
//! [`MethodFn`] and [`Callable`] turn ordinary Rust functions and closures
//! of up to eight parameters into type-erased invokers. The marker type
//! parameter only exists to keep the per-arity impls apart; callers never
//! name it.
//!
//! Every adapter follows the same sequence:
//!
//! 1. check `args.len()` against the arity captured at compile time
//! 2. unpack each argument by its static type, positionally
//! 3. call the real function
//! 4. wrap the result (`()` becomes the empty value)

use std::any::Any;
use std::marker::PhantomData;

use crate::descriptor::{Instance, ReceiverKind};
use crate::error::{ReflectError, ReflectResult};
use crate::names::{Describe, TypeNames};
use crate::value::Value;

/// Marker for methods taking `&C`
pub struct ByRef<Sig>(PhantomData<Sig>);

/// Marker for methods taking `&mut C`
pub struct ByMut<Sig>(PhantomData<Sig>);

/// Names used in errors raised by an adapter
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'a> {
    /// Class, or registry for free functions
    pub owner: &'a str,
    /// Method, function or class (for constructors) name
    pub name: &'a str,
}

impl CallSite<'_> {
    fn check_arity(&self, expected: usize, got: usize) -> ReflectResult<()> {
        if expected == got {
            Ok(())
        } else {
            Err(ReflectError::ArgumentCount {
                name: self.name.to_string(),
                expected,
                got,
            })
        }
    }

    fn instance_mismatch(&self) -> ReflectError {
        ReflectError::InstanceMismatch {
            expected: self.owner.to_string(),
        }
    }

    fn exclusive(&self) -> ReflectError {
        ReflectError::ExclusiveReceiver {
            class: self.owner.to_string(),
            name: self.name.to_string(),
        }
    }
}

fn unpack<A: Any + Clone>(args: &[Value], index: usize, site: &CallSite<'_>) -> ReflectResult<A> {
    let arg = args.get(index).ok_or_else(|| ReflectError::ArgumentCount {
        name: site.name.to_string(),
        expected: index + 1,
        got: args.len(),
    })?;
    arg.cast::<A>().map_err(|_| ReflectError::ArgumentMismatch {
        name: site.name.to_string(),
        index,
        expected: std::any::type_name::<A>().to_string(),
        found: arg.type_name().to_string(),
    })
}

/// A method of class `C`: any `Fn(&C, A1..An) -> R` or `Fn(&mut C, A1..An) -> R`
pub trait MethodFn<C, Marker>: Send + Sync + 'static {
    /// Number of parameters, receiver excluded
    const ARITY: usize;
    /// Receiver the method needs
    const RECEIVER: ReceiverKind;
    /// Return type
    type Output: Any + Clone + Send + Describe;

    /// Resolved parameter type names
    fn parameter_types(names: &TypeNames) -> Vec<String>;

    /// Check, unpack, call and wrap
    fn call(&self, this: Instance<'_>, args: &[Value], site: &CallSite<'_>) -> ReflectResult<Value>;
}

/// A receiver-less function: constructors and free functions
pub trait Callable<Marker>: Send + Sync + 'static {
    /// Number of parameters
    const ARITY: usize;
    /// Return type
    type Output: Any + Send;

    /// Resolved parameter type names
    fn parameter_types(names: &TypeNames) -> Vec<String>;

    /// Check, unpack and call
    fn call(&self, args: &[Value], site: &CallSite<'_>) -> ReflectResult<Self::Output>;
}

macro_rules! count_idents {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count_idents!($($tail)*) };
}

macro_rules! impl_call_adapters {
    ($($arg:ident),*) => {
        impl<C, F, R, $($arg,)*> MethodFn<C, ByRef<fn($($arg,)*) -> R>> for F
        where
            C: Any,
            F: Fn(&C, $($arg,)*) -> R + Send + Sync + 'static,
            R: Any + Clone + Send + Describe,
            $($arg: Any + Clone + Send + Describe,)*
        {
            const ARITY: usize = count_idents!($($arg)*);
            const RECEIVER: ReceiverKind = ReceiverKind::Shared;
            type Output = R;

            #[allow(unused_variables)]
            fn parameter_types(names: &TypeNames) -> Vec<String> {
                vec![$(names.resolve::<$arg>()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn call(&self, this: Instance<'_>, args: &[Value], site: &CallSite<'_>) -> ReflectResult<Value> {
                site.check_arity(Self::ARITY, args.len())?;
                let this = this.downcast_ref::<C>().ok_or_else(|| site.instance_mismatch())?;
                let mut index = 0usize;
                $(
                    let $arg = unpack::<$arg>(args, index, site)?;
                    index += 1;
                )*
                Ok(Value::from_return((self)(this, $($arg,)*)))
            }
        }

        impl<C, F, R, $($arg,)*> MethodFn<C, ByMut<fn($($arg,)*) -> R>> for F
        where
            C: Any,
            F: Fn(&mut C, $($arg,)*) -> R + Send + Sync + 'static,
            R: Any + Clone + Send + Describe,
            $($arg: Any + Clone + Send + Describe,)*
        {
            const ARITY: usize = count_idents!($($arg)*);
            const RECEIVER: ReceiverKind = ReceiverKind::Exclusive;
            type Output = R;

            #[allow(unused_variables)]
            fn parameter_types(names: &TypeNames) -> Vec<String> {
                vec![$(names.resolve::<$arg>()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn call(&self, mut this: Instance<'_>, args: &[Value], site: &CallSite<'_>) -> ReflectResult<Value> {
                site.check_arity(Self::ARITY, args.len())?;
                if !this.is_exclusive() {
                    return Err(site.exclusive());
                }
                let this = this.downcast_mut::<C>().ok_or_else(|| site.instance_mismatch())?;
                let mut index = 0usize;
                $(
                    let $arg = unpack::<$arg>(args, index, site)?;
                    index += 1;
                )*
                Ok(Value::from_return((self)(this, $($arg,)*)))
            }
        }

        impl<F, R, $($arg,)*> Callable<fn($($arg,)*) -> R> for F
        where
            F: Fn($($arg,)*) -> R + Send + Sync + 'static,
            R: Any + Send,
            $($arg: Any + Clone + Send + Describe,)*
        {
            const ARITY: usize = count_idents!($($arg)*);
            type Output = R;

            #[allow(unused_variables)]
            fn parameter_types(names: &TypeNames) -> Vec<String> {
                vec![$(names.resolve::<$arg>()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn call(&self, args: &[Value], site: &CallSite<'_>) -> ReflectResult<R> {
                site.check_arity(Self::ARITY, args.len())?;
                let mut index = 0usize;
                $(
                    let $arg = unpack::<$arg>(args, index, site)?;
                    index += 1;
                )*
                Ok((self)($($arg,)*))
            }
        }
    };
}

impl_call_adapters!();
impl_call_adapters!(A1);
impl_call_adapters!(A1, A2);
impl_call_adapters!(A1, A2, A3);
impl_call_adapters!(A1, A2, A3, A4);
impl_call_adapters!(A1, A2, A3, A4, A5);
impl_call_adapters!(A1, A2, A3, A4, A5, A6);
impl_call_adapters!(A1, A2, A3, A4, A5, A6, A7);
impl_call_adapters!(A1, A2, A3, A4, A5, A6, A7, A8);
