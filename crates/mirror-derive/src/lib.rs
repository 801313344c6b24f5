// mirror-derive: derive macro for mirror class registration
//
// Provides:
// - #[derive(Reflect)] - registers every named field of a struct as a member
//
// Example:
// ```
// use mirror_core::Reflect;
//
// #[derive(Clone, Reflect)]
// #[reflect(name = "Vec2", with = Vector::register_methods)]
// struct Vector {
//     x: f64,
//     y: f64,
//     #[reflect(skip)]
//     cache: Option<f64>,
// }
// ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod attrs;
mod reflect;

/// Derives `mirror_core::Reflect` and `mirror_core::Describe` for a struct
/// with named fields.
///
/// Every field becomes a member registered through `Registrar::member`.
///
/// Container attributes:
/// - `#[reflect(name = "...")]` - class display name (defaults to the type name)
/// - `#[reflect(with = path)]` - extra registration function
///   `fn(&mut Registrar<Self>)` for methods, properties and constructors;
///   may be repeated
///
/// Field attributes:
/// - `#[reflect(skip)]` - not registered
/// - `#[reflect(rename = "...")]` - member name
/// - `#[reflect(readonly)]` - registered as a read-only property
///
/// # Example
///
/// ```ignore
/// #[derive(Clone, Default, Reflect)]
/// #[reflect(with = Person::register_methods)]
/// struct Person {
///     name: String,
///     #[reflect(rename = "years")]
///     age: i32,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    reflect::expand_derive(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
