// #[derive(Reflect)] implementation
//
// Generates the Describe and Reflect impls for a struct with named fields.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Result};

use crate::attrs::{parse_container, parse_field};

/// Expands #[derive(Reflect)].
///
/// Example expansion:
/// ```ignore
/// // Input:
/// #[derive(Reflect)]
/// #[reflect(with = Point::extra)]
/// struct Point { x: f64, y: f64 }
///
/// // Output:
/// impl ::mirror_core::Describe for Point {}
///
/// impl ::mirror_core::Reflect for Point {
///     const CLASS_NAME: &'static str = "Point";
///
///     fn register(reg: &mut ::mirror_core::Registrar<'_, Self>) {
///         reg.member("x", |this| &this.x, |this| &mut this.x);
///         reg.member("y", |this| &this.y, |this| &mut this.y);
///         Point::extra(reg);
///     }
/// }
/// ```
pub fn expand_derive(input: DeriveInput) -> Result<TokenStream> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[derive(Reflect)] does not support generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "#[derive(Reflect)] requires named fields",
                ))
            }
        },
        Data::Enum(_) | Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                ident,
                "#[derive(Reflect)] only supports structs",
            ))
        }
    };

    let container = parse_container(&input.attrs)?;
    let class_name = container
        .name
        .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));

    let mut registrations = Vec::new();
    for field in fields {
        let attrs = parse_field(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let member_name = attrs
            .rename
            .unwrap_or_else(|| LitStr::new(&field_ident.to_string(), field_ident.span()));

        registrations.push(if attrs.readonly {
            quote! {
                reg.readonly_property(#member_name, |this: &Self| ::std::clone::Clone::clone(&this.#field_ident));
            }
        } else {
            quote! {
                reg.member(#member_name, |this| &this.#field_ident, |this| &mut this.#field_ident);
            }
        });
    }

    let extra = container.with.iter().map(|path| {
        quote! { #path(reg); }
    });

    Ok(quote! {
        impl ::mirror_core::Describe for #ident {}

        impl ::mirror_core::Reflect for #ident {
            const CLASS_NAME: &'static str = #class_name;

            #[allow(unused_variables)]
            fn register(reg: &mut ::mirror_core::Registrar<'_, Self>) {
                #(#registrations)*
                #(#extra)*
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(input: DeriveInput) -> String {
        expand_derive(input).unwrap().to_string().replace(' ', "")
    }

    #[test]
    fn test_named_fields_become_members() {
        let out = expand(parse_quote! {
            struct Point {
                x: f64,
                y: f64,
            }
        });
        assert!(out.contains("constCLASS_NAME:&'staticstr=\"Point\""));
        assert!(out.contains("reg.member(\"x\""));
        assert!(out.contains("reg.member(\"y\""));
        assert!(out.contains("::mirror_core::DescribeforPoint"));
    }

    #[test]
    fn test_attributes() {
        let out = expand(parse_quote! {
            #[reflect(name = "Vec2", with = Vector::extra)]
            struct Vector {
                #[reflect(rename = "horizontal")]
                x: f64,
                #[reflect(skip)]
                cache: Option<f64>,
                #[reflect(readonly)]
                id: u32,
            }
        });
        assert!(out.contains("\"Vec2\""));
        assert!(out.contains("\"horizontal\""));
        assert!(!out.contains("cache"));
        assert!(out.contains("reg.readonly_property(\"id\""));
        assert!(out.contains("Vector::extra(reg);"));
    }

    #[test]
    fn test_unit_struct_has_no_members() {
        let out = expand(parse_quote! {
            struct Marker;
        });
        assert!(!out.contains("member"));
    }

    #[test]
    fn test_rejects_enums_and_tuples() {
        let err = expand_derive(parse_quote! {
            enum Shape { Circle, Square }
        })
        .unwrap_err();
        assert!(err.to_string().contains("only supports structs"));

        let err = expand_derive(parse_quote! {
            struct Pair(i32, i32);
        })
        .unwrap_err();
        assert!(err.to_string().contains("named fields"));
    }

    #[test]
    fn test_rejects_generics_and_unknown_attributes() {
        assert!(expand_derive(parse_quote! {
            struct Wrapper<T> { inner: T }
        })
        .is_err());

        let err = expand_derive(parse_quote! {
            struct Thing {
                #[reflect(hidden)]
                a: i32,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("expected `skip`"));
    }
}
