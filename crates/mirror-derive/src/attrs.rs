// #[reflect(...)] attribute parsing

use syn::{Attribute, LitStr, Path, Result};

/// Attributes on the struct itself
#[derive(Default)]
pub struct ContainerAttrs {
    pub name: Option<LitStr>,
    pub with: Vec<Path>,
}

/// Attributes on one field
#[derive(Default)]
pub struct FieldAttrs {
    pub skip: bool,
    pub readonly: bool,
    pub rename: Option<LitStr>,
}

fn reflect_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|a| a.path().is_ident("reflect"))
}

pub fn parse_container(attrs: &[Attribute]) -> Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in reflect_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                out.name = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("with") {
                out.with.push(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `name = \"...\"` or `with = path`"))
            }
        })?;
    }
    Ok(out)
}

pub fn parse_field(attrs: &[Attribute]) -> Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in reflect_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                out.skip = true;
                Ok(())
            } else if meta.path.is_ident("readonly") {
                out.readonly = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                out.rename = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `skip`, `readonly` or `rename = \"...\"`"))
            }
        })?;
    }
    Ok(out)
}
