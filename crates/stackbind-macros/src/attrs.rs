//! Attribute parsing for `#[stackbind(...)]`.

use syn::{Attribute, LitStr, Path};

/// Parsed `#[stackbind(...)]` attributes on a type.
#[derive(Debug, Default)]
pub struct ClassAttrs {
    /// Script-visible name (default: Rust type name)
    pub name: Option<String>,
    /// Skip the by-value `FromStack` impl
    pub no_clone: bool,
    /// Path to `stackbind_core` for crates that reach it through a re-export
    pub crate_path: Option<Path>,
}

impl ClassAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("stackbind") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    if value.value().is_empty() {
                        return Err(syn::Error::new(value.span(), "class name cannot be empty"));
                    }
                    result.name = Some(value.value());
                } else if meta.path.is_ident("no_clone") {
                    result.no_clone = true;
                } else if meta.path.is_ident("crate") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.crate_path = Some(value.parse()?);
                } else {
                    return Err(meta.error(format!(
                        "unknown stackbind attribute: {}",
                        meta.path
                            .get_ident()
                            .map(|i| i.to_string())
                            .unwrap_or_default()
                    )));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn parses_name_and_flags() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[stackbind(name = "Point", no_clone)])];
        let parsed = ClassAttrs::from_attrs(&attrs).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("Point"));
        assert!(parsed.no_clone);
    }

    #[test]
    fn ignores_foreign_attributes() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[derive(Clone)])];
        let parsed = ClassAttrs::from_attrs(&attrs).unwrap();
        assert!(parsed.name.is_none());
        assert!(!parsed.no_clone);
    }

    #[test]
    fn rejects_unknown_keys() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[stackbind(value)])];
        let err = ClassAttrs::from_attrs(&attrs).unwrap_err();
        assert!(err.to_string().contains("unknown stackbind attribute"));
    }

    #[test]
    fn parses_crate_path() {
        let attrs: Vec<Attribute> =
            vec![parse_quote!(#[stackbind(crate = "::stackbind::stackbind_core")])];
        let parsed = ClassAttrs::from_attrs(&attrs).unwrap();
        let path = parsed.crate_path.unwrap();
        assert!(path.leading_colon.is_some());
        assert_eq!(path.segments.len(), 2);
        assert_eq!(path.segments[1].ident, "stackbind_core");
    }

    #[test]
    fn rejects_malformed_crate_paths() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[stackbind(crate = "not a path")])];
        assert!(ClassAttrs::from_attrs(&attrs).is_err());
    }

    #[test]
    fn rejects_empty_names() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[stackbind(name = "")])];
        assert!(ClassAttrs::from_attrs(&attrs).is_err());
    }
}
