//! Implementation of `#[derive(NativeClass)]`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

use crate::attrs::ClassAttrs;

pub fn derive_native_class_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_inner(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_inner(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "NativeClass cannot be derived for generic types",
        ));
    }

    let name = &input.ident;
    let attrs = ClassAttrs::from_attrs(&input.attrs)?;
    let class_name = attrs.name.clone().unwrap_or_else(|| name.to_string());
    let core = match &attrs.crate_path {
        Some(path) => quote! { #path },
        None => quote! { ::stackbind_core },
    };

    let into_stack = quote! {
        impl #core::IntoStack for #name {
            fn into_stack(
                self,
                ctx: &mut #core::CallContext<'_>,
            ) -> ::std::result::Result<usize, #core::NativeError> {
                #core::convert::push_object::<#name>(ctx, self)
            }
        }
    };

    let from_stack = if attrs.no_clone {
        quote! {}
    } else {
        quote! {
            impl #core::FromStack for #name {
                const EXPECTED: #core::KindMask = #core::KindMask::ANY_BLOCK;

                fn from_stack(
                    ctx: &#core::CallContext<'_>,
                    position: usize,
                ) -> ::std::result::Result<Self, #core::ConversionError> {
                    #core::convert::read_object::<#name>(ctx, position)
                }
            }
        }
    };

    Ok(quote! {
        impl #core::NativeClass for #name {
            const NAME: &'static str = #class_name;
        }

        #into_stack
        #from_stack
    })
}
