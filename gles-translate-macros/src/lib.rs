//! Derive macros for `gles-translate`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Adds `from_bytes` and `from_slice` constructors that decode a JSON document
/// into the annotated type, mapping failures to `crate::Error::JsonParse`.
///
/// Only usable inside `gles-translate`, since the expansion names `crate::Result`.
#[proc_macro_derive(FromBytes)]
pub fn derive_from_bytes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            pub fn from_bytes(bytes: ::bytes::Bytes) -> crate::Result<Self> {
                Self::from_slice(&bytes)
            }

            pub fn from_slice(slice: &[u8]) -> crate::Result<Self> {
                ::serde_json::from_slice(slice).map_err(crate::Error::JsonParse)
            }
        }
    };
    TokenStream::from(expanded)
}
