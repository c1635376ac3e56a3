use proc_macro2::TokenStream;
use quote::quote;
use syn::{Fields, Ident};

/// Builds `Name { a: v0, b: v1 }`, `Name(v0, v1)` or `Name` from per-field values.
pub(crate) fn construct(fields: &Fields, ident: &Ident, values: &[TokenStream]) -> TokenStream {
    match fields {
        Fields::Unit => quote! { #ident },
        Fields::Unnamed(_) => quote! { #ident(#(#values,)*) },
        Fields::Named(named) => {
            let names = named.named.iter().map(|field| &field.ident);
            quote! { #ident { #(#names: #values,)* } }
        }
    }
}
