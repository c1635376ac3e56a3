extern crate proc_macro;

use std::collections::HashMap;

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use synstructure::decl_derive;

use crate::attrs::{FieldAttrs, FieldKind, StructAttrs};
use crate::path::PathPattern;
use crate::utils::construct;

#[cfg(test)]
#[macro_use]
mod test_utils;

mod attrs;
mod path;
mod utils;

decl_derive!([Preroute, attributes(nails)] => preroute_derive);

fn preroute_derive(s: synstructure::Structure) -> TokenStream {
    derive_preroute(&s).unwrap_or_else(|e| e.to_compile_error())
}

fn derive_preroute(s: &synstructure::Structure) -> syn::Result<TokenStream> {
    let ast = s.ast();
    let fields = match &ast.data {
        syn::Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                &ast.ident,
                "#[derive(Preroute)] is only available for structs",
            ))
        }
    };

    let attrs = StructAttrs::parse(&ast.attrs)?;
    let path_lit = attrs
        .path
        .ok_or_else(|| syn::Error::new_spanned(&ast.ident, "#[nails(path = \"\")] is needed"))?
        .path;
    let pattern = path_lit
        .value()
        .parse::<PathPattern>()
        .map_err(|e| syn::Error::new(path_lit.span(), e.to_string()))?;
    let path_prefix = pattern.path_prefix();
    let method_condition = gen_method_condition(attrs.method.map(|m| m.method.value()));

    let mut var_types = HashMap::new();
    let mut bindings = Vec::new();
    let mut body_binding = None;
    let mut uses_query = false;
    let mut values = Vec::new();
    for (idx, field) in fields.iter().enumerate() {
        let local = format_ident!("__nails_field_{}", idx);
        let ty = &field.ty;
        let field_attrs = FieldAttrs::parse(&field.attrs)?;
        let field_name = |explicit: Option<syn::LitStr>| -> syn::Result<String> {
            match (explicit, &field.ident) {
                (Some(lit), _) => Ok(lit.value()),
                (None, Some(ident)) => Ok(ident.to_string()),
                (None, None) => Err(syn::Error::new_spanned(
                    ty,
                    "Specify name for this field",
                )),
            }
        };
        let kind = match field_attrs.kind {
            Some(kind) => kind,
            None if field.ident.is_some() => FieldKind::Query(None, Span::call_site()),
            None => {
                return Err(syn::Error::new_spanned(
                    ty,
                    "positional fields need #[nails(query)], #[nails(path)], #[nails(header)] or #[nails(body)]",
                ))
            }
        };
        match kind {
            FieldKind::Query(name, _) => {
                let name = field_name(name)?;
                uses_query = true;
                bindings.push(quote! {
                    let #local: #ty = <#ty as nails::__rt::FromQuery>::from_query(
                        query_hash.get(#name).map(|values| values.as_slice()).unwrap_or(&[])
                    ).map_err(|e| e.in_field(#name))?;
                });
            }
            FieldKind::Path(name, span) => {
                let name = field_name(name)?;
                let index = pattern.var_index(&name).ok_or_else(|| {
                    syn::Error::new(span, format_args!("unknown path variable `{}`", name))
                })?;
                if var_types.insert(name.clone(), ty.clone()).is_some() {
                    return Err(syn::Error::new(
                        span,
                        format_args!("path variable `{}` is bound twice", name),
                    ));
                }
                bindings.push(quote! {
                    let #local: #ty = nails::__rt::path_component(req.uri().path(), #index)
                        .and_then(|comp| <#ty as nails::__rt::FromPath>::from_path(comp).ok())
                        .ok_or_else(|| nails::error::PathError::new(#name))?;
                });
            }
            FieldKind::Header(name) => {
                bindings.push(quote! {
                    let #local: #ty = <#ty as nails::__rt::FromHeader>::from_header(
                        #name,
                        req.headers().get(#name),
                    )?;
                });
            }
            FieldKind::Body(span) => {
                if body_binding.is_some() {
                    return Err(syn::Error::new(span, "multiple #[nails(body)] fields"));
                }
                body_binding = Some(quote! {
                    let #local: #ty = <#ty as nails::__rt::FromBody>::from_body(req).await?;
                });
            }
        }
        values.push(quote! { #local });
    }
    let query_binding = if uses_query {
        quote! {
            let query_hash = nails::__rt::parse_query(req.uri().query().unwrap_or(""));
        }
    } else {
        quote! {}
    };
    let path_condition = pattern.gen_path_condition(quote! { path }, &var_types);
    let construct = construct(fields, &ast.ident, &values);

    Ok(s.gen_impl(quote! {
        gen impl nails::Preroute for @Self {
            fn path_prefix_hint() -> &'static str {
                #path_prefix
            }

            fn match_path(method: &nails::__rt::Method, path: &str) -> bool {
                #method_condition && #path_condition
            }

            #[allow(unused_variables)]
            fn from_request(
                req: nails::__rt::Request<nails::__rt::Bytes>,
            ) -> nails::__rt::BoxFuture<'static, Result<Self, nails::error::NailsError>> {
                nails::__rt::box_future(async move {
                    #query_binding
                    #(#bindings)*
                    #body_binding
                    Ok::<Self, nails::error::NailsError>(#construct)
                })
            }
        }
    }))
}

fn gen_method_condition(method: Option<String>) -> TokenStream {
    match method.as_deref() {
        None | Some("GET") => quote! {
            (*method == nails::__rt::Method::GET || *method == nails::__rt::Method::HEAD)
        },
        Some(method) => {
            let method = format_ident!("{}", method);
            quote! { (*method == nails::__rt::Method::#method) }
        }
    }
}
