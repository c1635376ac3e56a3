use proc_macro2::Span;
use syn::meta::ParseNestedMeta;
use syn::spanned::Spanned;
use syn::{Attribute, Lit, LitStr, Meta, Token};

const METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StructAttrs {
    pub(crate) path: Option<PathInfo>,
    pub(crate) method: Option<MethodInfo>,
}

impl StructAttrs {
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut ret = Self {
            path: None,
            method: None,
        };
        for attr in nails_attrs(attrs)? {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("path") {
                    ret.parse_path(&meta)
                } else if meta.path.is_ident("method") {
                    ret.parse_method(&meta)
                } else {
                    Err(unknown_option(&meta))
                }
            })?;
        }
        Ok(ret)
    }

    fn parse_path(&mut self, meta: &ParseNestedMeta) -> syn::Result<()> {
        let lit = string_value(meta, "string value expected in #[nails(path)]")?;
        if self.path.is_some() {
            return Err(syn::Error::new(
                lit.span(),
                "multiple #[nails(path)] definitions",
            ));
        }
        self.path = Some(PathInfo { path: lit });
        Ok(())
    }

    fn parse_method(&mut self, meta: &ParseNestedMeta) -> syn::Result<()> {
        let lit = string_value(meta, "string value expected in #[nails(method)]")?;
        if self.method.is_some() {
            return Err(syn::Error::new(
                lit.span(),
                "multiple #[nails(method)] definitions",
            ));
        }
        if !METHODS.contains(&lit.value().as_str()) {
            return Err(syn::Error::new(
                lit.span(),
                format_args!("unknown method: `{}`", lit.value()),
            ));
        }
        self.method = Some(MethodInfo { method: lit });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PathInfo {
    pub(crate) path: LitStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MethodInfo {
    pub(crate) method: LitStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldAttrs {
    pub(crate) kind: Option<FieldKind>,
}

/// Where a field is extracted from.
#[derive(Debug, Clone)]
pub(crate) enum FieldKind {
    Query(Option<LitStr>, Span),
    Path(Option<LitStr>, Span),
    Header(LitStr),
    Body(Span),
}

impl FieldKind {
    pub(crate) fn span(&self) -> Span {
        match self {
            FieldKind::Query(_, span) | FieldKind::Path(_, span) | FieldKind::Body(span) => *span,
            FieldKind::Header(lit) => lit.span(),
        }
    }
}

impl PartialEq for FieldKind {
    fn eq(&self, other: &Self) -> bool {
        use FieldKind::*;
        match (self, other) {
            (Query(a, _), Query(b, _)) | (Path(a, _), Path(b, _)) => a == b,
            (Header(a), Header(b)) => a == b,
            (Body(_), Body(_)) => true,
            _ => false,
        }
    }
}
impl Eq for FieldKind {}

impl FieldAttrs {
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut ret = Self { kind: None };
        for attr in nails_attrs(attrs)? {
            attr.parse_nested_meta(|meta| {
                let kind = if meta.path.is_ident("query") {
                    FieldKind::Query(optional_string_value(&meta, "query")?, meta.path.span())
                } else if meta.path.is_ident("path") {
                    FieldKind::Path(optional_string_value(&meta, "path")?, meta.path.span())
                } else if meta.path.is_ident("header") {
                    FieldKind::Header(string_value(
                        &meta,
                        "header name expected in #[nails(header = \"...\")]",
                    )?)
                } else if meta.path.is_ident("body") {
                    if meta.input.peek(Token![=]) {
                        return Err(meta.error("no value expected in #[nails(body)]"));
                    }
                    FieldKind::Body(meta.path.span())
                } else {
                    return Err(unknown_option(&meta));
                };
                if ret.kind.is_some() {
                    return Err(syn::Error::new(
                        kind.span(),
                        "multiple extraction kinds for one field",
                    ));
                }
                ret.kind = Some(kind);
                Ok(())
            })?;
        }
        Ok(ret)
    }
}

fn nails_attrs(attrs: &[Attribute]) -> syn::Result<Vec<&Attribute>> {
    let mut ret = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("nails") {
            continue;
        }
        match &attr.meta {
            Meta::List(_) => ret.push(attr),
            meta => {
                return Err(syn::Error::new(
                    meta.span(),
                    "#[nails] must have an argument list",
                ));
            }
        }
    }
    Ok(ret)
}

fn unknown_option(meta: &ParseNestedMeta) -> syn::Error {
    let name = meta
        .path
        .get_ident()
        .map(|ident| ident.to_string())
        .unwrap_or_default();
    meta.error(format_args!("unknown option: `{}`", name))
}

fn string_value(meta: &ParseNestedMeta, message: &str) -> syn::Result<LitStr> {
    if !meta.input.peek(Token![=]) {
        return Err(meta.error(message));
    }
    match meta.value()?.parse::<Lit>()? {
        Lit::Str(lit) => Ok(lit),
        lit => Err(syn::Error::new(lit.span(), message)),
    }
}

fn optional_string_value(meta: &ParseNestedMeta, name: &str) -> syn::Result<Option<LitStr>> {
    if !meta.input.peek(Token![=]) {
        return Ok(None);
    }
    let message = format!("string value or no value expected in #[nails({})]", name);
    string_value(meta, &message).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    use syn::parse_quote;

    fn field_attrs(field: syn::Field) -> syn::Result<FieldAttrs> {
        FieldAttrs::parse(&field.attrs)
    }

    #[test]
    fn test_struct_attrs() {
        let attrs: Vec<Attribute> = vec![parse_quote! {
            #[nails(path = "/api/recipes/{id}", method = "PUT")]
        }];
        let parsed = StructAttrs::parse(&attrs).unwrap();
        assert_eq!(parsed.path.unwrap().path.value(), "/api/recipes/{id}");
        assert_eq!(parsed.method.unwrap().method.value(), "PUT");
    }

    #[test]
    fn test_struct_attrs_errors() {
        let err = |attrs: Vec<Attribute>| StructAttrs::parse(&attrs).unwrap_err().to_string();
        assert_eq!(
            err(vec![
                parse_quote!(#[nails(path = "/a")]),
                parse_quote!(#[nails(path = "/b")]),
            ]),
            "multiple #[nails(path)] definitions",
        );
        assert_eq!(
            err(vec![parse_quote!(#[nails(path = 1)])]),
            "string value expected in #[nails(path)]",
        );
        assert_eq!(
            err(vec![parse_quote!(#[nails(method = "FETCH")])]),
            "unknown method: `FETCH`",
        );
        assert_eq!(
            err(vec![parse_quote!(#[nails(route = "/")])]),
            "unknown option: `route`",
        );
        assert_eq!(
            err(vec![parse_quote!(#[nails])]),
            "#[nails] must have an argument list",
        );
    }

    #[test]
    fn test_field_attrs() {
        let parsed = field_attrs(parse_quote!(#[nails(query)] id: Option<i64>)).unwrap();
        assert!(matches!(parsed.kind, Some(FieldKind::Query(None, _))));

        let parsed = field_attrs(parse_quote!(#[nails(path = "id")] recipe_id: i64)).unwrap();
        match parsed.kind {
            Some(FieldKind::Path(Some(lit), _)) => assert_eq!(lit.value(), "id"),
            kind => panic!("unexpected kind: {:?}", kind),
        }

        let parsed =
            field_attrs(parse_quote!(#[nails(header = "authorization")] token: String)).unwrap();
        match parsed.kind {
            Some(FieldKind::Header(lit)) => assert_eq!(lit.value(), "authorization"),
            kind => panic!("unexpected kind: {:?}", kind),
        }

        let parsed = field_attrs(parse_quote!(#[nails(body)] body: Vec<u8>)).unwrap();
        assert!(matches!(parsed.kind, Some(FieldKind::Body(_))));

        let parsed = field_attrs(parse_quote!(plain: String)).unwrap();
        assert_eq!(parsed.kind, None);
    }

    #[test]
    fn test_field_attrs_errors() {
        let err = |field: syn::Field| field_attrs(field).unwrap_err().to_string();
        assert_eq!(
            err(parse_quote!(#[nails(query, body)] x: String)),
            "multiple extraction kinds for one field",
        );
        assert_eq!(
            err(parse_quote!(#[nails(query = 1)] x: String)),
            "string value or no value expected in #[nails(query)]",
        );
        assert_eq!(
            err(parse_quote!(#[nails(header)] x: String)),
            "header name expected in #[nails(header = \"...\")]",
        );
        assert_eq!(
            err(parse_quote!(#[nails(cookie)] x: String)),
            "unknown option: `cookie`",
        );
    }
}
