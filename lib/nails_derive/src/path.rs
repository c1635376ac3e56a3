use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use proc_macro2::TokenStream;
use quote::quote;
use syn::Type;

#[derive(Debug, Clone)]
pub(crate) struct PathPattern {
    components: Vec<ComponentMatcher>,
}

impl PathPattern {
    pub(crate) fn path_prefix(&self) -> String {
        let mut prefix = String::from("");
        for comp in &self.components {
            match comp {
                ComponentMatcher::String(s) => {
                    prefix.push('/');
                    prefix.push_str(s);
                }
                ComponentMatcher::Var(_) => {
                    prefix.push('/');
                    return prefix;
                }
            }
        }
        prefix
    }

    /// Position of a variable among the slash-separated components.
    pub(crate) fn var_index(&self, name: &str) -> Option<usize> {
        self.components
            .iter()
            .position(|comp| matches!(comp, ComponentMatcher::Var(v) if v == name))
    }

    pub(crate) fn var_names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().filter_map(|comp| match comp {
            ComponentMatcher::Var(v) => Some(v.as_str()),
            ComponentMatcher::String(_) => None,
        })
    }

    /// Generates a boolean expression matching `path` against the pattern.
    ///
    /// Variables bound to a field only match components the field type accepts,
    /// so `/recipes/{id}` with `id: i64` does not match `/recipes/abc`.
    pub(crate) fn gen_path_condition(
        &self,
        path: TokenStream,
        var_types: &HashMap<String, Type>,
    ) -> TokenStream {
        let conditions = self
            .components
            .iter()
            .map(|comp| match comp {
                ComponentMatcher::String(s) => {
                    quote! {
                        path_iter.next().map(|comp| comp == #s).unwrap_or(false) &&
                    }
                }
                ComponentMatcher::Var(v) => match var_types.get(v) {
                    Some(ty) => quote! {
                        path_iter.next().map(|comp| {
                            <#ty as nails::__rt::FromPath>::matches(comp)
                        }).unwrap_or(false) &&
                    },
                    None => quote! {
                        path_iter.next().is_some() &&
                    },
                },
            })
            .collect::<TokenStream>();
        quote! {(
            #path.starts_with("/") && {
                let mut path_iter = #path[1..].split("/");
                #conditions
                path_iter.next().is_none()
            }
        )}
    }
}

impl FromStr for PathPattern {
    type Err = ParseError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        if !path.starts_with('/') {
            return Err(ParseError::new(path, "must start with slash"));
        }
        let components = path[1..]
            .split('/')
            .map(|c| -> Result<_, Self::Err> {
                if c.contains('{') || c.contains('}') {
                    if !c.starts_with('{') || !c.ends_with('}') {
                        return Err(ParseError::new(
                            path,
                            "variable must span the whole path component",
                        ));
                    }
                    let c = &c[1..c.len() - 1];
                    if c.contains('{') || c.contains('}') {
                        return Err(ParseError::new(
                            path,
                            "variable must span the whole path component",
                        ));
                    }
                    if c.is_empty() {
                        return Err(ParseError::new(path, "variable must contain variable name"));
                    }
                    if !is_ident(c) {
                        return Err(ParseError::new(
                            path,
                            "variable must be /[a-zA-Z_][a-zA-Z0-9_]*/",
                        ));
                    }
                    Ok(ComponentMatcher::Var(c.to_owned()))
                } else {
                    Ok(ComponentMatcher::String(c.to_owned()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut seen = Vec::new();
        for comp in &components {
            if let ComponentMatcher::Var(v) = comp {
                if seen.contains(&v) {
                    return Err(ParseError::new(path, "duplicate variable name"));
                }
                seen.push(v);
            }
        }
        Ok(Self { components })
    }
}

#[derive(Debug, Clone)]
enum ComponentMatcher {
    String(String),
    Var(String),
}

#[derive(Debug, Clone)]
pub(crate) struct ParseError {
    path: String,
    message: String,
}

impl ParseError {
    fn new(path: &str, message: &str) -> Self {
        Self {
            path: path.to_owned(),
            message: message.to_owned(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "error while parsing path matcher `{}`: {}",
            self.path, self.message
        )
    }
}

fn is_ident(s: &str) -> bool {
    let s = s.as_bytes();
    !s.is_empty()
        && s != b"_"
        && (s[0].is_ascii_alphabetic() || s[0] == b'_')
        && s.iter().all(|&c| c.is_ascii_alphanumeric() || c == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_prefix() {
        let pat = "/api/recipes/{id}".parse::<PathPattern>().unwrap();
        assert_eq!(pat.path_prefix(), "/api/recipes/");
        let pat = "/api/profile/me".parse::<PathPattern>().unwrap();
        assert_eq!(pat.path_prefix(), "/api/profile/me");
    }

    #[test]
    fn test_var_index() {
        let pat = "/api/recipes/{id}".parse::<PathPattern>().unwrap();
        assert_eq!(pat.var_index("id"), Some(2));
        assert_eq!(pat.var_index("api"), None);
        assert_eq!(pat.var_names().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn test_parse_errors() {
        let err = |s: &str| s.parse::<PathPattern>().unwrap_err().message;
        assert_eq!(err("api"), "must start with slash");
        assert_eq!(
            err("/api/x{id}"),
            "variable must span the whole path component"
        );
        assert_eq!(err("/api/{}"), "variable must contain variable name");
        assert_eq!(err("/api/{1d}"), "variable must be /[a-zA-Z_][a-zA-Z0-9_]*/");
        assert_eq!(err("/api/{id}/{id}"), "duplicate variable name");
    }

    #[test]
    fn test_path_condition_untyped() {
        let pat = "/api/tags/{id}".parse::<PathPattern>().unwrap();
        assert_ts_eq!(
            pat.gen_path_condition(quote! { path }, &HashMap::new()),
            quote! {(
                path.starts_with("/") && {
                    let mut path_iter = path[1..].split("/");
                    path_iter.next().map(|comp| comp == "api").unwrap_or(false) &&
                    path_iter.next().map(|comp| comp == "tags").unwrap_or(false) &&
                    path_iter.next().is_some() &&
                    path_iter.next().is_none()
                }
            )},
        );
    }

    #[test]
    fn test_path_condition_typed() {
        let pat = "/recipes/{id}".parse::<PathPattern>().unwrap();
        let mut types: HashMap<String, Type> = HashMap::new();
        types.insert("id".to_owned(), syn::parse_quote!(i64));
        assert_ts_eq!(
            pat.gen_path_condition(quote! { path }, &types),
            quote! {(
                path.starts_with("/") && {
                    let mut path_iter = path[1..].split("/");
                    path_iter.next().map(|comp| comp == "recipes").unwrap_or(false) &&
                    path_iter.next().map(|comp| {
                        <i64 as nails::__rt::FromPath>::matches(comp)
                    }).unwrap_or(false) &&
                    path_iter.next().is_none()
                }
            )},
        );
    }
}
