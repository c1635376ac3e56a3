use std::collections::HashMap;
use std::marker::PhantomData;
use std::slice;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Request};
use serde::de::DeserializeOwned;

use crate::error::{
    ContentTypeError, HeaderError, JsonBodyError, NailsError, QueryError, QueryErrorKind,
};

pub use nails_derive::Preroute;

/// A request type the router can match and extract by itself.
///
/// Usually derived with `#[derive(Preroute)]`.
pub trait Preroute: Sized + Send + 'static {
    fn path_prefix_hint() -> &'static str {
        ""
    }
    fn match_path(method: &Method, path: &str) -> bool;

    fn from_request(req: Request<Bytes>) -> BoxFuture<'static, Result<Self, NailsError>>;
}

pub trait FromPath: Sized {
    fn from_path(path_component: &str) -> Result<Self, ()>;

    fn matches(path_component: &str) -> bool {
        Self::from_path(path_component).is_ok()
    }
}

impl FromPath for String {
    fn from_path(path_component: &str) -> Result<Self, ()> {
        Ok(path_component.to_owned())
    }
    fn matches(_path_component: &str) -> bool {
        true
    }
}

macro_rules! from_path_int {
    ($($int:ty)*) => {
        $(
            impl FromPath for $int {
                fn from_path(path_component: &str) -> Result<Self, ()> {
                    path_component.parse::<$int>().map_err(|_| ())
                }
            }
        )*
    };
}
from_path_int!(u8 u16 u32 u64 i8 i16 i32 i64);

/// Returns the `index`-th component of an absolute path.
pub fn path_component(path: &str, index: usize) -> Option<&str> {
    path.strip_prefix('/')?.split('/').nth(index)
}

pub trait FromQuery: Sized {
    fn from_query(values: &[String]) -> Result<Self, QueryError>;
}

impl<T> FromQuery for Vec<T>
where
    T: FromQuery,
{
    fn from_query(values: &[String]) -> Result<Self, QueryError> {
        values
            .iter()
            .map(|x| T::from_query(slice::from_ref(x)))
            .collect()
    }
}

impl<T> FromQuery for Option<T>
where
    T: FromQuery,
{
    fn from_query(values: &[String]) -> Result<Self, QueryError> {
        if values.is_empty() {
            Ok(None)
        } else {
            Ok(Some(T::from_query(values)?))
        }
    }
}

fn single_value(values: &[String]) -> Result<&str, QueryError> {
    match values {
        [] => Err(QueryError::new(QueryErrorKind::NoQuery)),
        [value] => Ok(value),
        _ => Err(QueryError::new(QueryErrorKind::MultipleQuery)),
    }
}

impl FromQuery for String {
    fn from_query(values: &[String]) -> Result<Self, QueryError> {
        single_value(values).map(str::to_owned)
    }
}

impl FromQuery for bool {
    fn from_query(values: &[String]) -> Result<Self, QueryError> {
        Ok(single_value(values)?.parse()?)
    }
}

macro_rules! from_query_int {
    ($($int:ty)*) => {
        $(
            impl FromQuery for $int {
                fn from_query(values: &[String]) -> Result<Self, QueryError> {
                    Ok(single_value(values)?.parse()?)
                }
            }
        )*
    };
}
from_query_int!(u32 u64 i32 i64);

/// Decodes an `application/x-www-form-urlencoded` query string.
pub fn parse_query(query: &str) -> HashMap<String, Vec<String>> {
    let mut hash: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        hash.entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    hash
}

pub trait FromHeader: Sized {
    fn from_header(name: &str, value: Option<&HeaderValue>) -> Result<Self, NailsError>;
}

impl FromHeader for Option<String> {
    fn from_header(name: &str, value: Option<&HeaderValue>) -> Result<Self, NailsError> {
        value
            .map(|value| {
                value.to_str().map(str::to_owned).map_err(|_| HeaderError {
                    name: name.to_owned(),
                    message: "not a visible ASCII string".to_owned(),
                })
            })
            .transpose()
            .map_err(NailsError::from)
    }
}

impl FromHeader for String {
    fn from_header(name: &str, value: Option<&HeaderValue>) -> Result<Self, NailsError> {
        Option::<String>::from_header(name, value)?.ok_or_else(|| {
            NailsError::from(HeaderError {
                name: name.to_owned(),
                message: "missing".to_owned(),
            })
        })
    }
}

#[async_trait]
pub trait FromBody: Sized {
    async fn from_body(req: Request<Bytes>) -> Result<Self, NailsError>;
}

#[async_trait]
impl FromBody for Bytes {
    async fn from_body(req: Request<Bytes>) -> Result<Self, NailsError> {
        Ok(req.into_body())
    }
}

/// A body that is extracted only when the handler asks for it, so that
/// checks on headers (such as credentials) can run first.
#[derive(Debug)]
pub struct Deferred<T> {
    req: Request<Bytes>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Deferred<T>
where
    T: FromBody,
{
    pub async fn extract(self) -> Result<T, NailsError> {
        T::from_body(self.req).await
    }
}

#[async_trait]
impl<T> FromBody for Deferred<T>
where
    T: FromBody,
{
    async fn from_body(req: Request<Bytes>) -> Result<Self, NailsError> {
        Ok(Deferred {
            req,
            _marker: PhantomData,
        })
    }
}

pub(crate) fn content_type(req: &Request<Bytes>) -> Option<&str> {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

/// Media type without parameters, lowercased.
pub(crate) fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T> FromBody for JsonBody<T>
where
    T: DeserializeOwned + Send,
{
    async fn from_body(req: Request<Bytes>) -> Result<Self, NailsError> {
        let got = content_type(&req);
        if got.map(essence).as_deref() != Some("application/json") {
            return Err(ContentTypeError {
                expected: vec!["application/json".to_owned()],
                got: got.map(str::to_owned),
            }
            .into());
        }
        serde_json::from_slice(req.body())
            .map(JsonBody)
            .map_err(|e| JsonBodyError(e).into())
    }
}
