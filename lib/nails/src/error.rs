use std::any::Any;
use std::fmt;

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::Body;

pub trait ServiceError: std::error::Error + Any + Send + Sync {
    fn status(&self) -> StatusCode;
    fn class_name(&self) -> &str;
    fn has_public_message(&self) -> bool {
        false
    }
    fn fmt_public_message(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let _ = f;
        Ok(())
    }
}

pub trait ServiceErrorExt: ServiceError {
    fn public_message(&self) -> Option<PublicMessage<'_, Self>> {
        if self.has_public_message() {
            Some(PublicMessage(self))
        } else {
            None
        }
    }
}
impl<T: ServiceError + ?Sized> ServiceErrorExt for T {}

pub struct PublicMessage<'a, E: ServiceError + ?Sized>(&'a E);

impl<E: ServiceError + ?Sized> fmt::Display for PublicMessage<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt_public_message(f)
    }
}

#[derive(Debug)]
pub enum NailsError {
    ContentTypeError(ContentTypeError),
    JsonBodyError(JsonBodyError),
    BodyError(BodyError),
    QueryError(QueryError),
    PathError(PathError),
    HeaderError(HeaderError),
    MultipartError(MultipartError),
    RouteError(RouteError),
    AnyError(Box<dyn ServiceError>),
}

impl NailsError {
    pub fn from_service_error<E: ServiceError>(e: E) -> Self {
        NailsError::AnyError(Box::new(e))
    }

    fn inner(&self) -> &dyn ServiceError {
        use NailsError::*;
        match self {
            ContentTypeError(e) => e,
            JsonBodyError(e) => e,
            BodyError(e) => e,
            QueryError(e) => e,
            PathError(e) => e,
            HeaderError(e) => e,
            MultipartError(e) => e,
            RouteError(e) => e,
            AnyError(e) => &**e,
        }
    }

    /// Renders `{"error": "..."}` with the error's status.
    ///
    /// Errors without a public message fall back to the status reason so that
    /// internal details never reach the client.
    pub fn to_response(&self) -> Response<Body> {
        let message = self
            .public_message()
            .map(|m| m.to_string())
            .unwrap_or_else(|| {
                self.status()
                    .canonical_reason()
                    .unwrap_or("error")
                    .to_lowercase()
            });
        let body = serde_json::to_vec(&ErrorBody { error: message }).unwrap_or_default();
        let mut resp = Response::new(Body::from(body));
        *resp.status_mut() = self.status();
        resp.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        resp
    }
}

impl ServiceError for NailsError {
    fn status(&self) -> StatusCode {
        self.inner().status()
    }
    fn class_name(&self) -> &str {
        self.inner().class_name()
    }
    fn has_public_message(&self) -> bool {
        self.inner().has_public_message()
    }
    fn fmt_public_message(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.inner().fmt_public_message(f)
    }
}

impl std::error::Error for NailsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner().source()
    }
}

impl fmt::Display for NailsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self.inner(), f)
    }
}

macro_rules! nails_error_from {
    ($($variant:ident)*) => {
        $(
            impl From<$variant> for NailsError {
                fn from(e: $variant) -> Self {
                    NailsError::$variant(e)
                }
            }
        )*
    };
}
nails_error_from!(
    ContentTypeError JsonBodyError BodyError QueryError PathError HeaderError MultipartError RouteError
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

macro_rules! public_display {
    () => {
        fn has_public_message(&self) -> bool {
            true
        }
        fn fmt_public_message(&self, f: &mut fmt::Formatter) -> fmt::Result {
            fmt::Display::fmt(self, f)
        }
    };
}

#[derive(Debug)]
pub struct ContentTypeError {
    pub expected: Vec<String>,
    pub got: Option<String>,
}

impl ServiceError for ContentTypeError {
    fn status(&self) -> StatusCode {
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    }
    fn class_name(&self) -> &str {
        "nails::error::ContentTypeError"
    }
    public_display!();
}

impl fmt::Display for ContentTypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Self { expected, got } = self;
        write!(f, "Invalid Content-Type: expected ")?;
        match expected.as_slice() {
            [] => write!(f, "nothing")?,
            [only] => write!(f, "{:?}", only)?,
            [init @ .., second_last, last] => {
                for ct in init {
                    write!(f, "{:?}, ", ct)?;
                }
                write!(f, "{:?} or {:?}", second_last, last)?;
            }
        }
        match got {
            Some(got) => write!(f, ", got {:?}", got),
            None => write!(f, ", got nothing"),
        }
    }
}

impl std::error::Error for ContentTypeError {}

#[derive(Debug)]
pub struct JsonBodyError(pub serde_json::Error);

impl ServiceError for JsonBodyError {
    fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
    fn class_name(&self) -> &str {
        "nails::error::JsonBodyError"
    }
    public_display!();
}

impl fmt::Display for JsonBodyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error in JSON Body: {}", self.0)
    }
}

impl std::error::Error for JsonBodyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

#[derive(Debug)]
pub struct BodyError(pub Box<dyn std::error::Error + Send + Sync>);

impl BodyError {
    /// Whether the body went over the service's size limit.
    pub fn is_too_large(&self) -> bool {
        self.0.is::<http_body_util::LengthLimitError>()
    }
}

impl ServiceError for BodyError {
    fn status(&self) -> StatusCode {
        if self.is_too_large() {
            StatusCode::PAYLOAD_TOO_LARGE
        } else {
            StatusCode::BAD_REQUEST
        }
    }
    fn class_name(&self) -> &str {
        "nails::error::BodyError"
    }
    public_display!();
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_too_large() {
            write!(f, "Request body too large")
        } else {
            write!(f, "Error reading request body: {}", self.0)
        }
    }
}

impl std::error::Error for BodyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.0)
    }
}

#[derive(Debug)]
pub struct QueryError {
    pub field: Option<String>,
    pub kind: QueryErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum QueryErrorKind {
    MultipleQuery,
    NoQuery,
    ParseIntError(std::num::ParseIntError),
    ParseBoolError(std::str::ParseBoolError),
}

impl QueryError {
    pub fn new(kind: QueryErrorKind) -> Self {
        Self { field: None, kind }
    }

    pub fn in_field(self, field: &str) -> Self {
        Self {
            field: Some(field.to_owned()),
            ..self
        }
    }
}

impl PartialEq for QueryError {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.kind == other.kind
    }
}

impl ServiceError for QueryError {
    fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
    fn class_name(&self) -> &str {
        "nails::error::QueryError"
    }
    public_display!();
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use QueryErrorKind::*;
        if let Some(field) = &self.field {
            write!(f, "invalid query parameter `{}`: ", field)?;
        }
        match &self.kind {
            MultipleQuery => write!(f, "multiple query values found"),
            NoQuery => write!(f, "no query value found"),
            ParseIntError(e) => write!(f, "{}", e),
            ParseBoolError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<std::num::ParseIntError> for QueryError {
    fn from(e: std::num::ParseIntError) -> Self {
        QueryError::new(QueryErrorKind::ParseIntError(e))
    }
}

impl From<std::str::ParseBoolError> for QueryError {
    fn from(e: std::str::ParseBoolError) -> Self {
        QueryError::new(QueryErrorKind::ParseBoolError(e))
    }
}

#[derive(Debug)]
pub struct PathError {
    pub name: String,
}

impl PathError {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }
}

impl ServiceError for PathError {
    fn status(&self) -> StatusCode {
        StatusCode::NOT_FOUND
    }
    fn class_name(&self) -> &str {
        "nails::error::PathError"
    }
    public_display!();
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid path parameter `{}`", self.name)
    }
}

impl std::error::Error for PathError {}

#[derive(Debug)]
pub struct HeaderError {
    pub name: String,
    pub message: String,
}

impl ServiceError for HeaderError {
    fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
    fn class_name(&self) -> &str {
        "nails::error::HeaderError"
    }
    public_display!();
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid header `{}`: {}", self.name, self.message)
    }
}

impl std::error::Error for HeaderError {}

#[derive(Debug)]
pub struct MultipartError(pub multer::Error);

impl ServiceError for MultipartError {
    fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
    fn class_name(&self) -> &str {
        "nails::error::MultipartError"
    }
    public_display!();
}

impl fmt::Display for MultipartError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error in multipart body: {}", self.0)
    }
}

impl std::error::Error for MultipartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

#[derive(Debug)]
pub enum RouteError {
    NotFound,
    Ambiguous(usize),
}

impl ServiceError for RouteError {
    fn status(&self) -> StatusCode {
        match self {
            RouteError::NotFound => StatusCode::NOT_FOUND,
            RouteError::Ambiguous(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
    fn class_name(&self) -> &str {
        "nails::error::RouteError"
    }
    fn has_public_message(&self) -> bool {
        matches!(self, RouteError::NotFound)
    }
    fn fmt_public_message(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RouteError::NotFound => write!(f, "not found"),
            RouteError::Ambiguous(n) => write!(f, "{} routes matched the request", n),
        }
    }
}

impl std::error::Error for RouteError {}
