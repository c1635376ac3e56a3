//! A small routing layer over hyper: request types derive `Preroute`, handlers
//! are plain async functions, and every error renders as a JSON body.

extern crate self as nails;

pub use request::Preroute;
pub use routing::{Routable, Router};
pub use service::Service;

/// Response body type used by every handler.
pub type Body = http_body_util::Full<bytes::Bytes>;

#[doc(hidden)]
pub mod __rt;
pub mod error;
pub mod multipart;
pub mod request;
pub mod routing;
pub mod service;
pub mod utils;
