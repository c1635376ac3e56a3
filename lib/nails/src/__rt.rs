use futures::prelude::*;

pub use crate::request::{
    parse_query, path_component, FromBody, FromHeader, FromPath, FromQuery, Preroute,
};
pub use bytes::Bytes;
pub use futures::future::BoxFuture;
pub use hyper::{Method, Request};

pub fn box_future<'a, T: Future + Send + 'a>(x: T) -> BoxFuture<'a, T::Output> {
    x.boxed()
}
