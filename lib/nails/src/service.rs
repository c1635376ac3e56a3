use futures::prelude::*;

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use contextful::Context;
use futures::future::BoxFuture;
use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN};
use hyper::{Request, Response};

use crate::error::{BodyError, NailsError, ServiceError};
use crate::request::Preroute;
use crate::routing::{Routable, Router};
use crate::Body;

#[derive(Debug)]
pub struct Service<Ctx>
where
    Ctx: Context + Send + Sync + 'static,
{
    inner: Arc<ServiceInner<Ctx>>,
    ctx: Ctx,
    max_body_size: usize,
}

/// Default cap on a buffered request body.
pub const DEFAULT_MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

impl<Ctx> Service<Ctx>
where
    Ctx: Context + Send + Sync + 'static,
{
    pub fn builder() -> Builder<Ctx> {
        Builder::new()
    }

    pub fn ctx(&self) -> &Ctx {
        &self.ctx
    }

    /// Bodies longer than `bytes` are answered with 413 before any route runs.
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Answers an already buffered request. Never fails: errors become JSON responses.
    pub async fn handle(&self, req: Request<Bytes>) -> Response<Body> {
        self.inner.respond(&self.ctx, req).await
    }
}

impl<Ctx> Clone for Service<Ctx>
where
    Ctx: Context + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            ctx: self.ctx.clone(),
            max_body_size: self.max_body_size,
        }
    }
}

impl<Ctx> hyper::service::Service<Request<Incoming>> for Service<Ctx>
where
    Ctx: Context + Send + Sync + 'static,
{
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let this = self.clone();
        async move {
            let (parts, body) = req.into_parts();
            let resp = match read_body(body, this.max_body_size).await {
                Ok(body) => this.handle(Request::from_parts(parts, body)).await,
                Err(e) => this.inner.error_response(NailsError::from(e)),
            };
            Ok(resp)
        }
        .boxed()
    }
}

/// Buffers a body, failing once it grows past `limit` bytes.
pub async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, BodyError>
where
    B: hyper::body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(body, limit)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(BodyError)
}

#[derive(Debug)]
pub struct Builder<Ctx>
where
    Ctx: Context + Send + Sync + 'static,
{
    router: Router<Ctx>,
}

impl<Ctx> Builder<Ctx>
where
    Ctx: Context + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Takes the routes registered so far; the builder is left empty.
    pub fn finish(&mut self, ctx: &Ctx) -> Service<Ctx> {
        let router = std::mem::take(&mut self.router);
        Service {
            inner: Arc::new(ServiceInner { router }),
            ctx: ctx.clone(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    pub fn add_route<R>(&mut self, route: R) -> &mut Self
    where
        R: Routable<Ctx = Ctx> + Send + Sync + 'static,
    {
        self.router.add_route(route);
        self
    }

    pub fn add_function_route<F, Fut, Req>(&mut self, route: F) -> &mut Self
    where
        F: Fn(Ctx, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Body>, NailsError>> + Send + 'static,
        Req: Preroute,
    {
        self.router.add_function_route(route);
        self
    }
}

impl<Ctx> Default for Builder<Ctx>
where
    Ctx: Context + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct ServiceInner<Ctx>
where
    Ctx: Context + Send + Sync + 'static,
{
    router: Router<Ctx>,
}

impl<Ctx> ServiceInner<Ctx>
where
    Ctx: Context + Send + Sync + 'static,
{
    async fn respond(&self, ctx: &Ctx, req: Request<Bytes>) -> Response<Body> {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        let resp = match self.router.respond(ctx, req).await {
            Ok(resp) => resp,
            Err(e) => self.error_response(e),
        };
        tracing::debug!(%method, %path, status = resp.status().as_u16(), "request handled");
        with_cors(resp)
    }

    fn error_response(&self, e: NailsError) -> Response<Body> {
        if e.status().is_server_error() {
            tracing::error!(error = %e, class = e.class_name(), "request failed");
        } else {
            tracing::debug!(error = %e, class = e.class_name(), "request rejected");
        }
        with_cors(e.to_response())
    }
}

// CORS hack: a permissive origin header on every response.
fn with_cors(mut resp: Response<Body>) -> Response<Body> {
    resp.headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    resp
}
