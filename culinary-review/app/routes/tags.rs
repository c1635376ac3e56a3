use hyper::{Response, StatusCode};
use nails::error::NailsError;
use nails::request::{Deferred, JsonBody};
use nails::{Body, Preroute};
use serde::Deserialize;

use crate::context::AppCtx;
use crate::tokens::{authenticate, BearerToken};

#[derive(Debug, Deserialize)]
pub(crate) struct TagRequestBody {
    name: String,
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/tags")]
pub(crate) struct ListTagsRequest {}

pub(crate) async fn list_tags(ctx: AppCtx, _req: ListTagsRequest) -> Result<Response<Body>, NailsError> {
    let tags = ctx.tags.get_all_tags().await?;
    super::json_response(StatusCode::OK, &tags)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/tags", method = "POST")]
pub(crate) struct CreateTagRequest {
    #[nails(header = "authorization")]
    token: BearerToken,
    #[nails(body)]
    body: Deferred<JsonBody<TagRequestBody>>,
}

pub(crate) async fn create_tag(ctx: AppCtx, req: CreateTagRequest) -> Result<Response<Body>, NailsError> {
    authenticate(&ctx, &req.token)?;
    let tag = ctx.tags.create_tag(req.body.extract().await?.0.name).await?;
    super::json_response(StatusCode::CREATED, &tag)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/tags/{id}", method = "PUT")]
pub(crate) struct UpdateTagRequest {
    #[nails(path)]
    id: i64,
    #[nails(header = "authorization")]
    token: BearerToken,
    #[nails(body)]
    body: Deferred<JsonBody<TagRequestBody>>,
}

pub(crate) async fn update_tag(ctx: AppCtx, req: UpdateTagRequest) -> Result<Response<Body>, NailsError> {
    authenticate(&ctx, &req.token)?;
    let tag = ctx.tags.update_tag(req.id, req.body.extract().await?.0.name).await?;
    super::json_response(StatusCode::OK, &tag)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/tags/{id}", method = "DELETE")]
pub(crate) struct DeleteTagRequest {
    #[nails(path)]
    id: i64,
    #[nails(header = "authorization")]
    token: BearerToken,
}

pub(crate) async fn delete_tag(ctx: AppCtx, req: DeleteTagRequest) -> Result<Response<Body>, NailsError> {
    authenticate(&ctx, &req.token)?;
    ctx.tags.delete_tag(req.id).await?;
    super::message_response("tag deleted")
}
