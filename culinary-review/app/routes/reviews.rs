use hyper::{Response, StatusCode};
use nails::error::NailsError;
use nails::request::{Deferred, JsonBody};
use nails::{Body, Preroute};
use serde::Deserialize;

use crate::context::AppCtx;
use crate::tokens::{authenticate, BearerToken};

#[derive(Debug, Preroute)]
#[nails(path = "/api/reviews")]
pub(crate) struct ListReviewsRequest {}

pub(crate) async fn list_reviews(
    ctx: AppCtx,
    _req: ListReviewsRequest,
) -> Result<Response<Body>, NailsError> {
    let reviews = ctx.reviews.get_all_reviews().await?;
    super::json_response(StatusCode::OK, &reviews)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/reviews/{id}")]
pub(crate) struct GetReviewRequest {
    #[nails(path)]
    id: i64,
}

pub(crate) async fn get_review(ctx: AppCtx, req: GetReviewRequest) -> Result<Response<Body>, NailsError> {
    let review = ctx.reviews.get_review_by_id(req.id).await?;
    super::json_response(StatusCode::OK, &review)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/reviews", method = "POST")]
pub(crate) struct CreateReviewRequest {
    #[nails(header = "authorization")]
    token: BearerToken,
    #[nails(body)]
    body: Deferred<JsonBody<CreateReviewRequestBody>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateReviewRequestBody {
    recipe_id: i64,
    content: String,
}

pub(crate) async fn create_review(
    ctx: AppCtx,
    req: CreateReviewRequest,
) -> Result<Response<Body>, NailsError> {
    let auth = authenticate(&ctx, &req.token)?;
    let CreateReviewRequestBody { recipe_id, content } = req.body.extract().await?.0;
    let review = ctx
        .reviews
        .create_review(auth.id, recipe_id, content)
        .await?;
    super::json_response(StatusCode::CREATED, &review)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/reviews/{id}", method = "PUT")]
pub(crate) struct UpdateReviewRequest {
    #[nails(path)]
    id: i64,
    #[nails(header = "authorization")]
    token: BearerToken,
    #[nails(body)]
    body: Deferred<JsonBody<UpdateReviewRequestBody>>,
}

/// A review keeps its recipe; a `recipe_id` in the body is ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct UpdateReviewRequestBody {
    content: String,
}

pub(crate) async fn update_review(
    ctx: AppCtx,
    req: UpdateReviewRequest,
) -> Result<Response<Body>, NailsError> {
    let auth = authenticate(&ctx, &req.token)?;
    let review = ctx
        .reviews
        .update_review_by_id(auth.id, req.id, req.body.extract().await?.0.content)
        .await?;
    super::json_response(StatusCode::OK, &review)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/reviews/{id}", method = "DELETE")]
pub(crate) struct DeleteReviewRequest {
    #[nails(path)]
    id: i64,
    #[nails(header = "authorization")]
    token: BearerToken,
}

pub(crate) async fn delete_review(
    ctx: AppCtx,
    req: DeleteReviewRequest,
) -> Result<Response<Body>, NailsError> {
    let auth = authenticate(&ctx, &req.token)?;
    ctx.reviews.delete_review_by_id(auth.id, req.id).await?;
    super::message_response("review deleted")
}
