use hyper::{Response, StatusCode};
use nails::error::NailsError;
use nails::request::{Deferred, JsonBody};
use nails::{Body, Preroute};
use serde::Deserialize;

use crate::context::AppCtx;
use crate::tokens::{authenticate, BearerToken};

#[derive(Debug, Preroute)]
#[nails(path = "/api/favorite-recipe", method = "POST")]
pub(crate) struct CreateFavoriteRequest {
    #[nails(header = "authorization")]
    token: BearerToken,
    #[nails(body)]
    body: Deferred<JsonBody<CreateFavoriteRequestBody>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateFavoriteRequestBody {
    recipe_id: i64,
}

pub(crate) async fn create_favorite(
    ctx: AppCtx,
    req: CreateFavoriteRequest,
) -> Result<Response<Body>, NailsError> {
    let auth = authenticate(&ctx, &req.token)?;
    let favorite = ctx
        .favorites
        .create_favorite(auth.id, req.body.extract().await?.0.recipe_id)
        .await?;
    super::json_response(StatusCode::CREATED, &favorite)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/favorite-recipe")]
pub(crate) struct ListFavoritesRequest {
    #[nails(header = "authorization")]
    token: BearerToken,
}

pub(crate) async fn list_favorites(
    ctx: AppCtx,
    req: ListFavoritesRequest,
) -> Result<Response<Body>, NailsError> {
    let auth = authenticate(&ctx, &req.token)?;
    let favorites = ctx.favorites.get_by_user_id(auth.id).await?;
    super::json_response(StatusCode::OK, &favorites)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/favorite-recipe", method = "DELETE")]
pub(crate) struct DeleteFavoriteRequest {
    #[nails(header = "authorization")]
    token: BearerToken,
    id: Option<i64>,
}

pub(crate) async fn delete_favorite(
    ctx: AppCtx,
    req: DeleteFavoriteRequest,
) -> Result<Response<Body>, NailsError> {
    let auth = authenticate(&ctx, &req.token)?;
    ctx.favorites
        .delete_favorite(auth.id, req.id.unwrap_or(0))
        .await?;
    super::message_response("favorite removed")
}
