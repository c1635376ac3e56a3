use hyper::{Response, StatusCode};
use nails::error::NailsError;
use nails::request::{Deferred, JsonBody};
use nails::{Body, Preroute};
use serde::Deserialize;

use crate::context::AppCtx;
use crate::tokens::{authenticate, BearerToken};
use crate::usecases::Registration;

#[derive(Debug, Preroute)]
#[nails(path = "/api/register", method = "POST")]
pub(crate) struct RegisterRequest {
    #[nails(body)]
    body: JsonBody<Registration>,
}

pub(crate) async fn register(ctx: AppCtx, req: RegisterRequest) -> Result<Response<Body>, NailsError> {
    let user = ctx.users.create_user(req.body.0).await?;
    super::json_response(StatusCode::CREATED, &user)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/login", method = "POST")]
pub(crate) struct LoginRequest {
    #[nails(body)]
    body: JsonBody<LoginRequestBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequestBody {
    /// A username or an email.
    username: String,
    password: String,
}

pub(crate) async fn login(ctx: AppCtx, req: LoginRequest) -> Result<Response<Body>, NailsError> {
    let LoginRequestBody { username, password } = req.body.0;
    let token = ctx.users.login(username, password).await?;
    super::json_response(StatusCode::OK, &token)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/detail-user")]
pub(crate) struct DetailUserRequest {
    #[nails(header = "authorization")]
    token: BearerToken,
}

pub(crate) async fn detail_user(
    ctx: AppCtx,
    req: DetailUserRequest,
) -> Result<Response<Body>, NailsError> {
    let auth = authenticate(&ctx, &req.token)?;
    let detail = ctx.users.get_user_by_id(auth.id).await?;
    super::json_response(StatusCode::OK, &detail)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/change-password", method = "PUT")]
pub(crate) struct ChangePasswordRequest {
    #[nails(header = "authorization")]
    token: BearerToken,
    #[nails(body)]
    body: Deferred<JsonBody<ChangePasswordRequestBody>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChangePasswordRequestBody {
    old_password: String,
    new_password: String,
}

pub(crate) async fn change_password(
    ctx: AppCtx,
    req: ChangePasswordRequest,
) -> Result<Response<Body>, NailsError> {
    let auth = authenticate(&ctx, &req.token)?;
    let ChangePasswordRequestBody {
        old_password,
        new_password,
    } = req.body.extract().await?.0;
    ctx.users
        .change_password(auth.id, old_password, new_password)
        .await?;
    super::message_response("password changed")
}
