use hyper::{Response, StatusCode};
use nails::error::NailsError;
use nails::multipart::{FilePart, MultipartForm};
use nails::request::Deferred;
use nails::{Body, Preroute};

use crate::context::AppCtx;
use crate::error::{AppError, AppResult};
use crate::tokens::{authenticate, BearerToken};
use crate::usecases::ProfileInput;

fn profile_form(mut form: MultipartForm) -> AppResult<(ProfileInput, FilePart)> {
    let input = ProfileInput {
        full_name: form.text("fullName").unwrap_or_default().to_owned(),
        bio: form.text("bio").unwrap_or_default().to_owned(),
    };
    let avatar = form
        .take_file("avatar")
        .ok_or_else(|| AppError::validation("avatar is required"))?;
    if avatar.data.is_empty() {
        return Err(AppError::validation("avatar is empty"));
    }
    Ok((input, avatar))
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/profile", method = "POST")]
pub(crate) struct CreateProfileRequest {
    #[nails(header = "authorization")]
    token: BearerToken,
    #[nails(body)]
    form: Deferred<MultipartForm>,
}

pub(crate) async fn create_profile(
    ctx: AppCtx,
    req: CreateProfileRequest,
) -> Result<Response<Body>, NailsError> {
    let auth = authenticate(&ctx, &req.token)?;
    let (input, avatar) = profile_form(req.form.extract().await?)?;
    let profile = ctx.profiles.create_profile(auth.id, input, avatar).await?;
    super::json_response(StatusCode::CREATED, &profile)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/profile/me")]
pub(crate) struct GetMyProfileRequest {
    #[nails(header = "authorization")]
    token: BearerToken,
}

pub(crate) async fn get_my_profile(
    ctx: AppCtx,
    req: GetMyProfileRequest,
) -> Result<Response<Body>, NailsError> {
    let auth = authenticate(&ctx, &req.token)?;
    let profile = ctx.profiles.get_profile_by_user_id(auth.id).await?;
    super::json_response(StatusCode::OK, &profile)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/profile", method = "PUT")]
pub(crate) struct UpdateProfileRequest {
    #[nails(header = "authorization")]
    token: BearerToken,
    #[nails(body)]
    form: Deferred<MultipartForm>,
}

pub(crate) async fn update_profile(
    ctx: AppCtx,
    req: UpdateProfileRequest,
) -> Result<Response<Body>, NailsError> {
    let auth = authenticate(&ctx, &req.token)?;
    let (input, avatar) = profile_form(req.form.extract().await?)?;
    let profile = ctx
        .profiles
        .update_profile_by_user_id(auth.id, input, avatar)
        .await?;
    super::json_response(StatusCode::OK, &profile)
}
