use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;

use nails::error::NailsError;
use nails::{Body, Service};

use crate::context::AppCtx;
use crate::error::AppError;

mod favorites;
mod profiles;
mod recipes;
mod reviews;
mod tags;
mod users;

pub fn build_service(ctx: &AppCtx) -> Service<AppCtx> {
    Service::builder()
        .add_function_route(users::register)
        .add_function_route(users::login)
        .add_function_route(users::detail_user)
        .add_function_route(users::change_password)
        .add_function_route(profiles::create_profile)
        .add_function_route(profiles::get_my_profile)
        .add_function_route(profiles::update_profile)
        .add_function_route(recipes::list_recipes)
        .add_function_route(recipes::get_recipe)
        .add_function_route(recipes::create_recipe)
        .add_function_route(recipes::update_recipe)
        .add_function_route(recipes::delete_recipe)
        .add_function_route(reviews::list_reviews)
        .add_function_route(reviews::get_review)
        .add_function_route(reviews::create_review)
        .add_function_route(reviews::update_review)
        .add_function_route(reviews::delete_review)
        .add_function_route(tags::list_tags)
        .add_function_route(tags::create_tag)
        .add_function_route(tags::update_tag)
        .add_function_route(tags::delete_tag)
        .add_function_route(favorites::create_favorite)
        .add_function_route(favorites::list_favorites)
        .add_function_route(favorites::delete_favorite)
        .finish(ctx)
}

#[derive(Debug, Serialize)]
struct DataBody<'a, T> {
    data: &'a T,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    message: &'a str,
}

/// Wraps `data` in the `{"data": ...}` envelope.
fn json_response<T: Serialize>(status: StatusCode, data: &T) -> Result<Response<Body>, NailsError> {
    let body = serde_json::to_vec(&DataBody { data })
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("response encoding")))?;
    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(resp)
}

fn message_response(message: &str) -> Result<Response<Body>, NailsError> {
    json_response(StatusCode::OK, &Message { message })
}
