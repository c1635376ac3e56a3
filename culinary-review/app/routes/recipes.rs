use hyper::{Response, StatusCode};
use nails::error::NailsError;
use nails::multipart::{FilePart, MultipartForm};
use nails::request::Deferred;
use nails::{Body, Preroute};

use crate::context::AppCtx;
use crate::error::{AppError, AppResult};
use crate::tokens::{authenticate, BearerToken};
use crate::usecases::{RecipeInput, TagRefs};

/// Splits a list field given as a JSON array, a comma-separated list, or repeated fields.
fn list_values<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out = Vec::new();
    for value in values {
        let value = value.trim();
        if value.starts_with('[') {
            if let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(value) {
                out.extend(items.into_iter().map(|item| match item {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                }));
                continue;
            }
        }
        out.extend(value.split(',').map(|s| s.trim().to_owned()));
    }
    out.retain(|s| !s.is_empty());
    out
}

fn recipe_form(mut form: MultipartForm) -> AppResult<(RecipeInput, TagRefs, Vec<FilePart>)> {
    let text = |name: &str| form.text(name).unwrap_or_default().to_owned();
    let input = RecipeInput {
        title: text("title"),
        description: text("description"),
        ingredients: text("ingredients"),
        instructions: text("instructions"),
    };
    let ids = list_values(form.texts("tag_ids"))
        .iter()
        .map(|id| {
            id.parse::<i64>()
                .map_err(|_| AppError::validation(format!("invalid tag id `{}`", id)))
        })
        .collect::<AppResult<Vec<_>>>()?;
    let tags = TagRefs {
        ids,
        names: list_values(form.texts("tag_names")),
    };
    let images = form.take_files("images");
    if let Some(empty) = images.iter().find(|image| image.data.is_empty()) {
        return Err(AppError::validation(format!("image `{}` is empty", empty.file_name)));
    }
    Ok((input, tags, images))
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/recipes")]
pub(crate) struct ListRecipesRequest {}

pub(crate) async fn list_recipes(
    ctx: AppCtx,
    _req: ListRecipesRequest,
) -> Result<Response<Body>, NailsError> {
    let recipes = ctx.recipes.get_all_recipes().await?;
    super::json_response(StatusCode::OK, &recipes)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/recipes/{id}")]
pub(crate) struct GetRecipeRequest {
    #[nails(path)]
    id: i64,
}

pub(crate) async fn get_recipe(ctx: AppCtx, req: GetRecipeRequest) -> Result<Response<Body>, NailsError> {
    let recipe = ctx.recipes.get_recipe_by_id(req.id).await?;
    super::json_response(StatusCode::OK, &recipe)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/recipes", method = "POST")]
pub(crate) struct CreateRecipeRequest {
    #[nails(header = "authorization")]
    token: BearerToken,
    #[nails(body)]
    form: Deferred<MultipartForm>,
}

pub(crate) async fn create_recipe(
    ctx: AppCtx,
    req: CreateRecipeRequest,
) -> Result<Response<Body>, NailsError> {
    let auth = authenticate(&ctx, &req.token)?;
    let (input, tags, images) = recipe_form(req.form.extract().await?)?;
    let recipe = ctx
        .recipes
        .create_recipe(auth.id, input, tags, images)
        .await?;
    super::json_response(StatusCode::CREATED, &recipe)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/recipes/{id}", method = "PUT")]
pub(crate) struct UpdateRecipeRequest {
    #[nails(path)]
    id: i64,
    #[nails(header = "authorization")]
    token: BearerToken,
    #[nails(body)]
    form: Deferred<MultipartForm>,
}

pub(crate) async fn update_recipe(
    ctx: AppCtx,
    req: UpdateRecipeRequest,
) -> Result<Response<Body>, NailsError> {
    let auth = authenticate(&ctx, &req.token)?;
    let (input, tags, images) = recipe_form(req.form.extract().await?)?;
    let recipe = ctx
        .recipes
        .update_recipe(auth.id, req.id, input, tags, images)
        .await?;
    super::json_response(StatusCode::OK, &recipe)
}

#[derive(Debug, Preroute)]
#[nails(path = "/api/recipes/{id}", method = "DELETE")]
pub(crate) struct DeleteRecipeRequest {
    #[nails(path)]
    id: i64,
    #[nails(header = "authorization")]
    token: BearerToken,
}

pub(crate) async fn delete_recipe(
    ctx: AppCtx,
    req: DeleteRecipeRequest,
) -> Result<Response<Body>, NailsError> {
    let auth = authenticate(&ctx, &req.token)?;
    ctx.recipes.delete_recipe(auth.id, req.id).await?;
    super::message_response("recipe deleted")
}
