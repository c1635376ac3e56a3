use std::collections::HashMap;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::Connection;
use nails::multipart::FilePart;

use super::required;
use crate::db::Db;
use crate::error::{AppError, AppResult};
use crate::media::{delete_all_logged, upload_all, SharedMediaStore};
use crate::models::{NewRecipe, Recipe, RecipeChanges, RecipeDetail, RecipeSummary};
use crate::repositories::{FavoriteRepo, ImageRepo, RecipeRepo, ReviewRepo, TagRepo};

#[derive(Debug, Clone)]
pub struct RecipeInput {
    pub title: String,
    pub description: String,
    pub ingredients: String,
    pub instructions: String,
}

impl RecipeInput {
    fn validated(self) -> AppResult<Self> {
        Ok(Self {
            title: required("title", &self.title)?,
            description: required("description", &self.description)?,
            ingredients: required("ingredients", &self.ingredients)?,
            instructions: required("instructions", &self.instructions)?,
        })
    }
}

/// Tags to attach, referenced by id, by name, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagRefs {
    pub ids: Vec<i64>,
    pub names: Vec<String>,
}

impl TagRefs {
    fn normalized(mut self) -> Self {
        self.ids.sort_unstable();
        self.ids.dedup();
        let mut names = self
            .names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect::<Vec<_>>();
        names.sort();
        names.dedup();
        self.names = names;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecipeUsecase {
    db: Db,
    media: SharedMediaStore,
}

impl RecipeUsecase {
    pub fn new(db: Db, media: SharedMediaStore) -> Self {
        Self { db, media }
    }

    pub async fn create_recipe(
        &self,
        owner: i64,
        input: RecipeInput,
        tags: TagRefs,
        images: Vec<FilePart>,
    ) -> AppResult<RecipeDetail> {
        let input = input.validated()?;
        let tags = tags.normalized();
        let urls = upload_all(&*self.media, &images).await?;

        let uploaded = urls.clone();
        let result = self
            .db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    let recipe = RecipeRepo::new(conn).create(&NewRecipe {
                        user_id: owner,
                        title: &input.title,
                        description: &input.description,
                        ingredients: &input.ingredients,
                        instructions: &input.instructions,
                    })?;
                    let tag_ids = resolve_tags(conn, &tags)?;
                    TagRepo::new(conn).link(recipe.id, &tag_ids)?;
                    ImageRepo::new(conn).insert_many(recipe.id, &uploaded)?;
                    load_detail(conn, recipe.id)
                })
            })
            .await;
        match &result {
            Ok(detail) => tracing::info!(recipe_id = detail.recipe.id, owner, "created recipe"),
            Err(_) => delete_all_logged(&*self.media, &urls).await,
        }
        result
    }

    /// Replaces the fields, the tag set and the image set of an owned recipe.
    pub async fn update_recipe(
        &self,
        actor: i64,
        id: i64,
        input: RecipeInput,
        tags: TagRefs,
        images: Vec<FilePart>,
    ) -> AppResult<RecipeDetail> {
        let input = input.validated()?;
        let tags = tags.normalized();
        self.db
            .run(move |conn| owned_recipe(conn, actor, id).map(drop))
            .await?;
        let urls = upload_all(&*self.media, &images).await?;

        let uploaded = urls.clone();
        let result = self
            .db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    owned_recipe(conn, actor, id)?;
                    RecipeRepo::new(conn).update(
                        id,
                        &RecipeChanges {
                            title: &input.title,
                            description: &input.description,
                            ingredients: &input.ingredients,
                            instructions: &input.instructions,
                            updated_at: Utc::now(),
                        },
                    )?;
                    let tag_ids = resolve_tags(conn, &tags)?;
                    let mut tag_repo = TagRepo::new(conn);
                    tag_repo.unlink_recipe(id)?;
                    tag_repo.link(id, &tag_ids)?;
                    let mut image_repo = ImageRepo::new(conn);
                    let previous = image_repo.delete_for_recipe(id)?;
                    image_repo.insert_many(id, &uploaded)?;
                    Ok((load_detail(conn, id)?, previous))
                })
            })
            .await;
        match result {
            Ok((detail, previous)) => {
                delete_all_logged(&*self.media, &previous).await;
                Ok(detail)
            }
            Err(e) => {
                delete_all_logged(&*self.media, &urls).await;
                Err(e)
            }
        }
    }

    /// Deletes an owned recipe with its tag links, images, reviews and favorites.
    pub async fn delete_recipe(&self, actor: i64, id: i64) -> AppResult<()> {
        let urls = self
            .db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    owned_recipe(conn, actor, id)?;
                    TagRepo::new(conn).unlink_recipe(id)?;
                    let urls = ImageRepo::new(conn).delete_for_recipe(id)?;
                    ReviewRepo::new(conn).delete_for_recipe(id)?;
                    FavoriteRepo::new(conn).delete_for_recipe(id)?;
                    RecipeRepo::new(conn).delete(id)?;
                    Ok(urls)
                })
            })
            .await?;
        tracing::info!(recipe_id = id, images = urls.len(), "deleted recipe");
        delete_all_logged(&*self.media, &urls).await;
        Ok(())
    }

    pub async fn get_recipe_by_id(&self, id: i64) -> AppResult<RecipeDetail> {
        self.db.run(move |conn| load_detail(conn, id)).await
    }

    pub async fn get_all_recipes(&self) -> AppResult<Vec<RecipeSummary>> {
        self.db
            .run(|conn| {
                let recipes = RecipeRepo::new(conn).list()?;
                let ids = recipes.iter().map(|r| r.id).collect::<Vec<_>>();
                let mut images = HashMap::<i64, Vec<_>>::new();
                for image in ImageRepo::new(conn).for_recipes(&ids)? {
                    images.entry(image.recipe_id).or_default().push(image);
                }
                Ok(recipes
                    .into_iter()
                    .map(|recipe| RecipeSummary {
                        images: images.remove(&recipe.id).unwrap_or_default(),
                        id: recipe.id,
                        title: recipe.title,
                        description: recipe.description,
                        ingredients: recipe.ingredients,
                        instructions: recipe.instructions,
                    })
                    .collect())
            })
            .await
    }
}

fn owned_recipe(conn: &mut PgConnection, actor: i64, id: i64) -> AppResult<Recipe> {
    let recipe = RecipeRepo::new(conn)
        .find(id)?
        .ok_or_else(|| AppError::not_found("recipe"))?;
    if recipe.user_id != actor {
        return Err(AppError::unauthorized("you can only modify your own recipe"));
    }
    Ok(recipe)
}

/// Resolves every reference to a tag id. Any unknown reference fails the whole set.
fn resolve_tags(conn: &mut PgConnection, refs: &TagRefs) -> AppResult<Vec<i64>> {
    let mut repo = TagRepo::new(conn);
    let found = repo.find_by_ids(&refs.ids)?;
    if let Some(missing) = refs.ids.iter().find(|id| !found.iter().any(|t| t.id == **id)) {
        return Err(AppError::validation(format!(
            "tag with ID {} does not exist",
            missing
        )));
    }
    let named = repo.find_by_names(&refs.names)?;
    if let Some(missing) = refs
        .names
        .iter()
        .find(|name| !named.iter().any(|t| &t.name == *name))
    {
        return Err(AppError::validation(format!(
            "tag `{}` does not exist",
            missing
        )));
    }
    let mut ids = refs.ids.clone();
    ids.extend(named.iter().map(|t| t.id));
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

fn load_detail(conn: &mut PgConnection, id: i64) -> AppResult<RecipeDetail> {
    let recipe = RecipeRepo::new(conn)
        .find(id)?
        .ok_or_else(|| AppError::not_found("recipe"))?;
    Ok(RecipeDetail {
        tags: TagRepo::new(conn).for_recipe(id)?,
        images: ImageRepo::new(conn).for_recipe(id)?,
        reviews: ReviewRepo::new(conn).for_recipe(id)?,
        recipe,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_refs_normalized() {
        let refs = TagRefs {
            ids: vec![3, 1, 3],
            names: vec![" italian".to_owned(), "".to_owned(), "italian".to_owned(), "quick".to_owned()],
        }
        .normalized();
        assert_eq!(refs.ids, vec![1, 3]);
        assert_eq!(refs.names, vec!["italian".to_owned(), "quick".to_owned()]);
    }

    #[test]
    fn test_recipe_input_validated() {
        let input = RecipeInput {
            title: " Pasta ".to_owned(),
            description: "Quick".to_owned(),
            ingredients: "noodles".to_owned(),
            instructions: "boil".to_owned(),
        };
        assert_eq!(input.clone().validated().unwrap().title, "Pasta");
        let err = RecipeInput {
            instructions: "  ".to_owned(),
            ..input
        }
        .validated()
        .unwrap_err();
        assert_eq!(err.to_string(), "instructions is required");
    }
}
