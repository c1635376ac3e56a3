use diesel::Connection;

use crate::db::Db;
use crate::error::{AppError, AppResult};
use crate::models::{Favorite, NewFavorite};
use crate::repositories::{FavoriteRepo, RecipeRepo};

#[derive(Debug, Clone)]
pub struct FavoriteUsecase {
    db: Db,
}

fn duplicate() -> AppError {
    AppError::conflict("recipe already in favorites")
}

impl FavoriteUsecase {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// A user can favorite a recipe once; the second attempt is a conflict.
    pub async fn create_favorite(&self, user_id: i64, recipe_id: i64) -> AppResult<Favorite> {
        self.db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    if RecipeRepo::new(conn).find(recipe_id)?.is_none() {
                        return Err(AppError::not_found("recipe"));
                    }
                    let mut favorites = FavoriteRepo::new(conn);
                    if favorites.exists(user_id, recipe_id)? {
                        return Err(duplicate());
                    }
                    favorites
                        .create(&NewFavorite { user_id, recipe_id })
                        .map_err(|e| match AppError::from(e) {
                            AppError::Conflict(_) => duplicate(),
                            e => e,
                        })
                })
            })
            .await
    }

    pub async fn get_by_user_id(&self, user_id: i64) -> AppResult<Vec<Favorite>> {
        self.db
            .run(move |conn| Ok(FavoriteRepo::new(conn).for_user(user_id)?))
            .await
    }

    /// Id 0 means "nothing to delete" and succeeds without touching the database.
    pub async fn delete_favorite(&self, actor: i64, id: i64) -> AppResult<()> {
        if id == 0 {
            return Ok(());
        }
        self.db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    let mut favorites = FavoriteRepo::new(conn);
                    let favorite = favorites
                        .find(id)?
                        .ok_or_else(|| AppError::not_found("favorite"))?;
                    if favorite.user_id != actor {
                        return Err(AppError::unauthorized(
                            "you can only remove your own favorite",
                        ));
                    }
                    favorites.delete(id)?;
                    Ok(())
                })
            })
            .await
    }
}
