use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{Favorite, NewFavorite};
use crate::schema::favorites;

pub struct FavoriteRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> FavoriteRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub fn create(&mut self, new_favorite: &NewFavorite) -> QueryResult<Favorite> {
        diesel::insert_into(favorites::table)
            .values(new_favorite)
            .returning(Favorite::as_returning())
            .get_result(self.conn)
    }

    pub fn find(&mut self, id: i64) -> QueryResult<Option<Favorite>> {
        favorites::table
            .find(id)
            .select(Favorite::as_select())
            .first(self.conn)
            .optional()
    }

    pub fn exists(&mut self, user_id: i64, recipe_id: i64) -> QueryResult<bool> {
        diesel::select(exists(
            favorites::table
                .filter(favorites::user_id.eq(user_id))
                .filter(favorites::recipe_id.eq(recipe_id)),
        ))
        .get_result(self.conn)
    }

    /// Newest first.
    pub fn for_user(&mut self, user_id: i64) -> QueryResult<Vec<Favorite>> {
        favorites::table
            .filter(favorites::user_id.eq(user_id))
            .order((favorites::created_at.desc(), favorites::id.desc()))
            .select(Favorite::as_select())
            .load(self.conn)
    }

    pub fn delete(&mut self, id: i64) -> QueryResult<usize> {
        diesel::delete(favorites::table.find(id)).execute(self.conn)
    }

    pub fn delete_for_recipe(&mut self, recipe_id: i64) -> QueryResult<usize> {
        diesel::delete(favorites::table.filter(favorites::recipe_id.eq(recipe_id)))
            .execute(self.conn)
    }
}
