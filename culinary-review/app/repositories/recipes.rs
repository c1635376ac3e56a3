use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{NewRecipe, Recipe, RecipeChanges};
use crate::schema::recipes;

pub struct RecipeRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> RecipeRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub fn create(&mut self, new_recipe: &NewRecipe) -> QueryResult<Recipe> {
        diesel::insert_into(recipes::table)
            .values(new_recipe)
            .returning(Recipe::as_returning())
            .get_result(self.conn)
    }

    pub fn find(&mut self, id: i64) -> QueryResult<Option<Recipe>> {
        recipes::table
            .find(id)
            .select(Recipe::as_select())
            .first(self.conn)
            .optional()
    }

    pub fn list(&mut self) -> QueryResult<Vec<Recipe>> {
        recipes::table
            .order(recipes::id)
            .select(Recipe::as_select())
            .load(self.conn)
    }

    pub fn update(&mut self, id: i64, changes: &RecipeChanges) -> QueryResult<Recipe> {
        diesel::update(recipes::table.find(id))
            .set(changes)
            .returning(Recipe::as_returning())
            .get_result(self.conn)
    }

    /// Deletes the recipe row only. Children are removed by the caller first.
    pub fn delete(&mut self, id: i64) -> QueryResult<usize> {
        diesel::delete(recipes::table.find(id)).execute(self.conn)
    }
}
