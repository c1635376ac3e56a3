use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{Image, NewImage};
use crate::schema::images;

pub struct ImageRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> ImageRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub fn insert_many(&mut self, recipe_id: i64, urls: &[String]) -> QueryResult<Vec<Image>> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }
        let rows = urls
            .iter()
            .map(|url| NewImage {
                recipe_id,
                url: url.as_str(),
            })
            .collect::<Vec<_>>();
        diesel::insert_into(images::table)
            .values(&rows)
            .returning(Image::as_returning())
            .get_results(self.conn)
    }

    pub fn for_recipe(&mut self, recipe_id: i64) -> QueryResult<Vec<Image>> {
        images::table
            .filter(images::recipe_id.eq(recipe_id))
            .order(images::id)
            .select(Image::as_select())
            .load(self.conn)
    }

    pub fn for_recipes(&mut self, recipe_ids: &[i64]) -> QueryResult<Vec<Image>> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }
        images::table
            .filter(images::recipe_id.eq_any(recipe_ids))
            .order(images::id)
            .select(Image::as_select())
            .load(self.conn)
    }

    /// Deletes the recipe's image rows and returns their URLs.
    pub fn delete_for_recipe(&mut self, recipe_id: i64) -> QueryResult<Vec<String>> {
        diesel::delete(images::table.filter(images::recipe_id.eq(recipe_id)))
            .returning(images::url)
            .get_results(self.conn)
    }
}
