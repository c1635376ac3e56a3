use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{NewTag, RecipeTag, Tag, TagSummary};
use crate::schema::{recipe_tags, tags};

/// Tags and the `recipe_tags` join table.
pub struct TagRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> TagRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub fn create(&mut self, name: &str) -> QueryResult<Tag> {
        diesel::insert_into(tags::table)
            .values(&NewTag { name })
            .returning(Tag::as_returning())
            .get_result(self.conn)
    }

    pub fn find(&mut self, id: i64) -> QueryResult<Option<Tag>> {
        tags::table
            .find(id)
            .select(Tag::as_select())
            .first(self.conn)
            .optional()
    }

    pub fn list(&mut self) -> QueryResult<Vec<Tag>> {
        tags::table
            .order(tags::name)
            .select(Tag::as_select())
            .load(self.conn)
    }

    pub fn find_by_names(&mut self, names: &[String]) -> QueryResult<Vec<Tag>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        tags::table
            .filter(tags::name.eq_any(names))
            .order(tags::name)
            .select(Tag::as_select())
            .load(self.conn)
    }

    pub fn find_by_ids(&mut self, ids: &[i64]) -> QueryResult<Vec<Tag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        tags::table
            .filter(tags::id.eq_any(ids))
            .select(Tag::as_select())
            .load(self.conn)
    }

    pub fn rename(&mut self, id: i64, name: &str) -> QueryResult<Tag> {
        diesel::update(tags::table.find(id))
            .set((tags::name.eq(name), tags::updated_at.eq(Utc::now())))
            .returning(Tag::as_returning())
            .get_result(self.conn)
    }

    pub fn delete(&mut self, id: i64) -> QueryResult<usize> {
        diesel::delete(tags::table.find(id)).execute(self.conn)
    }

    pub fn for_recipe(&mut self, recipe_id: i64) -> QueryResult<Vec<TagSummary>> {
        recipe_tags::table
            .inner_join(tags::table)
            .filter(recipe_tags::recipe_id.eq(recipe_id))
            .order(tags::name)
            .select(TagSummary::as_select())
            .load(self.conn)
    }

    pub fn link(&mut self, recipe_id: i64, tag_ids: &[i64]) -> QueryResult<usize> {
        if tag_ids.is_empty() {
            return Ok(0);
        }
        let links = tag_ids
            .iter()
            .map(|&tag_id| RecipeTag { recipe_id, tag_id })
            .collect::<Vec<_>>();
        diesel::insert_into(recipe_tags::table)
            .values(&links)
            .execute(self.conn)
    }

    pub fn unlink_recipe(&mut self, recipe_id: i64) -> QueryResult<usize> {
        diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id)))
            .execute(self.conn)
    }

    pub fn unlink_tag(&mut self, tag_id: i64) -> QueryResult<usize> {
        diesel::delete(recipe_tags::table.filter(recipe_tags::tag_id.eq(tag_id))).execute(self.conn)
    }
}
