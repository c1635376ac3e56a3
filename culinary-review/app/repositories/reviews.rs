use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{NewReview, Review, ReviewWithAuthor, UserSummary};
use crate::schema::{reviews, users};

pub struct ReviewRepo<'c> {
    conn: &'c mut PgConnection,
}

fn with_author((review, user): (Review, UserSummary)) -> ReviewWithAuthor {
    ReviewWithAuthor { review, user }
}

impl<'c> ReviewRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub fn create(&mut self, new_review: &NewReview) -> QueryResult<Review> {
        diesel::insert_into(reviews::table)
            .values(new_review)
            .returning(Review::as_returning())
            .get_result(self.conn)
    }

    pub fn find(&mut self, id: i64) -> QueryResult<Option<Review>> {
        reviews::table
            .find(id)
            .select(Review::as_select())
            .first(self.conn)
            .optional()
    }

    pub fn find_with_author(&mut self, id: i64) -> QueryResult<Option<ReviewWithAuthor>> {
        reviews::table
            .inner_join(users::table)
            .filter(reviews::id.eq(id))
            .select((Review::as_select(), UserSummary::as_select()))
            .first(self.conn)
            .optional()
            .map(|found| found.map(with_author))
    }

    pub fn list_with_author(&mut self) -> QueryResult<Vec<ReviewWithAuthor>> {
        let rows = reviews::table
            .inner_join(users::table)
            .order(reviews::id)
            .select((Review::as_select(), UserSummary::as_select()))
            .load(self.conn)?;
        Ok(rows.into_iter().map(with_author).collect())
    }

    pub fn for_recipe(&mut self, recipe_id: i64) -> QueryResult<Vec<ReviewWithAuthor>> {
        let rows = reviews::table
            .inner_join(users::table)
            .filter(reviews::recipe_id.eq(recipe_id))
            .order(reviews::id)
            .select((Review::as_select(), UserSummary::as_select()))
            .load(self.conn)?;
        Ok(rows.into_iter().map(with_author).collect())
    }

    pub fn for_user(&mut self, user_id: i64) -> QueryResult<Vec<Review>> {
        reviews::table
            .filter(reviews::user_id.eq(user_id))
            .order(reviews::id)
            .select(Review::as_select())
            .load(self.conn)
    }

    pub fn update_content(&mut self, id: i64, content: &str) -> QueryResult<Review> {
        diesel::update(reviews::table.find(id))
            .set((reviews::content.eq(content), reviews::updated_at.eq(Utc::now())))
            .returning(Review::as_returning())
            .get_result(self.conn)
    }

    pub fn delete(&mut self, id: i64) -> QueryResult<usize> {
        diesel::delete(reviews::table.find(id)).execute(self.conn)
    }

    pub fn delete_for_recipe(&mut self, recipe_id: i64) -> QueryResult<usize> {
        diesel::delete(reviews::table.filter(reviews::recipe_id.eq(recipe_id))).execute(self.conn)
    }
}
