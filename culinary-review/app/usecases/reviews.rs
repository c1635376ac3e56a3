use diesel::pg::PgConnection;
use diesel::Connection;

use super::required;
use crate::db::Db;
use crate::error::{AppError, AppResult};
use crate::models::{NewReview, Review, ReviewWithAuthor};
use crate::repositories::{RecipeRepo, ReviewRepo};

#[derive(Debug, Clone)]
pub struct ReviewUsecase {
    db: Db,
}

impl ReviewUsecase {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_review(
        &self,
        user_id: i64,
        recipe_id: i64,
        content: String,
    ) -> AppResult<ReviewWithAuthor> {
        let content = required("content", &content)?;
        self.db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    if RecipeRepo::new(conn).find(recipe_id)?.is_none() {
                        return Err(AppError::not_found("recipe"));
                    }
                    let mut reviews = ReviewRepo::new(conn);
                    let review = reviews.create(&NewReview {
                        user_id,
                        recipe_id,
                        content: &content,
                    })?;
                    reviews
                        .find_with_author(review.id)?
                        .ok_or_else(|| AppError::not_found("review"))
                })
            })
            .await
    }

    pub async fn get_all_reviews(&self) -> AppResult<Vec<ReviewWithAuthor>> {
        self.db
            .run(|conn| Ok(ReviewRepo::new(conn).list_with_author()?))
            .await
    }

    pub async fn get_review_by_id(&self, id: i64) -> AppResult<ReviewWithAuthor> {
        self.db
            .run(move |conn| {
                ReviewRepo::new(conn)
                    .find_with_author(id)?
                    .ok_or_else(|| AppError::not_found("review"))
            })
            .await
    }

    /// Only the author may edit. Anyone else gets `Unauthorized` and nothing changes.
    pub async fn update_review_by_id(
        &self,
        actor: i64,
        id: i64,
        content: String,
    ) -> AppResult<ReviewWithAuthor> {
        let content = required("content", &content)?;
        self.db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    authored_review(conn, actor, id, "you can only update your own review")?;
                    let mut reviews = ReviewRepo::new(conn);
                    reviews.update_content(id, &content)?;
                    reviews
                        .find_with_author(id)?
                        .ok_or_else(|| AppError::not_found("review"))
                })
            })
            .await
    }

    pub async fn delete_review_by_id(&self, actor: i64, id: i64) -> AppResult<()> {
        self.db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    authored_review(conn, actor, id, "you can only delete your own review")?;
                    ReviewRepo::new(conn).delete(id)?;
                    Ok(())
                })
            })
            .await
    }
}

fn authored_review(
    conn: &mut PgConnection,
    actor: i64,
    id: i64,
    denied: &str,
) -> AppResult<Review> {
    let review = ReviewRepo::new(conn)
        .find(id)?
        .ok_or_else(|| AppError::not_found("review"))?;
    if review.user_id != actor {
        return Err(AppError::unauthorized(denied));
    }
    Ok(review)
}
