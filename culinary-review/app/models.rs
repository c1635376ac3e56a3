use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// The public face of a user, attached to reviews.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(table_name = profiles)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub bio: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile<'a> {
    pub user_id: i64,
    pub full_name: &'a str,
    pub bio: &'a str,
    pub avatar_url: &'a str,
}

#[derive(AsChangeset)]
#[diesel(table_name = profiles)]
pub struct ProfileChanges<'a> {
    pub full_name: &'a str,
    pub bio: &'a str,
    pub avatar_url: &'a str,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(table_name = recipes)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub ingredients: String,
    pub instructions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = recipes)]
pub struct NewRecipe<'a> {
    pub user_id: i64,
    pub title: &'a str,
    pub description: &'a str,
    pub ingredients: &'a str,
    pub instructions: &'a str,
}

#[derive(AsChangeset)]
#[diesel(table_name = recipes)]
pub struct RecipeChanges<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub ingredients: &'a str,
    pub instructions: &'a str,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = tags)]
pub struct NewTag<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TagSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable, Associations)]
#[diesel(table_name = recipe_tags)]
#[diesel(belongs_to(Recipe))]
#[diesel(belongs_to(Tag))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecipeTag {
    pub recipe_id: i64,
    pub tag_id: i64,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(table_name = images)]
#[diesel(belongs_to(Recipe))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Image {
    pub id: i64,
    pub recipe_id: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = images)]
pub struct NewImage<'a> {
    pub recipe_id: i64,
    pub url: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(table_name = reviews)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Recipe))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Review {
    pub id: i64,
    pub user_id: i64,
    pub recipe_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReview<'a> {
    pub user_id: i64,
    pub recipe_id: i64,
    pub content: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(table_name = favorites)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Recipe))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub recipe_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = favorites)]
pub struct NewFavorite {
    pub user_id: i64,
    pub recipe_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub tags: Vec<TagSummary>,
    pub images: Vec<Image>,
    pub reviews: Vec<ReviewWithAuthor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub ingredients: String,
    pub instructions: String,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub profile: Option<Profile>,
    pub reviews: Vec<Review>,
    pub favorites: Vec<Favorite>,
}
