//! Recipe sharing and review backend: users, recipes with images and tags,
//! reviews and favorites behind a JSON API.

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod passwords;
pub mod repositories;
pub mod routes;
pub mod schema;
pub mod tokens;
pub mod usecases;

pub use crate::context::AppCtx;
pub use crate::routes::build_service;
