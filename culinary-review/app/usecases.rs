//! Business rules. Each use-case owns handles to the pool (and the media store
//! where it uploads) and runs its database work in one transaction.

mod favorites;
mod profiles;
mod recipes;
mod reviews;
mod tags;
mod users;

pub use self::favorites::FavoriteUsecase;
pub use self::profiles::{ProfileInput, ProfileUsecase};
pub use self::recipes::{RecipeInput, RecipeUsecase, TagRefs};
pub use self::reviews::ReviewUsecase;
pub use self::tags::TagUsecase;
pub use self::users::{Registration, UserUsecase};

use crate::error::{AppError, AppResult};

/// Trims `value` and rejects it if nothing is left.
pub(crate) fn required(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(value.to_owned())
}
