//! Data access, one repository per table. Repositories borrow a connection, so
//! the caller decides the transaction boundary.

mod favorites;
mod images;
mod profiles;
mod recipes;
mod reviews;
mod tags;
mod users;

pub use self::favorites::FavoriteRepo;
pub use self::images::ImageRepo;
pub use self::profiles::ProfileRepo;
pub use self::recipes::RecipeRepo;
pub use self::reviews::ReviewRepo;
pub use self::tags::TagRepo;
pub use self::users::UserRepo;
