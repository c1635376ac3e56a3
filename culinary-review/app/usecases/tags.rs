use diesel::Connection;

use super::required;
use crate::db::Db;
use crate::error::{AppError, AppResult};
use crate::models::Tag;
use crate::repositories::TagRepo;

#[derive(Debug, Clone)]
pub struct TagUsecase {
    db: Db,
}

fn taken(name: &str) -> AppError {
    AppError::conflict(format!("tag `{}` already exists", name))
}

impl TagUsecase {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_tag(&self, name: String) -> AppResult<Tag> {
        let name = required("name", &name)?;
        self.db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    let mut tags = TagRepo::new(conn);
                    if !tags.find_by_names(std::slice::from_ref(&name))?.is_empty() {
                        return Err(taken(&name));
                    }
                    tags.create(&name).map_err(|e| match AppError::from(e) {
                        AppError::Conflict(_) => taken(&name),
                        e => e,
                    })
                })
            })
            .await
    }

    pub async fn get_all_tags(&self) -> AppResult<Vec<Tag>> {
        self.db.run(|conn| Ok(TagRepo::new(conn).list()?)).await
    }

    /// Bulk lookup. Names that do not exist are left out of the result.
    pub async fn get_tags_by_names(&self, names: Vec<String>) -> AppResult<Vec<Tag>> {
        self.db
            .run(move |conn| Ok(TagRepo::new(conn).find_by_names(&names)?))
            .await
    }

    pub async fn update_tag(&self, id: i64, name: String) -> AppResult<Tag> {
        let name = required("name", &name)?;
        self.db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    let mut tags = TagRepo::new(conn);
                    if tags.find(id)?.is_none() {
                        return Err(AppError::not_found("tag"));
                    }
                    let clash = tags.find_by_names(std::slice::from_ref(&name))?;
                    if clash.iter().any(|tag| tag.id != id) {
                        return Err(taken(&name));
                    }
                    Ok(tags.rename(id, &name)?)
                })
            })
            .await
    }

    /// Removes the tag and its recipe links.
    pub async fn delete_tag(&self, id: i64) -> AppResult<()> {
        self.db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    let mut tags = TagRepo::new(conn);
                    tags.unlink_tag(id)?;
                    if tags.delete(id)? == 0 {
                        return Err(AppError::not_found("tag"));
                    }
                    Ok(())
                })
            })
            .await
    }
}
