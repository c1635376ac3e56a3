use chrono::Utc;
use diesel::Connection;
use nails::multipart::FilePart;

use super::required;
use crate::db::Db;
use crate::error::{AppError, AppResult};
use crate::media::{delete_all_logged, SharedMediaStore};
use crate::models::{NewProfile, Profile, ProfileChanges};
use crate::repositories::ProfileRepo;

#[derive(Debug, Clone)]
pub struct ProfileInput {
    pub full_name: String,
    pub bio: String,
}

impl ProfileInput {
    fn validated(self) -> AppResult<Self> {
        Ok(Self {
            full_name: required("fullName", &self.full_name)?,
            bio: required("bio", &self.bio)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProfileUsecase {
    db: Db,
    media: SharedMediaStore,
}

impl ProfileUsecase {
    pub fn new(db: Db, media: SharedMediaStore) -> Self {
        Self { db, media }
    }

    /// Fills in the placeholder profile created at registration, or inserts one.
    /// A profile that already has an avatar is a conflict.
    pub async fn create_profile(
        &self,
        user_id: i64,
        input: ProfileInput,
        avatar: FilePart,
    ) -> AppResult<Profile> {
        let input = input.validated()?;
        let existing = self.find(user_id).await?;
        if existing.as_ref().map_or(false, |p| !p.avatar_url.is_empty()) {
            return Err(AppError::conflict("profile already exists"));
        }

        let avatar_url = self.media.upload(&avatar).await?.url;
        let url = avatar_url.clone();
        let result = self
            .db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    let mut profiles = ProfileRepo::new(conn);
                    match profiles.find_by_user(user_id)? {
                        Some(profile) if !profile.avatar_url.is_empty() => {
                            Err(AppError::conflict("profile already exists"))
                        }
                        Some(_) => Ok(profiles.update_by_user(
                            user_id,
                            &ProfileChanges {
                                full_name: &input.full_name,
                                bio: &input.bio,
                                avatar_url: &url,
                                updated_at: Utc::now(),
                            },
                        )?),
                        None => Ok(profiles.create(&NewProfile {
                            user_id,
                            full_name: &input.full_name,
                            bio: &input.bio,
                            avatar_url: &url,
                        })?),
                    }
                })
            })
            .await;
        if result.is_err() {
            delete_all_logged(&*self.media, &[avatar_url]).await;
        }
        result
    }

    pub async fn get_profile_by_user_id(&self, user_id: i64) -> AppResult<Profile> {
        self.find(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("profile"))
    }

    /// Replaces every field. The avatar is always re-uploaded and the old one removed.
    pub async fn update_profile_by_user_id(
        &self,
        user_id: i64,
        input: ProfileInput,
        avatar: FilePart,
    ) -> AppResult<Profile> {
        let input = input.validated()?;
        self.get_profile_by_user_id(user_id).await?;

        let avatar_url = self.media.upload(&avatar).await?.url;
        let url = avatar_url.clone();
        let result = self
            .db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    let mut profiles = ProfileRepo::new(conn);
                    let previous = profiles
                        .find_by_user(user_id)?
                        .ok_or_else(|| AppError::not_found("profile"))?;
                    let profile = profiles.update_by_user(
                        user_id,
                        &ProfileChanges {
                            full_name: &input.full_name,
                            bio: &input.bio,
                            avatar_url: &url,
                            updated_at: Utc::now(),
                        },
                    )?;
                    Ok((profile, previous.avatar_url))
                })
            })
            .await;
        match result {
            Ok((profile, previous)) => {
                if !previous.is_empty() && previous != profile.avatar_url {
                    delete_all_logged(&*self.media, &[previous]).await;
                }
                Ok(profile)
            }
            Err(e) => {
                delete_all_logged(&*self.media, &[avatar_url]).await;
                Err(e)
            }
        }
    }

    async fn find(&self, user_id: i64) -> AppResult<Option<Profile>> {
        self.db
            .run(move |conn| Ok(ProfileRepo::new(conn).find_by_user(user_id)?))
            .await
    }
}
