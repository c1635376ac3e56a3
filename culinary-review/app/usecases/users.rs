use diesel::Connection;
use serde::Deserialize;
use validator::ValidateEmail;

use super::required;
use crate::db::Db;
use crate::error::{AppError, AppResult};
use crate::models::{NewProfile, NewUser, User, UserDetail};
use crate::passwords::{hash_password, validate_new_password, verify_password};
use crate::repositories::{FavoriteRepo, ProfileRepo, ReviewRepo, UserRepo};
use crate::tokens::{IssuedToken, TokenKeys};

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct UserUsecase {
    db: Db,
    tokens: TokenKeys,
}

impl UserUsecase {
    pub fn new(db: Db, tokens: TokenKeys) -> Self {
        Self { db, tokens }
    }

    /// Registers a user together with a placeholder profile.
    pub async fn create_user(&self, registration: Registration) -> AppResult<User> {
        let username = required("username", &registration.username)?;
        let email = required("email", &registration.email)?.to_ascii_lowercase();
        validate_email(&email)?;
        validate_new_password(&registration.password)?;
        let password = registration.password;

        self.db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    let mut users = UserRepo::new(conn);
                    for value in [&email, &username] {
                        if users.find_by_email_or_username(value)?.is_some() {
                            return Err(AppError::conflict("username or email already registered"));
                        }
                    }
                    let password_hash = hash_password(&password)?;
                    let user = users
                        .create(&NewUser {
                            username: &username,
                            email: &email,
                            password_hash: &password_hash,
                        })
                        .map_err(|e| match AppError::from(e) {
                            AppError::Conflict(_) => {
                                AppError::conflict("username or email already registered")
                            }
                            e => e,
                        })?;
                    ProfileRepo::new(conn).create(&NewProfile {
                        user_id: user.id,
                        full_name: &user.username,
                        bio: "",
                        avatar_url: "",
                    })?;
                    tracing::info!(user_id = user.id, "registered user");
                    Ok(user)
                })
            })
            .await
    }

    /// Checks credentials and issues a bearer token. `login` is a username or an email.
    pub async fn login(&self, login: String, password: String) -> AppResult<IssuedToken> {
        let user = self
            .db
            .run(move |conn| {
                let user = UserRepo::new(conn).find_by_email_or_username(&normalize_login(&login))?;
                match user {
                    Some(user) if verify_password(&password, &user.password_hash)? => Ok(user),
                    _ => Err(AppError::unauthorized("invalid username or password")),
                }
            })
            .await?;
        self.tokens.issue(user.id)
    }

    pub async fn get_user_by_id(&self, id: i64) -> AppResult<UserDetail> {
        self.db
            .run(move |conn| {
                let user = UserRepo::new(conn)
                    .find(id)?
                    .ok_or_else(|| AppError::not_found("user"))?;
                Ok(UserDetail {
                    profile: ProfileRepo::new(conn).find_by_user(id)?,
                    reviews: ReviewRepo::new(conn).for_user(id)?,
                    favorites: FavoriteRepo::new(conn).for_user(id)?,
                    user,
                })
            })
            .await
    }

    pub async fn get_user_by_email_or_username(&self, value: String) -> AppResult<User> {
        self.db
            .run(move |conn| {
                UserRepo::new(conn)
                    .find_by_email_or_username(&normalize_login(&value))?
                    .ok_or_else(|| AppError::not_found("user"))
            })
            .await
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: String,
        new_password: String,
    ) -> AppResult<()> {
        validate_new_password(&new_password)?;
        self.db
            .run(move |conn| {
                conn.transaction::<_, AppError, _>(|conn| {
                    let mut users = UserRepo::new(conn);
                    let user = users
                        .find(user_id)?
                        .ok_or_else(|| AppError::not_found("user"))?;
                    if !verify_password(&old_password, &user.password_hash)? {
                        return Err(AppError::unauthorized("old password is incorrect"));
                    }
                    users.update_password(user_id, &hash_password(&new_password)?)?;
                    Ok(())
                })
            })
            .await
    }
}

fn validate_email(email: &str) -> AppResult<()> {
    if email.validate_email() {
        Ok(())
    } else {
        Err(AppError::validation("email is invalid"))
    }
}

/// Emails are stored lowercased; usernames are matched as typed.
fn normalize_login(login: &str) -> String {
    let login = login.trim();
    if login.contains('@') {
        login.to_ascii_lowercase()
    } else {
        login.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("cook@example.com").is_ok());
        assert!(validate_email("a.b+c@mail.example.org").is_ok());
        for bad in ["cook", "@example.com", "cook@", "cook@.com", "a@b@c.com", "a b@c.com"] {
            assert!(validate_email(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_normalize_login() {
        assert_eq!(normalize_login(" Mixy@Example.com "), "mixy@example.com");
        assert_eq!(normalize_login("MixyCook"), "MixyCook");
    }
}
