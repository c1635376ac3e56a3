use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{NewUser, User};
use crate::schema::users;

pub struct UserRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> UserRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub fn create(&mut self, new_user: &NewUser) -> QueryResult<User> {
        diesel::insert_into(users::table)
            .values(new_user)
            .returning(User::as_returning())
            .get_result(self.conn)
    }

    pub fn find(&mut self, id: i64) -> QueryResult<Option<User>> {
        users::table
            .find(id)
            .select(User::as_select())
            .first(self.conn)
            .optional()
    }

    /// Matches `value` against the email and the username columns.
    pub fn find_by_email_or_username(&mut self, value: &str) -> QueryResult<Option<User>> {
        users::table
            .filter(users::email.eq(value).or(users::username.eq(value)))
            .order(users::id)
            .select(User::as_select())
            .first(self.conn)
            .optional()
    }

    pub fn update_password(&mut self, id: i64, password_hash: &str) -> QueryResult<User> {
        diesel::update(users::table.find(id))
            .set((
                users::password_hash.eq(password_hash),
                users::updated_at.eq(Utc::now()),
            ))
            .returning(User::as_returning())
            .get_result(self.conn)
    }
}
