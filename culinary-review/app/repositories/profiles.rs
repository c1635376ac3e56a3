use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{NewProfile, Profile, ProfileChanges};
use crate::schema::profiles;

pub struct ProfileRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> ProfileRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub fn create(&mut self, new_profile: &NewProfile) -> QueryResult<Profile> {
        diesel::insert_into(profiles::table)
            .values(new_profile)
            .returning(Profile::as_returning())
            .get_result(self.conn)
    }

    pub fn find_by_user(&mut self, user_id: i64) -> QueryResult<Option<Profile>> {
        profiles::table
            .filter(profiles::user_id.eq(user_id))
            .select(Profile::as_select())
            .first(self.conn)
            .optional()
    }

    pub fn update_by_user(&mut self, user_id: i64, changes: &ProfileChanges) -> QueryResult<Profile> {
        diesel::update(profiles::table.filter(profiles::user_id.eq(user_id)))
            .set(changes)
            .returning(Profile::as_returning())
            .get_result(self.conn)
    }
}
