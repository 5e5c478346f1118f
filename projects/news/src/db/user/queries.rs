use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use crate::db::{user::models::*, schema::users::dsl::*};

#[derive(Debug, Error)]
pub enum InsertUserError {
    #[error("UsernameTaken")]
    UsernameTaken,
    #[error("InsertUser: {source}")]
    InsertUser{
        source: DieselError
    },
}

pub fn insert_user(
    conn: &mut PgConnection,
    new: &NewUser
) -> Result<User, InsertUserError> {
    diesel::insert_into(users)
        .values(new)
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(|source| match source {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => InsertUserError::UsernameTaken,
            source => InsertUserError::InsertUser{ source },
        })
}

#[derive(Debug, Error)]
pub enum GetUserByUsernameError {
    #[error("GetUserByUsername: {source}")]
    GetUserByUsername{
        #[from]
        source: DieselError
    },
}

pub fn get_user_by_username(
    conn: &mut PgConnection,
    username_val: &str
) -> Result<Option<User>, GetUserByUsernameError> {
    users
        .filter(username.eq(username_val))
        .select(User::as_select())
        .first(conn)
        .optional()
        .map_err(|source| GetUserByUsernameError::GetUserByUsername{ source })
}
