//! Query client for the schema and queries in `demos/sqlc/`, laid out the way
//! sqlc lays out its generated packages: `models` holds the row types and
//! `query_sql` one method per `-- name:` definition.

mod models;
mod query_sql;

pub use models::User;
pub use query_sql::{CreateUserParams, CREATE_USER, DELETE_USER, GET_USER, LIST_USERS};

use tokio_postgres::error::{DbError, SqlState};
use tokio_postgres::GenericClient;

pub struct Queries<'a, C: GenericClient> {
    client: &'a C,
}

impl<'a, C: GenericClient> Queries<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(DbError),
    #[error("not-null constraint violated: {0}")]
    NotNullViolation(DbError),
    #[error("check constraint violated: {0}")]
    CheckViolation(DbError),
    #[error(transparent)]
    Other(tokio_postgres::Error),
}

impl Error {
    /// Name of the violated constraint, when the database reported one.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Error::UniqueViolation(e) | Error::NotNullViolation(e) | Error::CheckViolation(e) => {
                e.constraint()
            }
            Error::Other(_) => None,
        }
    }
}

impl From<tokio_postgres::Error> for Error {
    fn from(e: tokio_postgres::Error) -> Self {
        let Some(db_error) = e.as_db_error() else {
            return Error::Other(e);
        };
        match db_error.code() {
            &SqlState::UNIQUE_VIOLATION => Error::UniqueViolation(db_error.to_owned()),
            &SqlState::NOT_NULL_VIOLATION => Error::NotNullViolation(db_error.to_owned()),
            &SqlState::CHECK_VIOLATION => Error::CheckViolation(db_error.to_owned()),
            _ => Error::Other(e),
        }
    }
}
