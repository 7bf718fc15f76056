use super::{Error, Queries, User};
use tokio_postgres::GenericClient;

pub const CREATE_USER: &str = "INSERT INTO users (username, email)
VALUES ($1, $2)
RETURNING id, username, email, created_at;";

pub const GET_USER: &str = "SELECT id, username, email, created_at FROM users
WHERE id = $1 LIMIT 1;";

pub const LIST_USERS: &str = "SELECT id, username, email, created_at FROM users
ORDER BY username;";

pub const DELETE_USER: &str = "DELETE FROM users
WHERE id = $1;";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserParams {
    pub username: String,
    pub email: String,
}

impl<C: GenericClient> Queries<'_, C> {
    pub async fn create_user(&self, arg: CreateUserParams) -> Result<User, Error> {
        let row = self
            .client
            .query_one(CREATE_USER, &[&arg.username, &arg.email])
            .await?;

        Ok(User::try_from(row)?)
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>, Error> {
        let row = self.client.query_opt(GET_USER, &[&id]).await?;

        Ok(row.map(User::try_from).transpose()?)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, Error> {
        let rows = self.client.query(LIST_USERS, &[]).await?;

        Ok(rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), Error> {
        self.client.execute(DELETE_USER, &[&id]).await?;
        Ok(())
    }
}
