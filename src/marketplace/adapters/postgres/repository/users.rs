//! Account persistence.

use super::{PostgresMarketplaceRepository, unique_violation};
use crate::marketplace::{
    adapters::postgres::{models::UserRow, schema::users},
    domain::{User, UserId, Username},
    ports::{RepositoryError, RepositoryResult, UserRepository},
};
use async_trait::async_trait;
use diesel::prelude::*;

#[async_trait]
impl UserRepository for PostgresMarketplaceRepository {
    async fn store_user(&self, user: &User) -> RepositoryResult<()> {
        let row = UserRow::from_domain(user);
        self.run(move |connection| {
            diesel::insert_into(users::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match unique_violation(&err).as_deref() {
                    Some("users_username_key") => {
                        RepositoryError::DuplicateUsername(row.username.clone())
                    }
                    _ => RepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.run(move |connection| {
            users::table
                .find(id.into_inner())
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()?
                .map(UserRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn find_user_by_username(&self, username: &Username) -> RepositoryResult<Option<User>> {
        let lookup = username.as_str().to_owned();
        self.run(move |connection| {
            users::table
                .filter(users::username.eq(lookup))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()?
                .map(UserRow::into_domain)
                .transpose()
        })
        .await
    }
}
