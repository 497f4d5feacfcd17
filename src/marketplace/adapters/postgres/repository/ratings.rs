//! Rating persistence.

use super::{PostgresMarketplaceRepository, unique_violation};
use crate::marketplace::{
    adapters::postgres::{models::RatingRow, schema::ratings},
    domain::{ProjectId, Rating, Role, UserId},
    ports::{RatingRepository, RepositoryError, RepositoryResult},
};
use async_trait::async_trait;
use diesel::prelude::*;

#[async_trait]
impl RatingRepository for PostgresMarketplaceRepository {
    async fn store_rating(&self, rating: &Rating) -> RepositoryResult<()> {
        let row = RatingRow::from_domain(rating);
        let (project_id, rater_id, target_id) =
            (rating.project_id(), rating.rater_id(), rating.target_id());
        self.run(move |connection| {
            diesel::insert_into(ratings::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match unique_violation(&err).as_deref() {
                    Some("ratings_project_rater_target_key") => RepositoryError::DuplicateRating {
                        project_id,
                        rater_id,
                        target_id,
                    },
                    _ => RepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_rating(
        &self,
        project_id: ProjectId,
        rater_id: UserId,
        target_id: UserId,
    ) -> RepositoryResult<Option<Rating>> {
        self.run(move |connection| {
            ratings::table
                .filter(ratings::project_id.eq(project_id.into_inner()))
                .filter(ratings::rater_id.eq(rater_id.into_inner()))
                .filter(ratings::target_id.eq(target_id.into_inner()))
                .select(RatingRow::as_select())
                .first::<RatingRow>(connection)
                .optional()?
                .map(RatingRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn list_ratings_for_target(
        &self,
        target_id: UserId,
        target_role: Role,
    ) -> RepositoryResult<Vec<Rating>> {
        self.run(move |connection| {
            ratings::table
                .filter(ratings::target_id.eq(target_id.into_inner()))
                .filter(ratings::target_role.eq(target_role.as_str()))
                .order((ratings::created_at.asc(), ratings::id.asc()))
                .select(RatingRow::as_select())
                .load::<RatingRow>(connection)?
                .into_iter()
                .map(RatingRow::into_domain)
                .collect()
        })
        .await
    }
}
