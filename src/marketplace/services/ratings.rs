//! Post-closure mutual ratings.

use super::{MarketplaceError, MarketplaceResult, load_project};
use crate::marketplace::{
    domain::{
        Actor, LifecycleEngine, ProjectAction, ProjectId, Rating, RatingParties, RatingScores,
        RatingSummary, Role, UserId,
    },
    ports::MarketplaceRepository,
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, instrument};

/// Request payload for rating the counterpart on a closed project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateCounterpartRequest {
    /// Rated project.
    pub project_id: ProjectId,
    /// Role of the user being rated.
    pub target_role: Role,
    /// Raw quality score.
    pub quality: i64,
    /// Raw communication score.
    pub communication: i64,
    /// Raw timeliness score.
    pub timeliness: i64,
    /// Optional free-text comment.
    pub comment: Option<String>,
}

/// Records ratings and summarises them.
#[derive(Clone)]
pub struct RatingService<R, C>
where
    R: MarketplaceRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    engine: LifecycleEngine,
}

impl<R, C> RatingService<R, C>
where
    R: MarketplaceRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new rating service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>, engine: LifecycleEngine) -> Self {
        Self {
            repository,
            clock,
            engine,
        }
    }

    /// Rates the actor's counterpart on a closed project: the client rates
    /// the assigned contractor and the contractor rates the client.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] for non-participants,
    /// [`MarketplaceError::InvalidState`] unless the project is closed,
    /// [`MarketplaceError::DeadlineExpired`] after the rating window,
    /// [`MarketplaceError::InvalidTarget`] when `target_role` is not the
    /// counterpart, [`MarketplaceError::Validation`] for scores outside
    /// `1..=5` and [`MarketplaceError::AlreadyRated`] on a second attempt.
    #[instrument(
        skip_all,
        fields(project_id = %request.project_id, user_id = %actor.user_id(), target_role = %request.target_role)
    )]
    pub async fn rate_counterpart(
        &self,
        actor: Actor,
        request: RateCounterpartRequest,
    ) -> MarketplaceResult<Rating> {
        let project = load_project(&*self.repository, request.project_id).await?;
        self.engine.evaluate(
            ProjectAction::RateCounterpart,
            actor,
            &project,
            self.clock.utc(),
        )?;
        let contractor_id = project.contractor_id().ok_or_else(|| {
            MarketplaceError::InvalidTarget("the project has no assigned contractor".to_owned())
        })?;
        if request.target_role != actor.role().counterpart() {
            return Err(MarketplaceError::InvalidTarget(format!(
                "a {} can only rate the {}",
                actor.role(),
                actor.role().counterpart()
            )));
        }
        let target_id = match request.target_role {
            Role::Contractor => contractor_id,
            Role::Client => project.client_id(),
        };
        let scores = RatingScores::new(request.quality, request.communication, request.timeliness)?;
        if self
            .repository
            .find_rating(request.project_id, actor.user_id(), target_id)
            .await?
            .is_some()
        {
            return Err(MarketplaceError::AlreadyRated);
        }
        let rating = Rating::record(
            RatingParties {
                project_id: request.project_id,
                rater_id: actor.user_id(),
                rater_role: actor.role(),
                target_id,
                target_role: request.target_role,
            },
            scores,
            request.comment,
            &*self.clock,
        );
        self.repository.store_rating(&rating).await?;
        info!(rating_id = %rating.id(), target_id = %target_id, "rating recorded");
        Ok(rating)
    }

    /// Returns count and per-dimension averages of the ratings `target_id`
    /// received as `target_role`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::StorageFailure`] when ratings cannot be
    /// read.
    pub async fn summary(&self, target_id: UserId, target_role: Role) -> MarketplaceResult<RatingSummary> {
        let ratings = self
            .repository
            .list_ratings_for_target(target_id, target_role)
            .await?;
        Ok(RatingSummary::from_ratings(&ratings))
    }
}
