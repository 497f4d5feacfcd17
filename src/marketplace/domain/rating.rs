//! Post-closure ratings exchanged between client and contractor.

use super::{MarketplaceDomainError, ProjectId, RatingId, Role, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Integer score in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    /// Lowest accepted score.
    pub const MIN: u8 = 1;
    /// Highest accepted score.
    pub const MAX: u8 = 5;

    /// Creates a validated score.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::ScoreOutOfRange`] outside `1..=5`.
    pub fn new(value: i64) -> Result<Self, MarketplaceDomainError> {
        u8::try_from(value)
            .ok()
            .filter(|score| (Self::MIN..=Self::MAX).contains(score))
            .map(Self)
            .ok_or(MarketplaceDomainError::ScoreOutOfRange(value))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// The three rated dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatingScores {
    /// Quality of the work or the brief.
    pub quality: Score,
    /// Responsiveness and clarity.
    pub communication: Score,
    /// Punctuality against agreed dates.
    pub timeliness: Score,
}

impl RatingScores {
    /// Validates three raw scores in `quality, communication, timeliness`
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::ScoreOutOfRange`] for the first score
    /// outside `1..=5`.
    pub fn new(
        quality: i64,
        communication: i64,
        timeliness: i64,
    ) -> Result<Self, MarketplaceDomainError> {
        Ok(Self {
            quality: Score::new(quality)?,
            communication: Score::new(communication)?,
            timeliness: Score::new(timeliness)?,
        })
    }
}

/// Who rates whom on which project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RatingParties {
    /// Rated project.
    pub project_id: ProjectId,
    /// User giving the rating.
    pub rater_id: UserId,
    /// Role of the rater.
    pub rater_role: Role,
    /// User receiving the rating.
    pub target_id: UserId,
    /// Role of the rated user.
    pub target_role: Role,
}

/// A single post-closure review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    id: RatingId,
    project_id: ProjectId,
    rater_id: UserId,
    rater_role: Role,
    target_id: UserId,
    target_role: Role,
    scores: RatingScores,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted rating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRatingData {
    /// Persisted identifier.
    pub id: RatingId,
    /// Rating participants.
    pub parties: RatingParties,
    /// Dimension scores.
    pub scores: RatingScores,
    /// Optional free-text comment.
    pub comment: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Rating {
    /// Records a new rating. Blank comments are stored as `None`.
    #[must_use]
    pub fn record(
        parties: RatingParties,
        scores: RatingScores,
        comment: Option<String>,
        clock: &impl Clock,
    ) -> Self {
        Self::from_persisted(PersistedRatingData {
            id: RatingId::new(),
            parties,
            scores,
            comment: comment.filter(|text| !text.trim().is_empty()),
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a rating from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedRatingData) -> Self {
        Self {
            id: data.id,
            project_id: data.parties.project_id,
            rater_id: data.parties.rater_id,
            rater_role: data.parties.rater_role,
            target_id: data.parties.target_id,
            target_role: data.parties.target_role,
            scores: data.scores,
            comment: data.comment,
            created_at: data.created_at,
        }
    }

    /// Returns the rating identifier.
    #[must_use]
    pub const fn id(&self) -> RatingId {
        self.id
    }

    /// Returns the rated project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the rater.
    #[must_use]
    pub const fn rater_id(&self) -> UserId {
        self.rater_id
    }

    /// Returns the rater's role.
    #[must_use]
    pub const fn rater_role(&self) -> Role {
        self.rater_role
    }

    /// Returns the rated user.
    #[must_use]
    pub const fn target_id(&self) -> UserId {
        self.target_id
    }

    /// Returns the rated user's role.
    #[must_use]
    pub const fn target_role(&self) -> Role {
        self.target_role
    }

    /// Returns the dimension scores.
    #[must_use]
    pub const fn scores(&self) -> RatingScores {
        self.scores
    }

    /// Returns the comment, if any.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Aggregate view of the ratings a user received in one role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Number of ratings.
    pub count: u32,
    /// Mean quality score, `None` without ratings.
    pub quality: Option<f64>,
    /// Mean communication score, `None` without ratings.
    pub communication: Option<f64>,
    /// Mean timeliness score, `None` without ratings.
    pub timeliness: Option<f64>,
}

impl RatingSummary {
    /// Summarises `ratings`.
    #[must_use]
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let count = u32::try_from(ratings.len()).unwrap_or(u32::MAX);
        let total = |pick: fn(&RatingScores) -> Score| -> u32 {
            ratings
                .iter()
                .map(|rating| u32::from(pick(&rating.scores).value()))
                .fold(0_u32, u32::saturating_add)
        };
        Self {
            count,
            quality: mean(total(|scores| scores.quality), count),
            communication: mean(total(|scores| scores.communication), count),
            timeliness: mean(total(|scores| scores.timeliness), count),
        }
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "averages are reported as fractional values"
)]
fn mean(total: u32, count: u32) -> Option<f64> {
    (count > 0).then(|| f64::from(total) / f64::from(count))
}
