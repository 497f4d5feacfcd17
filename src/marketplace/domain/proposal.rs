//! Contractor proposals against open projects.

use super::{Amount, MarketplaceDomainError, ParseEnumError, ProjectId, ProposalId, StoredName, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Decision state of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Awaiting the client's decision.
    Pending,
    /// Selected by the client.
    Accepted,
    /// Declined, explicitly or because a competitor was selected.
    Rejected,
}

impl ProposalStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProposalStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseEnumError::new("proposal status", value)),
        }
    }
}

/// A decision was attempted on a proposal that is no longer pending.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("proposal {proposal_id} is already {status}")]
pub struct ProposalAlreadyDecided {
    /// Proposal that refused the decision.
    pub proposal_id: ProposalId,
    /// Its current status.
    pub status: ProposalStatus,
}

/// Offer content supplied by the contractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalTerms {
    /// Cover message.
    pub message: String,
    /// Quoted price.
    pub price: Amount,
}

impl ProposalTerms {
    /// Creates validated terms.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::EmptyProposalMessage`] for a blank
    /// message or [`MarketplaceDomainError::NegativeAmount`] for a negative
    /// price.
    pub fn new(message: impl Into<String>, price: i64) -> Result<Self, MarketplaceDomainError> {
        let body = message.into();
        if body.trim().is_empty() {
            return Err(MarketplaceDomainError::EmptyProposalMessage);
        }
        Ok(Self {
            message: body,
            price: Amount::new(price)?,
        })
    }
}

/// Contractor proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    id: ProposalId,
    project_id: ProjectId,
    contractor_id: UserId,
    message: String,
    price: Amount,
    document: Option<StoredName>,
    status: ProposalStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProposalData {
    /// Persisted identifier.
    pub id: ProposalId,
    /// Target project.
    pub project_id: ProjectId,
    /// Submitting contractor.
    pub contractor_id: UserId,
    /// Cover message.
    pub message: String,
    /// Quoted price.
    pub price: Amount,
    /// Stored proposal document, if one was attached.
    pub document: Option<StoredName>,
    /// Decision state.
    pub status: ProposalStatus,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest decision timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    /// Creates a pending proposal.
    #[must_use]
    pub fn submit(
        project_id: ProjectId,
        contractor_id: UserId,
        terms: ProposalTerms,
        document: Option<StoredName>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ProposalId::new(),
            project_id,
            contractor_id,
            message: terms.message,
            price: terms.price,
            document,
            status: ProposalStatus::Pending,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a proposal from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedProposalData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            contractor_id: data.contractor_id,
            message: data.message,
            price: data.price,
            document: data.document,
            status: data.status,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the proposal identifier.
    #[must_use]
    pub const fn id(&self) -> ProposalId {
        self.id
    }

    /// Returns the target project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the submitting contractor.
    #[must_use]
    pub const fn contractor_id(&self) -> UserId {
        self.contractor_id
    }

    /// Returns the cover message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the quoted price.
    #[must_use]
    pub const fn price(&self) -> Amount {
        self.price
    }

    /// Returns the stored document reference, if any.
    #[must_use]
    pub const fn document(&self) -> Option<&StoredName> {
        self.document.as_ref()
    }

    /// Returns the decision state.
    #[must_use]
    pub const fn status(&self) -> ProposalStatus {
        self.status
    }

    /// Returns `true` while awaiting a decision.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, ProposalStatus::Pending)
    }

    /// Returns the submission timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest decision timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Marks the proposal accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalAlreadyDecided`] unless the proposal is pending.
    pub fn accept(&mut self, clock: &impl Clock) -> Result<(), ProposalAlreadyDecided> {
        self.decide(ProposalStatus::Accepted, clock.utc())
    }

    /// Marks the proposal rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalAlreadyDecided`] unless the proposal is pending.
    pub fn reject(&mut self, clock: &impl Clock) -> Result<(), ProposalAlreadyDecided> {
        self.reject_at(clock.utc())
    }

    /// Marks the proposal rejected at `at`, as done for competing proposals
    /// when a selection is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalAlreadyDecided`] unless the proposal is pending.
    pub const fn reject_at(&mut self, at: DateTime<Utc>) -> Result<(), ProposalAlreadyDecided> {
        self.decide(ProposalStatus::Rejected, at)
    }

    const fn decide(
        &mut self,
        outcome: ProposalStatus,
        at: DateTime<Utc>,
    ) -> Result<(), ProposalAlreadyDecided> {
        if !self.is_pending() {
            return Err(ProposalAlreadyDecided {
                proposal_id: self.id,
                status: self.status,
            });
        }
        self.status = outcome;
        self.updated_at = at;
        Ok(())
    }
}
