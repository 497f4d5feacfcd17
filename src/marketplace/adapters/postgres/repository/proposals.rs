//! Proposal persistence and contractor selection.

use super::{
    PostgresMarketplaceRepository, lock_project_in_status, unique_violation,
    update_project_in_status,
};
use crate::marketplace::{
    adapters::postgres::{models::ProposalRow, schema::proposals},
    domain::{Project, ProjectId, ProjectStatus, Proposal, ProposalId, ProposalStatus, UserId},
    ports::{ContractorSelection, ProposalRepository, RepositoryError, RepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;

#[async_trait]
impl ProposalRepository for PostgresMarketplaceRepository {
    async fn store_proposal(
        &self,
        proposal: &Proposal,
        expected: ProjectStatus,
    ) -> RepositoryResult<()> {
        let row = ProposalRow::from_domain(proposal);
        let project_id = proposal.project_id();
        self.run(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                lock_project_in_status(tx, project_id, expected)?;
                insert_proposal(tx, &row)
            })
        })
        .await
    }

    async fn find_proposal(&self, id: ProposalId) -> RepositoryResult<Option<Proposal>> {
        self.run(move |connection| {
            proposals::table
                .find(id.into_inner())
                .select(ProposalRow::as_select())
                .first::<ProposalRow>(connection)
                .optional()?
                .map(ProposalRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn list_proposals_for_project(
        &self,
        project_id: ProjectId,
    ) -> RepositoryResult<Vec<Proposal>> {
        self.run(move |connection| {
            proposals::table
                .filter(proposals::project_id.eq(project_id.into_inner()))
                .order((proposals::created_at.asc(), proposals::id.asc()))
                .select(ProposalRow::as_select())
                .load::<ProposalRow>(connection)?
                .into_iter()
                .map(ProposalRow::into_domain)
                .collect()
        })
        .await
    }

    async fn list_proposals_for_contractor(
        &self,
        contractor_id: UserId,
    ) -> RepositoryResult<Vec<Proposal>> {
        self.run(move |connection| {
            proposals::table
                .filter(proposals::contractor_id.eq(contractor_id.into_inner()))
                .order((proposals::created_at.desc(), proposals::id.desc()))
                .select(ProposalRow::as_select())
                .load::<ProposalRow>(connection)?
                .into_iter()
                .map(ProposalRow::into_domain)
                .collect()
        })
        .await
    }

    async fn has_pending_proposal(
        &self,
        project_id: ProjectId,
        contractor_id: UserId,
    ) -> RepositoryResult<bool> {
        self.run(move |connection| {
            let pending = diesel::select(diesel::dsl::exists(
                proposals::table
                    .filter(proposals::project_id.eq(project_id.into_inner()))
                    .filter(proposals::contractor_id.eq(contractor_id.into_inner()))
                    .filter(proposals::status.eq(ProposalStatus::Pending.as_str())),
            ))
            .get_result::<bool>(connection)?;
            Ok(pending)
        })
        .await
    }

    async fn update_proposal(
        &self,
        proposal: &Proposal,
        expected: ProposalStatus,
    ) -> RepositoryResult<()> {
        let decided = proposal.clone();
        self.run(move |connection| decide_proposal(connection, &decided, expected))
            .await
    }

    async fn record_selection(&self, selection: ContractorSelection<'_>) -> RepositoryResult<usize> {
        let project: Project = selection.project.clone();
        let accepted: Proposal = selection.accepted.clone();
        let expected = selection.expected;
        self.run(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                lock_project_in_status(tx, project.id(), expected)?;
                decide_proposal(tx, &accepted, ProposalStatus::Pending)?;
                let rejected = diesel::update(
                    proposals::table
                        .filter(proposals::project_id.eq(project.id().into_inner()))
                        .filter(proposals::id.ne(accepted.id().into_inner()))
                        .filter(proposals::status.eq(ProposalStatus::Pending.as_str())),
                )
                .set((
                    proposals::status.eq(ProposalStatus::Rejected.as_str()),
                    proposals::updated_at.eq(accepted.updated_at()),
                ))
                .execute(tx)?;
                update_project_in_status(tx, &project, expected)?;
                Ok(rejected)
            })
        })
        .await
    }
}

/// Inserts a proposal row.
pub(super) fn insert_proposal(
    connection: &mut PgConnection,
    row: &ProposalRow,
) -> RepositoryResult<()> {
    diesel::insert_into(proposals::table)
        .values(row)
        .execute(connection)?;
    Ok(())
}

/// Writes a proposal's decision if its stored status is still `expected`.
fn decide_proposal(
    connection: &mut PgConnection,
    proposal: &Proposal,
    expected: ProposalStatus,
) -> RepositoryResult<()> {
    let proposal_id = proposal.id();
    let updated = diesel::update(
        proposals::table
            .filter(proposals::id.eq(proposal_id.into_inner()))
            .filter(proposals::status.eq(expected.as_str())),
    )
    .set((
        proposals::status.eq(proposal.status().as_str()),
        proposals::updated_at.eq(proposal.updated_at()),
    ))
    .execute(connection)
    .map_err(|err| match unique_violation(&err).as_deref() {
        Some("idx_proposals_one_accepted_per_project") => {
            RepositoryError::DuplicateAcceptedProposal(proposal.project_id())
        }
        _ => RepositoryError::persistence(err),
    })?;
    if updated == 1 {
        return Ok(());
    }
    let exists = diesel::select(diesel::dsl::exists(
        proposals::table.find(proposal_id.into_inner()),
    ))
    .get_result::<bool>(connection)?;
    if exists {
        Err(RepositoryError::StaleProposal {
            proposal_id,
            expected,
        })
    } else {
        Err(RepositoryError::not_found("proposal", proposal_id.into_inner()))
    }
}
