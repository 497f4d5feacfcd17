//! Versioned attachment persistence.

use super::{
    PostgresMarketplaceRepository, lock_project_in_status, proposals::insert_proposal,
    unique_violation, update_project_in_status,
};
use crate::marketplace::{
    adapters::postgres::{
        models::{AttachmentRow, ProposalRow},
        schema::attachments,
    },
    domain::{
        Attachment, AttachmentId, FileVersion, Project, ProjectId, ProjectStatus,
        VersionPartition,
    },
    ports::{AttachmentRepository, RepositoryError, RepositoryResult, UploadCompanion},
};
use async_trait::async_trait;
use diesel::prelude::*;

/// Owned form of [`UploadCompanion`] that can cross into the blocking pool.
enum CompanionWrite {
    None,
    ProjectTransition {
        project: Project,
        expected: ProjectStatus,
    },
    Proposal {
        project_id: ProjectId,
        row: ProposalRow,
        expected: ProjectStatus,
    },
}

impl From<UploadCompanion<'_>> for CompanionWrite {
    fn from(companion: UploadCompanion<'_>) -> Self {
        match companion {
            UploadCompanion::None => Self::None,
            UploadCompanion::ProjectTransition { project, expected } => Self::ProjectTransition {
                project: project.clone(),
                expected,
            },
            UploadCompanion::Proposal { proposal, expected } => Self::Proposal {
                project_id: proposal.project_id(),
                row: ProposalRow::from_domain(proposal),
                expected,
            },
        }
    }
}

#[async_trait]
impl AttachmentRepository for PostgresMarketplaceRepository {
    async fn latest_attachment_version(
        &self,
        partition: VersionPartition,
    ) -> RepositoryResult<Option<FileVersion>> {
        self.run(move |connection| {
            let latest = attachments::table
                .filter(attachments::project_id.eq(partition.project_id.into_inner()))
                .filter(attachments::uploader_id.eq(partition.uploader_id.into_inner()))
                .filter(attachments::kind.eq(partition.kind.as_str()))
                .select(diesel::dsl::max(attachments::version))
                .first::<Option<i32>>(connection)?;
            latest
                .map(|version| FileVersion::new(i64::from(version)))
                .transpose()
                .map_err(RepositoryError::persistence)
        })
        .await
    }

    async fn record_upload(
        &self,
        attachment: &Attachment,
        companion: UploadCompanion<'_>,
    ) -> RepositoryResult<()> {
        let row = AttachmentRow::from_domain(attachment)?;
        let project_id = attachment.project_id();
        let version = attachment.version();
        let companion_write = CompanionWrite::from(companion);
        self.run(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                match &companion_write {
                    CompanionWrite::None => {}
                    CompanionWrite::ProjectTransition { project, expected } => {
                        update_project_in_status(tx, project, *expected)?;
                    }
                    CompanionWrite::Proposal {
                        project_id: proposal_project,
                        row: proposal_row,
                        expected,
                    } => {
                        lock_project_in_status(tx, *proposal_project, *expected)?;
                        insert_proposal(tx, proposal_row)?;
                    }
                }
                diesel::insert_into(attachments::table)
                    .values(&row)
                    .execute(tx)
                    .map_err(|err| match unique_violation(&err).as_deref() {
                        Some("attachments_partition_version_key") => {
                            RepositoryError::AttachmentVersionConflict {
                                project_id,
                                version,
                            }
                        }
                        _ => RepositoryError::persistence(err),
                    })?;
                Ok(())
            })
        })
        .await
    }

    async fn find_attachment(&self, id: AttachmentId) -> RepositoryResult<Option<Attachment>> {
        self.run(move |connection| {
            attachments::table
                .find(id.into_inner())
                .select(AttachmentRow::as_select())
                .first::<AttachmentRow>(connection)
                .optional()?
                .map(AttachmentRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn list_attachments_for_project(
        &self,
        project_id: ProjectId,
    ) -> RepositoryResult<Vec<Attachment>> {
        self.run(move |connection| {
            attachments::table
                .filter(attachments::project_id.eq(project_id.into_inner()))
                .order((attachments::uploaded_at.asc(), attachments::version.asc()))
                .select(AttachmentRow::as_select())
                .load::<AttachmentRow>(connection)?
                .into_iter()
                .map(AttachmentRow::into_domain)
                .collect()
        })
        .await
    }

    async fn list_attachment_versions(
        &self,
        partition: VersionPartition,
    ) -> RepositoryResult<Vec<Attachment>> {
        self.run(move |connection| {
            attachments::table
                .filter(attachments::project_id.eq(partition.project_id.into_inner()))
                .filter(attachments::uploader_id.eq(partition.uploader_id.into_inner()))
                .filter(attachments::kind.eq(partition.kind.as_str()))
                .order(attachments::version.asc())
                .select(AttachmentRow::as_select())
                .load::<AttachmentRow>(connection)?
                .into_iter()
                .map(AttachmentRow::into_domain)
                .collect()
        })
        .await
    }
}
