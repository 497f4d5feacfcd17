//! Versioned file storage.
//!
//! Uploads land in a `(project, uploader, kind)` partition with the next
//! version number. Content is written under a fresh collision-free name with
//! create-new semantics before the metadata row commits, so a row never
//! references missing content. Version races are settled by the storage
//! uniqueness constraint: the losing upload is re-staged with a new version
//! and name.

use super::{ContentIntegrityError, MarketplaceError, MarketplaceResult, load_project};
use crate::marketplace::{
    domain::{
        Actor, Attachment, AttachmentData, AttachmentId, AttachmentKind, ContentDigest,
        FileVersion, LifecycleEngine, Project, ProjectId, ProjectStatus, Proposal, ProposalTerms,
        Role, StoredName, UploadPolicy, UploadedFile, UserId, VersionPartition,
    },
    ports::{BlobStore, BlobStoreError, MarketplaceRepository, RepositoryError, UploadCompanion},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Side effect committed together with an upload's metadata row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEffect {
    /// Nothing besides the attachment row.
    None,
    /// Persist the project in its post-upload state.
    Transition {
        /// Project after the transition.
        project: Project,
        /// Status the upload was evaluated against.
        expected: ProjectStatus,
    },
    /// Create a proposal that references the stored document.
    Proposal {
        /// Validated proposal terms.
        terms: ProposalTerms,
        /// Project status the submission was evaluated against.
        expected: ProjectStatus,
    },
}

/// Request to store one uploaded file.
#[derive(Debug, Clone)]
pub struct StoreUploadRequest {
    /// Target project.
    pub project_id: ProjectId,
    /// Uploading user and role.
    pub uploader: Actor,
    /// Version partition.
    pub kind: AttachmentKind,
    /// Uploaded content.
    pub file: UploadedFile,
    /// Companion write.
    pub effect: UploadEffect,
}

/// Result of a committed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Recorded attachment.
    pub attachment: Attachment,
    /// Proposal created alongside, for proposal documents.
    pub proposal: Option<Proposal>,
}

/// Attachment metadata together with its verified content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// Attachment metadata.
    pub attachment: Attachment,
    /// Content whose digest matched the recorded one.
    pub bytes: Vec<u8>,
}

/// Stores, versions and serves project files.
pub struct FileVersioningService<R, B, C>
where
    R: MarketplaceRepository,
    B: BlobStore,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    blobs: Arc<B>,
    clock: Arc<C>,
    engine: LifecycleEngine,
    policy: UploadPolicy,
}

impl<R, B, C> Clone for FileVersioningService<R, B, C>
where
    R: MarketplaceRepository,
    B: BlobStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            blobs: Arc::clone(&self.blobs),
            clock: Arc::clone(&self.clock),
            engine: self.engine,
            policy: self.policy.clone(),
        }
    }
}

impl<R, B, C> FileVersioningService<R, B, C>
where
    R: MarketplaceRepository,
    B: BlobStore,
    C: Clock + Send + Sync,
{
    /// Number of times an upload is staged before a lost race is reported.
    pub const MAX_STAGING_ATTEMPTS: u32 = 5;

    /// Creates a new file versioning service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        blobs: Arc<B>,
        clock: Arc<C>,
        engine: LifecycleEngine,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            repository,
            blobs,
            clock,
            engine,
            policy,
        }
    }

    /// Returns the upload policy.
    #[must_use]
    pub const fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Uploads a file to a project, routed by who uploads it.
    ///
    /// The owner stores general files, the assigned contractor stores
    /// deliverables (moving the project to `reviewing`), and a contractor
    /// with a pending proposal stores proposal files.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`], [`MarketplaceError::InvalidState`]
    /// or a deadline error when the lifecycle refuses the upload, and
    /// [`MarketplaceError::Validation`] for a rejected file.
    #[instrument(skip_all, fields(project_id = %project_id, user_id = %actor.user_id()))]
    pub async fn upload_file(
        &self,
        actor: Actor,
        project_id: ProjectId,
        file: UploadedFile,
    ) -> MarketplaceResult<Attachment> {
        let project = load_project(&*self.repository, project_id).await?;
        let holds_pending_proposal = actor.is_contractor()
            && !project.is_assigned_to(actor.user_id())
            && self
                .repository
                .has_pending_proposal(project_id, actor.user_id())
                .await?;
        let route =
            self.engine
                .upload_route(actor, &project, holds_pending_proposal, self.clock.utc())?;
        self.policy.validate(&file, route.kind)?;
        let effect = if route.decision.to.is_some() {
            let mut submitted = project;
            submitted.submit_deliverable(&*self.clock)?;
            UploadEffect::Transition {
                project: submitted,
                expected: route.decision.from,
            }
        } else {
            UploadEffect::None
        };
        let stored = self
            .store_upload(StoreUploadRequest {
                project_id,
                uploader: actor,
                kind: route.kind,
                file,
                effect,
            })
            .await?;
        Ok(stored.attachment)
    }

    /// Stores content and records it as the next version of its partition.
    ///
    /// Callers are responsible for authorisation and validation. Either kind
    /// of lost race restages the upload with a fresh version and stored name,
    /// up to [`Self::MAX_STAGING_ATTEMPTS`] attempts in total.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::AlreadyExists`] when the last attempt
    /// lost a version race and [`MarketplaceError::StorageFailure`] when it
    /// hit a stored-name collision. Also returns
    /// [`MarketplaceError::InvalidState`] when the companion write's
    /// expected status no longer holds and
    /// [`MarketplaceError::StorageFailure`] on other storage errors.
    #[instrument(skip_all, fields(project_id = %request.project_id, kind = %request.kind))]
    pub async fn store_upload(&self, request: StoreUploadRequest) -> MarketplaceResult<StoredUpload> {
        let partition = VersionPartition {
            project_id: request.project_id,
            uploader_id: request.uploader.user_id(),
            kind: request.kind,
        };
        let mut attempt = 1;
        loop {
            match self.stage_once(&request, partition).await {
                Ok(stored) => {
                    info!(
                        version = %stored.attachment.version(),
                        stored_name = %stored.attachment.stored_name(),
                        "upload stored"
                    );
                    return Ok(stored);
                }
                Err(Staging::Retry(reason)) if attempt < Self::MAX_STAGING_ATTEMPTS => {
                    warn!(attempt, %reason, "upload lost a race, restaging");
                    attempt += 1;
                }
                Err(Staging::Retry(reason)) => return Err(reason),
                Err(Staging::Fail(err)) => return Err(err),
            }
        }
    }

    async fn stage_once(
        &self,
        request: &StoreUploadRequest,
        partition: VersionPartition,
    ) -> Result<StoredUpload, Staging> {
        let latest = self
            .repository
            .latest_attachment_version(partition)
            .await?;
        let version = FileVersion::after(latest);
        let uploaded_at = self.clock.utc();
        let stored_name = StoredName::generate(
            request.project_id,
            version,
            uploaded_at,
            request.file.original_name(),
        );
        self.blobs
            .write_new(&stored_name, request.file.bytes())
            .await?;

        let bytes = request.file.bytes();
        let attachment = Attachment::new(AttachmentData {
            id: AttachmentId::new(),
            project_id: request.project_id,
            uploader_id: request.uploader.user_id(),
            uploader_role: request.uploader.role(),
            kind: request.kind,
            version,
            original_name: request.file.original_name().to_owned(),
            stored_name: stored_name.clone(),
            digest: ContentDigest::of(bytes),
            size_bytes: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            uploaded_at,
        });
        let proposal = match &request.effect {
            UploadEffect::Proposal { terms, .. } => Some(Proposal::submit(
                request.project_id,
                request.uploader.user_id(),
                terms.clone(),
                Some(stored_name),
                &*self.clock,
            )),
            UploadEffect::None | UploadEffect::Transition { .. } => None,
        };
        let companion = match (&request.effect, &proposal) {
            (UploadEffect::Transition { project, expected }, _) => {
                UploadCompanion::ProjectTransition {
                    project,
                    expected: *expected,
                }
            }
            (UploadEffect::Proposal { expected, .. }, Some(created)) => UploadCompanion::Proposal {
                proposal: created,
                expected: *expected,
            },
            _ => UploadCompanion::None,
        };
        self.repository
            .record_upload(&attachment, companion)
            .await?;
        Ok(StoredUpload {
            attachment,
            proposal,
        })
    }

    /// Returns an attachment with its content after re-verifying the digest.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] for an unknown attachment,
    /// [`MarketplaceError::Forbidden`] when the actor may not see it and
    /// [`MarketplaceError::StorageFailure`] when content is missing or
    /// corrupted.
    #[instrument(skip_all, fields(attachment_id = %attachment_id, user_id = %actor.user_id()))]
    pub async fn fetch_attachment(
        &self,
        actor: Actor,
        attachment_id: AttachmentId,
    ) -> MarketplaceResult<FetchedFile> {
        let attachment = self
            .repository
            .find_attachment(attachment_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("attachment", attachment_id.into_inner()))?;
        let project = load_project(&*self.repository, attachment.project_id()).await?;
        ensure_can_view(actor, &project, attachment.uploader_id(), attachment.kind())?;

        let bytes = self.blobs.read(attachment.stored_name()).await?;
        let intact = ContentDigest::of(&bytes) == *attachment.digest()
            && u64::try_from(bytes.len()).ok() == Some(attachment.size_bytes());
        if !intact {
            warn!(stored_name = %attachment.stored_name(), "stored file failed integrity check");
            return Err(ContentIntegrityError {
                stored_name: attachment.stored_name().clone(),
            }
            .into());
        }
        Ok(FetchedFile { attachment, bytes })
    }

    /// Lists the attachments on a project the actor may see.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] for an unknown project.
    pub async fn list_project_files(
        &self,
        actor: Actor,
        project_id: ProjectId,
    ) -> MarketplaceResult<Vec<Attachment>> {
        let project = load_project(&*self.repository, project_id).await?;
        let attachments = self.repository.list_attachments_for_project(project_id).await?;
        Ok(attachments
            .into_iter()
            .filter(|attachment| {
                ensure_can_view(actor, &project, attachment.uploader_id(), attachment.kind())
                    .is_ok()
            })
            .collect())
    }

    /// Lists every version in one partition, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] when the actor may not see the
    /// partition.
    pub async fn list_versions(
        &self,
        actor: Actor,
        partition: VersionPartition,
    ) -> MarketplaceResult<Vec<Attachment>> {
        let project = load_project(&*self.repository, partition.project_id).await?;
        ensure_can_view(actor, &project, partition.uploader_id, partition.kind)?;
        Ok(self.repository.list_attachment_versions(partition).await?)
    }
}

/// Participants see every file. Other contractors see the owner's general
/// files and their own uploads.
fn ensure_can_view(
    actor: Actor,
    project: &Project,
    uploader_id: UserId,
    kind: AttachmentKind,
) -> MarketplaceResult<()> {
    let user_id = actor.user_id();
    let visible = project.is_owned_by(user_id)
        || project.is_assigned_to(user_id)
        || uploader_id == user_id
        || (actor.role() == Role::Contractor && kind == AttachmentKind::General);
    if visible {
        Ok(())
    } else {
        Err(MarketplaceError::Forbidden(
            "only project participants can access this file".to_owned(),
        ))
    }
}

enum Staging {
    Retry(MarketplaceError),
    Fail(MarketplaceError),
}

impl From<RepositoryError> for Staging {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::AttachmentVersionConflict { .. } => Self::Retry(err.into()),
            other => Self::Fail(other.into()),
        }
    }
}

impl From<BlobStoreError> for Staging {
    fn from(err: BlobStoreError) -> Self {
        match err {
            BlobStoreError::AlreadyExists(_) => Self::Retry(err.into()),
            other => Self::Fail(other.into()),
        }
    }
}
