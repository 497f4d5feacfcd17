//! Proposal submission and contractor-side listings.

use super::{
    FileVersioningService, MarketplaceError, MarketplaceResult, StoreUploadRequest, UploadEffect,
    load_project,
};
use crate::marketplace::{
    domain::{
        Actor, AttachmentKind, LifecycleEngine, ProjectAction, ProjectId, Proposal, ProposalTerms,
        UploadedFile,
    },
    ports::{BlobStore, MarketplaceRepository},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, instrument};

/// Request payload for bidding on a project.
#[derive(Debug, Clone)]
pub struct SubmitProposalRequest {
    /// Target project.
    pub project_id: ProjectId,
    /// Cover message.
    pub message: String,
    /// Quoted price.
    pub price: i64,
    /// Optional proposal document.
    pub document: Option<UploadedFile>,
}

impl SubmitProposalRequest {
    /// Creates a request without a document.
    #[must_use]
    pub fn new(project_id: ProjectId, message: impl Into<String>, price: i64) -> Self {
        Self {
            project_id,
            message: message.into(),
            price,
            document: None,
        }
    }

    /// Attaches a proposal document.
    #[must_use]
    pub fn with_document(mut self, document: UploadedFile) -> Self {
        self.document = Some(document);
        self
    }
}

/// Records contractor proposals.
#[derive(Clone)]
pub struct ProposalService<R, B, C>
where
    R: MarketplaceRepository,
    B: BlobStore,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    files: FileVersioningService<R, B, C>,
    clock: Arc<C>,
    engine: LifecycleEngine,
}

impl<R, B, C> ProposalService<R, B, C>
where
    R: MarketplaceRepository,
    B: BlobStore,
    C: Clock + Send + Sync,
{
    /// Creates a new proposal service sharing `files` for documents.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        files: FileVersioningService<R, B, C>,
        clock: Arc<C>,
        engine: LifecycleEngine,
    ) -> Self {
        Self {
            repository,
            files,
            clock,
            engine,
        }
    }

    /// Submits a proposal on an open project.
    ///
    /// A document, when present, is stored as the next proposal-file version
    /// and the proposal row is committed in the same transaction as its
    /// metadata.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] for an unknown project,
    /// [`MarketplaceError::InvalidState`] unless the project is open,
    /// [`MarketplaceError::DeadlinePassed`] at or after the bid deadline and
    /// [`MarketplaceError::Validation`] for malformed terms or documents.
    #[instrument(skip_all, fields(project_id = %request.project_id, user_id = %actor.user_id()))]
    pub async fn submit_proposal(
        &self,
        actor: Actor,
        request: SubmitProposalRequest,
    ) -> MarketplaceResult<Proposal> {
        let project = load_project(&*self.repository, request.project_id).await?;
        let decision = self.engine.evaluate(
            ProjectAction::SubmitProposal,
            actor,
            &project,
            self.clock.utc(),
        )?;
        let terms = ProposalTerms::new(request.message, request.price)?;

        let proposal = match request.document {
            Some(document) => {
                self.files
                    .policy()
                    .validate(&document, AttachmentKind::Proposal)?;
                let stored = self
                    .files
                    .store_upload(StoreUploadRequest {
                        project_id: request.project_id,
                        uploader: actor,
                        kind: AttachmentKind::Proposal,
                        file: document,
                        effect: UploadEffect::Proposal {
                            terms,
                            expected: decision.from,
                        },
                    })
                    .await?;
                stored.proposal.ok_or_else(|| {
                    MarketplaceError::InvalidState("proposal was not recorded".to_owned())
                })?
            }
            None => {
                let created = Proposal::submit(
                    request.project_id,
                    actor.user_id(),
                    terms,
                    None,
                    &*self.clock,
                );
                self.repository
                    .store_proposal(&created, decision.from)
                    .await?;
                created
            }
        };
        info!(proposal_id = %proposal.id(), "proposal submitted");
        Ok(proposal)
    }

    /// Lists the actor's own proposals, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] for client accounts.
    pub async fn list_my_proposals(&self, actor: Actor) -> MarketplaceResult<Vec<Proposal>> {
        if !actor.is_contractor() {
            return Err(MarketplaceError::Forbidden(
                "only contractors have proposals".to_owned(),
            ));
        }
        Ok(self
            .repository
            .list_proposals_for_contractor(actor.user_id())
            .await?)
    }

    /// Lists proposals on a project, oldest first. The owner sees all of
    /// them; a contractor sees only their own.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] for an unknown project and
    /// [`MarketplaceError::Forbidden`] for other clients.
    pub async fn list_project_proposals(
        &self,
        actor: Actor,
        project_id: ProjectId,
    ) -> MarketplaceResult<Vec<Proposal>> {
        let project = load_project(&*self.repository, project_id).await?;
        let proposals = self.repository.list_proposals_for_project(project_id).await?;
        if project.is_owned_by(actor.user_id()) {
            return Ok(proposals);
        }
        if !actor.is_contractor() {
            return Err(MarketplaceError::Forbidden(
                "only the project owner can review proposals".to_owned(),
            ));
        }
        Ok(proposals
            .into_iter()
            .filter(|proposal| proposal.contractor_id() == actor.user_id())
            .collect())
    }
}
