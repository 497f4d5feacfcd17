//! Diesel schema for marketplace persistence.

diesel::table! {
    /// Registered accounts.
    users (id) {
        /// Account identifier.
        id -> Uuid,
        /// Unique login name.
        #[max_length = 64]
        username -> Varchar,
        /// Fixed account role.
        #[max_length = 20]
        role -> Varchar,
        /// Hash produced by the external password hasher.
        credential_hash -> Text,
        /// Registration timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Posted projects and their lifecycle state.
    projects (id) {
        /// Project identifier.
        id -> Uuid,
        /// Owning client.
        client_id -> Uuid,
        /// Selected contractor.
        contractor_id -> Nullable<Uuid>,
        /// Accepted proposal.
        accepted_proposal_id -> Nullable<Uuid>,
        /// Project title.
        #[max_length = 200]
        title -> Varchar,
        /// Free-text description.
        description -> Text,
        /// Offered budget.
        budget -> Int8,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Proposal deadline.
        bid_deadline -> Nullable<Timestamptz>,
        /// Closure timestamp.
        closed_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Contractor proposals.
    proposals (id) {
        /// Proposal identifier.
        id -> Uuid,
        /// Target project.
        project_id -> Uuid,
        /// Submitting contractor.
        contractor_id -> Uuid,
        /// Cover message.
        message -> Text,
        /// Quoted price.
        price -> Int8,
        /// Stored name of the proposal document.
        #[max_length = 255]
        document -> Nullable<Varchar>,
        /// Decision state.
        #[max_length = 20]
        status -> Varchar,
        /// Submission timestamp.
        created_at -> Timestamptz,
        /// Last decision timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Metadata for every stored file version.
    attachments (id) {
        /// Attachment identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Uploading user.
        uploader_id -> Uuid,
        /// Uploading user's role.
        #[max_length = 20]
        uploader_role -> Varchar,
        /// Version partition kind.
        #[max_length = 20]
        kind -> Varchar,
        /// Version within the partition.
        version -> Int4,
        /// Client-supplied file name.
        original_name -> Text,
        /// Name under the upload root.
        #[max_length = 255]
        stored_name -> Varchar,
        /// SHA-256 hex digest.
        #[max_length = 64]
        digest -> Varchar,
        /// Stored size in bytes.
        size_bytes -> Int8,
        /// Upload timestamp.
        uploaded_at -> Timestamptz,
    }
}

diesel::table! {
    /// Project issues.
    issues (id) {
        /// Issue identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// User who opened the issue.
        opener_id -> Uuid,
        /// Issue title.
        title -> Text,
        /// Issue description.
        description -> Text,
        /// Resolution state.
        #[max_length = 20]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Resolution timestamp.
        resolved_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Comments on issues.
    issue_comments (id) {
        /// Comment identifier.
        id -> Uuid,
        /// Parent issue.
        issue_id -> Uuid,
        /// Comment author.
        author_id -> Uuid,
        /// Comment body.
        content -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Post-closure ratings.
    ratings (id) {
        /// Rating identifier.
        id -> Uuid,
        /// Rated project.
        project_id -> Uuid,
        /// Rater.
        rater_id -> Uuid,
        /// Rater's role.
        #[max_length = 20]
        rater_role -> Varchar,
        /// Rated user.
        target_id -> Uuid,
        /// Rated user's role.
        #[max_length = 20]
        target_role -> Varchar,
        /// Quality score.
        quality -> Int2,
        /// Communication score.
        communication -> Int2,
        /// Timeliness score.
        timeliness -> Int2,
        /// Optional comment.
        comment -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(attachments -> projects (project_id));
diesel::joinable!(issue_comments -> issues (issue_id));
diesel::joinable!(issues -> projects (project_id));
diesel::joinable!(proposals -> projects (project_id));
diesel::joinable!(ratings -> projects (project_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    projects,
    proposals,
    attachments,
    issues,
    issue_comments,
    ratings,
);
