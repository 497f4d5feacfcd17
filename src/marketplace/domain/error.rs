//! Error types for marketplace domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing marketplace domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MarketplaceDomainError {
    /// The username is empty after trimming.
    #[error("username must not be empty")]
    EmptyUsername,

    /// The username exceeds the storage limit.
    #[error("username exceeds {max} characters: {value}")]
    UsernameTooLong {
        /// Rejected username.
        value: String,
        /// Maximum accepted length.
        max: usize,
    },

    /// The credential hash supplied by the hasher is empty.
    #[error("credential hash must not be empty")]
    EmptyCredentialHash,

    /// The project title is empty after trimming.
    #[error("project title must not be empty")]
    EmptyProjectTitle,

    /// The project title exceeds the storage limit.
    #[error("project title exceeds {max} characters")]
    ProjectTitleTooLong {
        /// Maximum accepted length.
        max: usize,
    },

    /// A monetary amount is negative.
    #[error("amount must not be negative, got {0}")]
    NegativeAmount(i64),

    /// A proposal message is empty after trimming.
    #[error("proposal message must not be empty")]
    EmptyProposalMessage,

    /// An issue title is empty after trimming.
    #[error("issue title must not be empty")]
    EmptyIssueTitle,

    /// A comment body is empty after trimming.
    #[error("comment content must not be empty")]
    EmptyCommentContent,

    /// A rating score falls outside the accepted range.
    #[error("rating score {0} is outside 1..=5")]
    ScoreOutOfRange(i64),

    /// A file version is not a positive integer.
    #[error("file version {0} is invalid, expected a positive integer")]
    InvalidFileVersion(i64),

    /// The uploaded file carries no name.
    #[error("uploaded file must have a name")]
    MissingFileName,

    /// The uploaded file carries no content.
    #[error("uploaded file '{0}' is empty")]
    EmptyFile(String),

    /// The uploaded file exceeds the configured size limit.
    #[error("uploaded file is {actual} bytes, exceeds limit of {limit} bytes")]
    FileTooLarge {
        /// Actual size in bytes.
        actual: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// The uploaded file's extension is not accepted for its kind.
    #[error("file type '{extension}' is not allowed (allowed: {allowed})")]
    DisallowedExtension {
        /// Extension found on the file, lowercased.
        extension: String,
        /// Comma-separated list of accepted extensions.
        allowed: String,
    },

    /// A stored file name contains characters outside the safe set.
    #[error("stored file name '{0}' is not filesystem-safe")]
    UnsafeStoredName(String),

    /// A content digest is not 64 lowercase hexadecimal characters.
    #[error("content digest '{0}' is not a SHA-256 hex digest")]
    InvalidDigest(String),
}

/// Error returned while parsing persisted enumerations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    /// Name of the enumeration being parsed.
    pub kind: &'static str,
    /// Rejected value.
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
