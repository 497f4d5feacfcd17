//! Versioned file metadata and upload validation.
//!
//! Files are append-only: every upload becomes a new [`Attachment`] with the
//! next [`FileVersion`] inside its `(project, uploader, kind)` partition and a
//! freshly generated [`StoredName`]. Nothing here ever renames or replaces a
//! stored file.

use super::{AttachmentId, MarketplaceDomainError, ParseEnumError, ProjectId, Role, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Purpose of a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    /// Reference material shared by the client.
    General,
    /// Document supporting a contractor proposal.
    Proposal,
    /// Deliverable submitted toward project completion.
    Closure,
}

impl AttachmentKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Proposal => "proposal",
            Self::Closure => "closure",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AttachmentKind {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "proposal" => Ok(Self::Proposal),
            "closure" => Ok(Self::Closure),
            _ => Err(ParseEnumError::new("attachment kind", value)),
        }
    }
}

/// Positive version number within a `(project, uploader, kind)` partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileVersion(u32);

impl FileVersion {
    /// Version assigned to the first upload in a partition.
    pub const FIRST: Self = Self(1);

    /// Creates a validated version.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::InvalidFileVersion`] when the value
    /// is not in `1..=u32::MAX`.
    pub fn new(value: i64) -> Result<Self, MarketplaceDomainError> {
        match u32::try_from(value) {
            Ok(version) if version > 0 => Ok(Self(version)),
            _ => Err(MarketplaceDomainError::InvalidFileVersion(value)),
        }
    }

    /// Returns the version following the latest existing one, or
    /// [`FileVersion::FIRST`] for an empty partition.
    #[must_use]
    pub fn after(latest: Option<Self>) -> Self {
        latest.map_or(Self::FIRST, |version| Self(version.0.saturating_add(1)))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Collision-free, filesystem-safe name under the upload root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredName(String);

impl StoredName {
    const MAX_EXTENSION_LENGTH: usize = 10;

    /// Generates a name combining the project, version, upload instant and a
    /// random token. The original extension is kept when it is alphanumeric.
    #[must_use]
    pub fn generate(
        project_id: ProjectId,
        version: FileVersion,
        uploaded_at: DateTime<Utc>,
        original_name: &str,
    ) -> Self {
        let token = Uuid::new_v4().simple();
        let stamp = uploaded_at.format("%Y%m%dT%H%M%S%3fZ");
        let project = project_id.into_inner().simple();
        let extension = safe_extension(original_name)
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        Self(format!("p{project}-v{version}-{stamp}-{token}{extension}"))
    }

    /// Validates a persisted name.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::UnsafeStoredName`] when the value is
    /// empty, starts with a dot, or contains characters outside
    /// `[A-Za-z0-9._-]`.
    pub fn parse(value: impl Into<String>) -> Result<Self, MarketplaceDomainError> {
        let raw = value.into();
        let is_safe = !raw.is_empty()
            && !raw.starts_with('.')
            && raw
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'));
        if !is_safe {
            return Err(MarketplaceDomainError::UnsafeStoredName(raw));
        }
        Ok(Self(raw))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoredName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the lowercased extension of `file_name` when it is short and
/// alphanumeric.
fn safe_extension(file_name: &str) -> Option<String> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    let is_safe = !stem.is_empty()
        && !extension.is_empty()
        && extension.len() <= StoredName::MAX_EXTENSION_LENGTH
        && extension.chars().all(|ch| ch.is_ascii_alphanumeric());
    is_safe.then(|| extension.to_ascii_lowercase())
}

/// Lowercase hexadecimal SHA-256 digest of stored content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    const BYTE_LENGTH: usize = 32;

    /// Computes the digest of `bytes`.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Validates a persisted digest.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::InvalidDigest`] unless the value is 64
    /// lowercase hexadecimal characters.
    pub fn parse(value: impl Into<String>) -> Result<Self, MarketplaceDomainError> {
        let raw = value.into();
        let canonical = hex::decode(&raw)
            .ok()
            .filter(|bytes| bytes.len() == Self::BYTE_LENGTH)
            .map(hex::encode);
        if canonical.as_deref() != Some(raw.as_str()) {
            return Err(MarketplaceDomainError::InvalidDigest(raw));
        }
        Ok(Self(raw))
    }

    /// Returns the digest as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Raw upload as received from the routing layer.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    original_name: String,
    bytes: Vec<u8>,
}

impl UploadedFile {
    /// Wraps an upload.
    #[must_use]
    pub fn new(original_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            original_name: original_name.into(),
            bytes,
        }
    }

    /// Returns the client-supplied file name.
    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Returns the file content.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the lowercased extension, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.original_name
            .rsplit_once('.')
            .map(|(_, extension)| extension.to_ascii_lowercase())
            .filter(|extension| !extension.is_empty())
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("original_name", &self.original_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Limits applied to every upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    max_bytes: usize,
    proposal_extensions: Vec<String>,
}

impl UploadPolicy {
    /// Creates a policy. Extensions are compared case-insensitively and
    /// without a leading dot; an empty list accepts any proposal document.
    #[must_use]
    pub fn new(max_bytes: usize, extensions: impl IntoIterator<Item = String>) -> Self {
        let proposal_extensions = extensions
            .into_iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self {
            max_bytes,
            proposal_extensions,
        }
    }

    /// Returns the maximum accepted size in bytes.
    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Checks an upload destined for a partition of `kind`.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketplaceDomainError`] describing the first failed rule:
    /// missing name, empty content, size limit, then proposal extension.
    pub fn validate(
        &self,
        file: &UploadedFile,
        kind: AttachmentKind,
    ) -> Result<(), MarketplaceDomainError> {
        if file.original_name().trim().is_empty() {
            return Err(MarketplaceDomainError::MissingFileName);
        }
        if file.bytes().is_empty() {
            return Err(MarketplaceDomainError::EmptyFile(
                file.original_name().to_owned(),
            ));
        }
        if file.bytes().len() > self.max_bytes {
            return Err(MarketplaceDomainError::FileTooLarge {
                actual: file.bytes().len(),
                limit: self.max_bytes,
            });
        }
        if kind == AttachmentKind::Proposal && !self.proposal_extensions.is_empty() {
            let extension = file.extension().unwrap_or_default();
            if !self.proposal_extensions.contains(&extension) {
                return Err(MarketplaceDomainError::DisallowedExtension {
                    extension,
                    allowed: self.proposal_extensions.join(", "),
                });
            }
        }
        Ok(())
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(20 * 1024 * 1024, ["pdf".to_owned()])
    }
}

/// Metadata row for one stored file version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    id: AttachmentId,
    project_id: ProjectId,
    uploader_id: UserId,
    uploader_role: Role,
    kind: AttachmentKind,
    version: FileVersion,
    original_name: String,
    stored_name: StoredName,
    digest: ContentDigest,
    size_bytes: u64,
    uploaded_at: DateTime<Utc>,
}

/// Parameter object describing a stored file version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentData {
    /// Identifier; fresh for new uploads.
    pub id: AttachmentId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Uploading user.
    pub uploader_id: UserId,
    /// Role of the uploading user.
    pub uploader_role: Role,
    /// Partition kind.
    pub kind: AttachmentKind,
    /// Version within the partition.
    pub version: FileVersion,
    /// Client-supplied file name.
    pub original_name: String,
    /// Name under the upload root.
    pub stored_name: StoredName,
    /// SHA-256 of the stored bytes.
    pub digest: ContentDigest,
    /// Stored size in bytes.
    pub size_bytes: u64,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
}

impl Attachment {
    /// Creates metadata for a freshly stored file.
    #[must_use]
    pub fn new(data: AttachmentData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            uploader_id: data.uploader_id,
            uploader_role: data.uploader_role,
            kind: data.kind,
            version: data.version,
            original_name: data.original_name,
            stored_name: data.stored_name,
            digest: data.digest,
            size_bytes: data.size_bytes,
            uploaded_at: data.uploaded_at,
        }
    }

    /// Returns the attachment identifier.
    #[must_use]
    pub const fn id(&self) -> AttachmentId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the uploading user.
    #[must_use]
    pub const fn uploader_id(&self) -> UserId {
        self.uploader_id
    }

    /// Returns the uploading user's role.
    #[must_use]
    pub const fn uploader_role(&self) -> Role {
        self.uploader_role
    }

    /// Returns the partition kind.
    #[must_use]
    pub const fn kind(&self) -> AttachmentKind {
        self.kind
    }

    /// Returns the version within the partition.
    #[must_use]
    pub const fn version(&self) -> FileVersion {
        self.version
    }

    /// Returns the client-supplied file name.
    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Returns the name under the upload root.
    #[must_use]
    pub const fn stored_name(&self) -> &StoredName {
        &self.stored_name
    }

    /// Returns the content digest.
    #[must_use]
    pub const fn digest(&self) -> &ContentDigest {
        &self.digest
    }

    /// Returns the stored size in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Returns the upload timestamp.
    #[must_use]
    pub const fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    /// Returns the `(project, uploader, kind)` partition key.
    #[must_use]
    pub const fn partition(&self) -> VersionPartition {
        VersionPartition {
            project_id: self.project_id,
            uploader_id: self.uploader_id,
            kind: self.kind,
        }
    }
}

/// Key of a version sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionPartition {
    /// Owning project.
    pub project_id: ProjectId,
    /// Uploading user.
    pub uploader_id: UserId,
    /// Partition kind.
    pub kind: AttachmentKind,
}
