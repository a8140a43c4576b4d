use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, ApplicationStatus, SellerApplication, UserId};

/// Offset/limit window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

/// A page of results plus the total matching count.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

/// Server-side pagination policy: the default window when the caller names
/// none and the ceiling no caller may exceed.
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 25,
            max_limit: 100,
        }
    }
}

impl PageLimits {
    pub fn request(&self, offset: Option<usize>, limit: Option<usize>) -> PageRequest {
        PageRequest {
            offset: offset.unwrap_or(0),
            limit: limit.unwrap_or(self.default_limit).clamp(1, self.max_limit),
        }
    }
}

/// Storage abstraction so the review engine can be exercised in isolation.
///
/// The repository exclusively owns persistence; transition legality lives in
/// the review engine.
pub trait ApplicationRepository: Send + Sync {
    /// Persist a new pending record. Fails with
    /// [`RepositoryError::PendingExists`] when the applicant already has a
    /// pending application.
    fn insert(&self, record: SellerApplication) -> Result<SellerApplication, RepositoryError>;

    fn fetch(&self, id: &ApplicationId) -> Result<Option<SellerApplication>, RepositoryError>;

    /// Persist a full record atomically, comparing the stored status
    /// against `expected`. A mismatch means another writer decided first
    /// and yields [`RepositoryError::StaleWrite`].
    fn save(
        &self,
        record: SellerApplication,
        expected: ApplicationStatus,
    ) -> Result<(), RepositoryError>;

    /// List applications, optionally filtered by status, ordered by
    /// submission time descending.
    fn list(
        &self,
        status: Option<ApplicationStatus>,
        page: PageRequest,
    ) -> Result<Page<SellerApplication>, RepositoryError>;

    /// Every application the applicant has ever submitted, newest first.
    fn history_for(&self, applicant: &UserId) -> Result<Vec<SellerApplication>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("applicant already has a pending application")]
    PendingExists,
    #[error("stored status changed since the record was loaded")]
    StaleWrite,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook. Delivery and read-state tracking live
/// elsewhere; the review engine only enqueues.
pub trait NotificationSink: Send + Sync {
    fn enqueue(&self, notice: ApplicationNotice) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    ApplicationApproved,
    ApplicationRejected,
}

impl NoticeKind {
    pub const fn label(self) -> &'static str {
        match self {
            NoticeKind::ApplicationApproved => "application_approved",
            NoticeKind::ApplicationRejected => "application_rejected",
        }
    }
}

/// Payload enqueued for the applicant when a decision lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationNotice {
    pub user_id: UserId,
    pub kind: NoticeKind,
    pub application_id: ApplicationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Notification dispatch error. Best-effort on the decision path: logged
/// and swallowed, never failing the transition.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("notification transport timed out")]
    Timeout,
}
