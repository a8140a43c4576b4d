//! Seller application review: submission intake, the administrator
//! decision state machine, role promotion, and document retrieval.
//!
//! Applications move `pending -> approved` or `pending -> rejected` and
//! never leave a terminal state. The repository, role store, document
//! store, and notification sink are trait seams so the engine can be
//! exercised against in-memory adapters.

pub mod documents;
pub mod domain;
pub mod repository;
pub mod roles;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use documents::{DocumentError, DocumentSelector, DocumentStore, StoredDocument};
pub use domain::{
    ApplicationId, ApplicationStatus, ApplicationStatusView, ApplicationSubmission,
    IdDocumentType, SellerApplication, UserId,
};
pub use repository::{
    ApplicationNotice, ApplicationRepository, NoticeKind, NotificationError, NotificationSink,
    Page, PageLimits, PageRequest, RepositoryError,
};
pub use roles::{AccountRole, RoleError, RoleStore, RoleTransitions};
pub use router::{application_router, review_status, DecisionRequest};
pub use service::{ReviewError, ReviewService};
