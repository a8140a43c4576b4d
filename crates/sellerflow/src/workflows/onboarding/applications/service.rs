use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use super::documents::{DocumentError, DocumentSelector, DocumentStore, StoredDocument};
use super::domain::{
    ApplicationId, ApplicationStatus, ApplicationSubmission, SellerApplication, UserId,
};
use super::repository::{
    ApplicationNotice, ApplicationRepository, NoticeKind, NotificationSink, Page, PageLimits,
    RepositoryError,
};
use super::roles::{RoleError, RoleStore, RoleTransitions};

/// The review engine: the one component allowed to decide transition
/// legality for seller applications.
///
/// Composes the repository, the role transition service, the document
/// store, and the notification sink behind their trait seams.
pub struct ReviewService<R, S, D, N> {
    repository: Arc<R>,
    roles: RoleTransitions<S>,
    documents: Arc<D>,
    notifications: Arc<N>,
    page_limits: PageLimits,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("sla-{id:06}"))
}

impl<R, S, D, N> ReviewService<R, S, D, N>
where
    R: ApplicationRepository + 'static,
    S: RoleStore + 'static,
    D: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(
        repository: Arc<R>,
        roles: Arc<S>,
        documents: Arc<D>,
        notifications: Arc<N>,
        page_limits: PageLimits,
    ) -> Self {
        Self {
            repository,
            roles: RoleTransitions::new(roles),
            documents,
            notifications,
            page_limits,
        }
    }

    /// Open a review for a buyer requesting seller privileges.
    ///
    /// The repository enforces the one-pending-per-applicant invariant; the
    /// engine validates the required fields up front.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<SellerApplication, ReviewError> {
        if submission.applicant_id.0.trim().is_empty() {
            return Err(ReviewError::Validation(
                "applicant_id must not be empty".to_string(),
            ));
        }
        if submission.business_description.trim().is_empty() {
            return Err(ReviewError::Validation(
                "business_description must not be empty".to_string(),
            ));
        }
        if submission.id_document_ref.trim().is_empty() {
            return Err(ReviewError::Validation(
                "id_document_ref must not be empty".to_string(),
            ));
        }

        let record = SellerApplication {
            id: next_application_id(),
            applicant_id: submission.applicant_id,
            business_description: submission.business_description,
            business_type: submission.business_type,
            id_document_type: submission.id_document_type,
            id_document_ref: submission.id_document_ref,
            additional_document_refs: submission.additional_document_refs,
            status: ApplicationStatus::Pending,
            admin_notes: None,
            reviewer_id: None,
            submitted_at: Utc::now(),
            reviewed_at: None,
            failed_promotion_at: None,
        };

        Ok(self.repository.insert(record)?)
    }

    /// Approve a pending application and promote the applicant to seller.
    ///
    /// A reader must never observe an approved record while the applicant
    /// is still a buyer, so the approval only commits once the promotion
    /// has: when the role transition fails, the status write is reverted
    /// (stamping `failed_promotion_at`) and the whole operation fails.
    pub fn approve(
        &self,
        id: &ApplicationId,
        reviewer: &UserId,
        notes: Option<String>,
    ) -> Result<SellerApplication, ReviewError> {
        let decided = self.decide(
            id,
            reviewer,
            ApplicationStatus::Approved,
            notes.unwrap_or_default(),
        )?;

        if let Err(err) = self.roles.promote_to_seller(&decided.applicant_id) {
            self.revert_decision(&decided);
            return Err(match err {
                RoleError::Unavailable(reason) => ReviewError::PromotionIncomplete { reason },
                other => ReviewError::Role(other),
            });
        }

        self.notify(&decided, NoticeKind::ApplicationApproved);
        Ok(decided)
    }

    /// Reject a pending application. The reason is mandatory; the account
    /// is left untouched.
    pub fn reject(
        &self,
        id: &ApplicationId,
        reviewer: &UserId,
        notes: &str,
    ) -> Result<SellerApplication, ReviewError> {
        if notes.trim().is_empty() {
            return Err(ReviewError::Validation(
                "a rejection reason is required".to_string(),
            ));
        }

        let decided = self.decide(id, reviewer, ApplicationStatus::Rejected, notes.to_string())?;
        self.notify(&decided, NoticeKind::ApplicationRejected);
        Ok(decided)
    }

    pub fn get(&self, id: &ApplicationId) -> Result<SellerApplication, ReviewError> {
        Ok(self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    /// An applicant's own submission history, newest first.
    pub fn history_for(&self, applicant: &UserId) -> Result<Vec<SellerApplication>, ReviewError> {
        Ok(self.repository.history_for(applicant)?)
    }

    pub fn list(
        &self,
        status: Option<ApplicationStatus>,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Page<SellerApplication>, ReviewError> {
        let page = self.page_limits.request(offset, limit);
        Ok(self.repository.list(status, page)?)
    }

    /// Resolve a stored document reference on the application and fetch its
    /// bytes from the document store.
    pub fn download_document(
        &self,
        id: &ApplicationId,
        selector: DocumentSelector,
    ) -> Result<StoredDocument, ReviewError> {
        let record = self.get(id)?;
        let key = match selector {
            DocumentSelector::IdDocument => record.id_document_ref.clone(),
            DocumentSelector::Additional(index) => record
                .additional_document_refs
                .get(index)
                .cloned()
                .ok_or_else(|| {
                    ReviewError::Documents(DocumentError::NotFound(format!(
                        "{}/additional_documents/{index}",
                        record.id
                    )))
                })?,
        };
        Ok(self.documents.retrieve(&key)?)
    }

    /// Load, guard the pending state, and persist the transition.
    ///
    /// Persistence is compare-and-set on the loaded status; a lost race is
    /// retried exactly once by reloading, and a reload that finds a
    /// terminal status surfaces the already-reviewed error instead of
    /// re-firing the decision.
    fn decide(
        &self,
        id: &ApplicationId,
        reviewer: &UserId,
        verdict: ApplicationStatus,
        notes: String,
    ) -> Result<SellerApplication, ReviewError> {
        if reviewer.0.trim().is_empty() {
            return Err(ReviewError::Validation(
                "reviewer_id must not be empty".to_string(),
            ));
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            let current = self
                .repository
                .fetch(id)?
                .ok_or(RepositoryError::NotFound)?;
            if current.status.is_terminal() {
                return Err(ReviewError::AlreadyReviewed {
                    id: id.clone(),
                    status: current.status,
                });
            }

            let mut decided = current;
            decided.status = verdict;
            decided.reviewer_id = Some(reviewer.clone());
            decided.reviewed_at = Some(Utc::now());
            decided.admin_notes = Some(notes.clone());

            match self
                .repository
                .save(decided.clone(), ApplicationStatus::Pending)
            {
                Ok(()) => return Ok(decided),
                Err(RepositoryError::StaleWrite) if attempts == 1 => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Compensation path for a failed promotion: put the record back to
    /// pending, keeping the failed attempt visible for audit.
    fn revert_decision(&self, decided: &SellerApplication) {
        let mut reverted = decided.clone();
        reverted.status = ApplicationStatus::Pending;
        reverted.reviewer_id = None;
        reverted.reviewed_at = None;
        reverted.admin_notes = None;
        reverted.failed_promotion_at = Some(Utc::now());

        if let Err(err) = self.repository.save(reverted, decided.status) {
            warn!(
                application = %decided.id,
                error = %err,
                "failed to revert application after promotion failure"
            );
        }
    }

    /// Best-effort notification: a dropped notice degrades the applicant
    /// experience but never fails the decision.
    fn notify(&self, record: &SellerApplication, kind: NoticeKind) {
        let notice = ApplicationNotice {
            user_id: record.applicant_id.clone(),
            kind,
            application_id: record.id.clone(),
            notes: record
                .admin_notes
                .clone()
                .filter(|notes| !notes.is_empty()),
        };

        if let Err(err) = self.notifications.enqueue(notice) {
            warn!(
                application = %record.id,
                error = %err,
                "notification enqueue failed; decision stands"
            );
        }
    }
}

/// Error raised by the review engine.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("application {id} was already reviewed ({})", .status.label())]
    AlreadyReviewed {
        id: ApplicationId,
        status: ApplicationStatus,
    },
    #[error("approval could not be completed, retry: {reason}")]
    PromotionIncomplete { reason: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Role(#[from] RoleError),
    #[error(transparent)]
    Documents(#[from] DocumentError),
}
