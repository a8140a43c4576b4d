use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::workflows::onboarding::applications::documents::{
    DocumentError, DocumentStore, StoredDocument,
};
use crate::workflows::onboarding::applications::domain::{
    ApplicationId, ApplicationStatus, ApplicationSubmission, IdDocumentType, SellerApplication,
    UserId,
};
use crate::workflows::onboarding::applications::repository::{
    ApplicationNotice, ApplicationRepository, NotificationError, NotificationSink, Page,
    PageLimits, PageRequest, RepositoryError,
};
use crate::workflows::onboarding::applications::roles::{AccountRole, RoleError, RoleStore};
use crate::workflows::onboarding::applications::ReviewService;

pub(super) fn submission() -> ApplicationSubmission {
    submission_for("buyer-olive")
}

pub(super) fn submission_for(applicant: &str) -> ApplicationSubmission {
    ApplicationSubmission {
        applicant_id: UserId(applicant.to_string()),
        business_description: "Handmade ceramics and tableware".to_string(),
        business_type: Some("sole_proprietor".to_string()),
        id_document_type: IdDocumentType::Passport,
        id_document_ref: "doc-identity".to_string(),
        additional_document_refs: vec!["doc-registry".to_string(), "doc-tax".to_string()],
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, SellerApplication>>>,
}

fn newest_first(records: &mut [SellerApplication]) {
    records.sort_by(|a, b| {
        b.submitted_at
            .cmp(&a.submitted_at)
            .then_with(|| b.id.0.cmp(&a.id.0))
    });
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, record: SellerApplication) -> Result<SellerApplication, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let has_pending = guard.values().any(|existing| {
            existing.applicant_id == record.applicant_id
                && existing.status == ApplicationStatus::Pending
        });
        if has_pending {
            return Err(RepositoryError::PendingExists);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<SellerApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn save(
        &self,
        record: SellerApplication,
        expected: ApplicationStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&record.id).ok_or(RepositoryError::NotFound)?;
        if stored.status != expected {
            return Err(RepositoryError::StaleWrite);
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn list(
        &self,
        status: Option<ApplicationStatus>,
        page: PageRequest,
    ) -> Result<Page<SellerApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut matching: Vec<SellerApplication> = guard
            .values()
            .filter(|record| status.map_or(true, |status| record.status == status))
            .cloned()
            .collect();
        newest_first(&mut matching);

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect();

        Ok(Page {
            items,
            total,
            offset: page.offset,
            limit: page.limit,
        })
    }

    fn history_for(&self, applicant: &UserId) -> Result<Vec<SellerApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut matching: Vec<SellerApplication> = guard
            .values()
            .filter(|record| &record.applicant_id == applicant)
            .cloned()
            .collect();
        newest_first(&mut matching);
        Ok(matching)
    }
}

/// Repository that loses the first compare-and-set race: another reviewer's
/// rejection lands between the load and the save.
pub(super) struct ContendedRepository {
    pub(super) inner: MemoryRepository,
    raced: AtomicBool,
}

impl ContendedRepository {
    pub(super) fn new(inner: MemoryRepository) -> Self {
        Self {
            inner,
            raced: AtomicBool::new(false),
        }
    }
}

impl ApplicationRepository for ContendedRepository {
    fn insert(&self, record: SellerApplication) -> Result<SellerApplication, RepositoryError> {
        self.inner.insert(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<SellerApplication>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn save(
        &self,
        record: SellerApplication,
        expected: ApplicationStatus,
    ) -> Result<(), RepositoryError> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            let mut guard = self.inner.records.lock().expect("repository mutex poisoned");
            if let Some(stored) = guard.get_mut(&record.id) {
                stored.status = ApplicationStatus::Rejected;
                stored.reviewer_id = Some(UserId("admin-other".to_string()));
                stored.reviewed_at = Some(Utc::now());
                stored.admin_notes = Some("documents illegible".to_string());
            }
            return Err(RepositoryError::StaleWrite);
        }
        self.inner.save(record, expected)
    }

    fn list(
        &self,
        status: Option<ApplicationStatus>,
        page: PageRequest,
    ) -> Result<Page<SellerApplication>, RepositoryError> {
        self.inner.list(status, page)
    }

    fn history_for(&self, applicant: &UserId) -> Result<Vec<SellerApplication>, RepositoryError> {
        self.inner.history_for(applicant)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDirectory {
    roles: Arc<Mutex<HashMap<UserId, AccountRole>>>,
}

impl MemoryDirectory {
    pub(super) fn with_account(self, user: &str, role: AccountRole) -> Self {
        self.roles
            .lock()
            .expect("directory mutex poisoned")
            .insert(UserId(user.to_string()), role);
        self
    }

    pub(super) fn add_account(&self, user: &str, role: AccountRole) {
        self.roles
            .lock()
            .expect("directory mutex poisoned")
            .insert(UserId(user.to_string()), role);
    }

    pub(super) fn role(&self, user: &str) -> Option<AccountRole> {
        self.roles
            .lock()
            .expect("directory mutex poisoned")
            .get(&UserId(user.to_string()))
            .copied()
    }
}

impl RoleStore for MemoryDirectory {
    fn role_of(&self, user: &UserId) -> Result<Option<AccountRole>, RoleError> {
        Ok(self
            .roles
            .lock()
            .expect("directory mutex poisoned")
            .get(user)
            .copied())
    }

    fn set_role(&self, user: &UserId, role: AccountRole) -> Result<(), RoleError> {
        let mut guard = self.roles.lock().expect("directory mutex poisoned");
        if !guard.contains_key(user) {
            return Err(RoleError::NotFound(user.clone()));
        }
        guard.insert(user.clone(), role);
        Ok(())
    }
}

/// Role store whose writes fail, for exercising the approval rollback.
pub(super) struct FlakyDirectory;

impl RoleStore for FlakyDirectory {
    fn role_of(&self, _user: &UserId) -> Result<Option<AccountRole>, RoleError> {
        Ok(Some(AccountRole::Buyer))
    }

    fn set_role(&self, _user: &UserId, _role: AccountRole) -> Result<(), RoleError> {
        Err(RoleError::Unavailable("user store offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDocuments {
    files: Arc<Mutex<HashMap<String, StoredDocument>>>,
    sequence: Arc<AtomicU64>,
}

impl MemoryDocuments {
    pub(super) fn seeded() -> Self {
        let store = Self::default();
        for (key, name) in [
            ("doc-identity", "passport.pdf"),
            ("doc-registry", "registry-extract.pdf"),
            ("doc-tax", "tax-certificate.pdf"),
        ] {
            store
                .files
                .lock()
                .expect("document mutex poisoned")
                .insert(
                    key.to_string(),
                    StoredDocument {
                        key: key.to_string(),
                        file_name: name.to_string(),
                        content_type: "application/pdf".to_string(),
                        bytes: format!("%PDF {name}").into_bytes(),
                    },
                );
        }
        store
    }
}

impl DocumentStore for MemoryDocuments {
    fn store(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DocumentError> {
        let key = format!("doc-{:04}", self.sequence.fetch_add(1, Ordering::Relaxed));
        self.files
            .lock()
            .expect("document mutex poisoned")
            .insert(
                key.clone(),
                StoredDocument {
                    key: key.clone(),
                    file_name: file_name.to_string(),
                    content_type: content_type.to_string(),
                    bytes,
                },
            );
        Ok(key)
    }

    fn retrieve(&self, key: &str) -> Result<StoredDocument, DocumentError> {
        self.files
            .lock()
            .expect("document mutex poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), DocumentError> {
        self.files
            .lock()
            .expect("document mutex poisoned")
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| DocumentError::NotFound(key.to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<ApplicationNotice>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<ApplicationNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

impl NotificationSink for MemoryNotifications {
    fn enqueue(&self, notice: ApplicationNotice) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// Sink that always fails, for verifying decisions survive dropped notices.
pub(super) struct DeafNotifications;

impl NotificationSink for DeafNotifications {
    fn enqueue(&self, _notice: ApplicationNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Transport(
            "notification queue unreachable".to_string(),
        ))
    }
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn application_router_with_service(service: MemoryReviewService) -> axum::Router {
    crate::workflows::onboarding::applications::router::application_router(Arc::new(service))
}

pub(super) type MemoryReviewService =
    ReviewService<MemoryRepository, MemoryDirectory, MemoryDocuments, MemoryNotifications>;

pub(super) fn build_service() -> (
    MemoryReviewService,
    Arc<MemoryRepository>,
    Arc<MemoryDirectory>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let directory = Arc::new(
        MemoryDirectory::default()
            .with_account("buyer-olive", AccountRole::Buyer)
            .with_account("buyer-theo", AccountRole::Buyer)
            .with_account("seller-sam", AccountRole::Seller)
            .with_account("admin-ada", AccountRole::Administrator),
    );
    let documents = Arc::new(MemoryDocuments::seeded());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = ReviewService::new(
        repository.clone(),
        directory.clone(),
        documents,
        notifications.clone(),
        PageLimits::default(),
    );
    (service, repository, directory, notifications)
}
