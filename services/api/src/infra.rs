use metrics_exporter_prometheus::PrometheusHandle;
use sellerflow::workflows::onboarding::applications::{
    AccountRole, ApplicationId, ApplicationNotice, ApplicationRepository, ApplicationStatus,
    DocumentError, DocumentStore, NotificationError, NotificationSink, Page, PageRequest,
    RepositoryError, RoleError, RoleStore, SellerApplication, StoredDocument, UserId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, SellerApplication>>>,
}

fn newest_first(records: &mut [SellerApplication]) {
    records.sort_by(|a, b| {
        b.submitted_at
            .cmp(&a.submitted_at)
            .then_with(|| b.id.0.cmp(&a.id.0))
    });
}

impl ApplicationRepository for InMemoryApplicationRepository {
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryUserDirectory {
    roles: Arc<Mutex<HashMap<UserId, AccountRole>>>,
}

impl InMemoryUserDirectory {
    pub(crate) fn add_account(&self, user: &str, role: AccountRole) {
        self.roles
            .lock()
            .expect("directory mutex poisoned")
            .insert(UserId(user.to_string()), role);
    }

    pub(crate) fn role(&self, user: &str) -> Option<AccountRole> {
        self.roles
            .lock()
            .expect("directory mutex poisoned")
            .get(&UserId(user.to_string()))
            .copied()
    }
}

impl RoleStore for InMemoryUserDirectory {
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryDocumentStore {
    files: Arc<Mutex<HashMap<String, StoredDocument>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryDocumentStore {
    /// Store a file, deriving the content type from its name.
    pub(crate) fn store_named(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, DocumentError> {
        let content_type = mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        self.store(file_name, &content_type, bytes)
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn store(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DocumentError> {
        let key = format!("doc-{:06}", self.sequence.fetch_add(1, Ordering::Relaxed));
        self.files.lock().expect("document mutex poisoned").insert(
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
pub(crate) struct InMemoryNotificationQueue {
    events: Arc<Mutex<Vec<ApplicationNotice>>>,
}

impl InMemoryNotificationQueue {
    pub(crate) fn events(&self) -> Vec<ApplicationNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

impl NotificationSink for InMemoryNotificationQueue {
    fn enqueue(&self, notice: ApplicationNotice) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}
