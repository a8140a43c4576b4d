use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for seller applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for marketplace user accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity document classifications accepted at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdDocumentType {
    NationalId,
    Passport,
    DriversLicense,
}

impl IdDocumentType {
    pub const fn label(self) -> &'static str {
        match self {
            IdDocumentType::NationalId => "national_id",
            IdDocumentType::Passport => "passport",
            IdDocumentType::DriversLicense => "drivers_license",
        }
    }
}

/// Lifecycle of a seller application. `Approved` and `Rejected` are
/// terminal; the review engine is the only writer of this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }

    pub fn parse_label(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ApplicationStatus::Pending),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }
}

/// Applicant-provided payload used to open a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub applicant_id: UserId,
    pub business_description: String,
    #[serde(default)]
    pub business_type: Option<String>,
    pub id_document_type: IdDocumentType,
    /// Opaque key into the document store; required.
    pub id_document_ref: String,
    /// Ordered supporting-document keys; may be empty.
    #[serde(default)]
    pub additional_document_refs: Vec<String>,
}

/// Durable seller application record.
///
/// `status`, `reviewer_id`, and `reviewed_at` are written exactly once, by
/// the review engine; records are never deleted so the decision history
/// stays auditable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerApplication {
    pub id: ApplicationId,
    pub applicant_id: UserId,
    pub business_description: String,
    pub business_type: Option<String>,
    pub id_document_type: IdDocumentType,
    pub id_document_ref: String,
    pub additional_document_refs: Vec<String>,
    pub status: ApplicationStatus,
    /// Absent while pending; mandatory content on rejection.
    pub admin_notes: Option<String>,
    pub reviewer_id: Option<UserId>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Audit marker stamped when an approval had to be rolled back because
    /// the role promotion did not complete.
    pub failed_promotion_at: Option<DateTime<Utc>>,
}

impl SellerApplication {
    /// One-line outcome summary shown to the applicant.
    pub fn decision_summary(&self) -> String {
        let notes = self.admin_notes.as_deref().filter(|notes| !notes.is_empty());
        match (self.status, notes) {
            (ApplicationStatus::Pending, _) => "awaiting review".to_string(),
            (ApplicationStatus::Approved, Some(notes)) => format!("approved: {notes}"),
            (ApplicationStatus::Approved, None) => "approved".to_string(),
            (ApplicationStatus::Rejected, Some(notes)) => format!("rejected: {notes}"),
            (ApplicationStatus::Rejected, None) => "rejected".to_string(),
        }
    }

    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.id.clone(),
            status: self.status.label(),
            decision_summary: self.decision_summary(),
            submitted_at: self.submitted_at,
            reviewed_at: self.reviewed_at,
            admin_notes: self.admin_notes.clone(),
        }
    }
}

/// Sanitized representation of an application for applicant-facing
/// responses: final outcome and notes only, never internal failures.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub status: &'static str,
    pub decision_summary: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
}
