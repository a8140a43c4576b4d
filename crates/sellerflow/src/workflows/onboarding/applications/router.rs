use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::documents::{DocumentError, DocumentSelector, DocumentStore};
use super::domain::{ApplicationId, ApplicationStatus, ApplicationSubmission, UserId};
use super::repository::{ApplicationRepository, NotificationSink, RepositoryError};
use super::roles::{RoleError, RoleStore};
use super::service::{ReviewError, ReviewService};

/// Router builder exposing the applicant and administrator HTTP surface of
/// the review workflow.
pub fn application_router<R, S, D, N>(service: Arc<ReviewService<R, S, D, N>>) -> Router
where
    R: ApplicationRepository + 'static,
    S: RoleStore + 'static,
    D: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/seller/applications",
            post(submit_handler::<R, S, D, N>).get(list_handler::<R, S, D, N>),
        )
        .route(
            "/api/v1/seller/applications/:application_id",
            get(detail_handler::<R, S, D, N>),
        )
        .route(
            "/api/v1/seller/applications/:application_id/approve",
            post(approve_handler::<R, S, D, N>),
        )
        .route(
            "/api/v1/seller/applications/:application_id/reject",
            post(reject_handler::<R, S, D, N>),
        )
        .route(
            "/api/v1/seller/applications/:application_id/documents/id_document",
            get(id_document_handler::<R, S, D, N>),
        )
        .route(
            "/api/v1/seller/applications/:application_id/documents/additional_documents/:index",
            get(additional_document_handler::<R, S, D, N>),
        )
        .route(
            "/api/v1/seller/applicants/:applicant_id/applications",
            get(history_handler::<R, S, D, N>),
        )
        .with_state(service)
}

/// Administrator decision payload. The reviewer identity is always an
/// explicit request field, never ambient session state.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub reviewer_id: UserId,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

/// HTTP status for each review engine failure.
pub fn review_status(err: &ReviewError) -> StatusCode {
    match err {
        ReviewError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ReviewError::AlreadyReviewed { .. } => StatusCode::CONFLICT,
        ReviewError::PromotionIncomplete { .. } => StatusCode::SERVICE_UNAVAILABLE,
        ReviewError::Repository(RepositoryError::PendingExists)
        | ReviewError::Repository(RepositoryError::StaleWrite) => StatusCode::CONFLICT,
        ReviewError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ReviewError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ReviewError::Role(RoleError::NotFound(_)) => StatusCode::NOT_FOUND,
        ReviewError::Role(RoleError::AdministratorGuard(_)) => StatusCode::CONFLICT,
        ReviewError::Role(RoleError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        ReviewError::Documents(DocumentError::NotFound(_)) => StatusCode::NOT_FOUND,
        ReviewError::Documents(DocumentError::Unavailable(_))
        | ReviewError::Documents(DocumentError::Timeout) => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(err: ReviewError) -> Response {
    let status = review_status(&err);
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn submit_handler<R, S, D, N>(
    State(service): State<Arc<ReviewService<R, S, D, N>>>,
    Json(submission): Json<ApplicationSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: RoleStore + 'static,
    D: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    match service.submit(submission) {
        Ok(record) => (StatusCode::ACCEPTED, Json(record.status_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<R, S, D, N>(
    State(service): State<Arc<ReviewService<R, S, D, N>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: RoleStore + 'static,
    D: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => match ApplicationStatus::parse_label(raw) {
            Some(status) => Some(status),
            None => {
                return error_response(ReviewError::Validation(format!(
                    "unknown status filter '{raw}'"
                )))
            }
        },
    };

    match service.list(status, query.offset, query.limit) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn detail_handler<R, S, D, N>(
    State(service): State<Arc<ReviewService<R, S, D, N>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: RoleStore + 'static,
    D: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    match service.get(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn history_handler<R, S, D, N>(
    State(service): State<Arc<ReviewService<R, S, D, N>>>,
    Path(applicant_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: RoleStore + 'static,
    D: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    match service.history_for(&UserId(applicant_id)) {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.status_view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn approve_handler<R, S, D, N>(
    State(service): State<Arc<ReviewService<R, S, D, N>>>,
    Path(application_id): Path<String>,
    Json(decision): Json<DecisionRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: RoleStore + 'static,
    D: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    let id = ApplicationId(application_id);
    match service.approve(&id, &decision.reviewer_id, decision.notes) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reject_handler<R, S, D, N>(
    State(service): State<Arc<ReviewService<R, S, D, N>>>,
    Path(application_id): Path<String>,
    Json(decision): Json<DecisionRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: RoleStore + 'static,
    D: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    let id = ApplicationId(application_id);
    let notes = decision.notes.as_deref().unwrap_or("");
    match service.reject(&id, &decision.reviewer_id, notes) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn id_document_handler<R, S, D, N>(
    State(service): State<Arc<ReviewService<R, S, D, N>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: RoleStore + 'static,
    D: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    let id = ApplicationId(application_id);
    match service.download_document(&id, DocumentSelector::IdDocument) {
        Ok(document) => document_response(document),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn additional_document_handler<R, S, D, N>(
    State(service): State<Arc<ReviewService<R, S, D, N>>>,
    Path((application_id, index)): Path<(String, usize)>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: RoleStore + 'static,
    D: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    let id = ApplicationId(application_id);
    match service.download_document(&id, DocumentSelector::Additional(index)) {
        Ok(document) => document_response(document),
        Err(err) => error_response(err),
    }
}

fn document_response(document: super::documents::StoredDocument) -> Response {
    let content_type = document.serve_content_type().to_string();
    let disposition = format!("attachment; filename=\"{}\"", document.file_name);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response()
}
