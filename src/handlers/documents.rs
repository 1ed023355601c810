use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain;
use crate::entities::document::{self, DocumentKind, DocumentStatus};
use crate::error::{AppError, AppResult};
use crate::extract::{QueryParams, ValidatedJson};
use crate::response::ApiResponse;
use crate::storage::content_type_for;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ApprovedQuery {
    pub kind: DocumentKind,
}

#[derive(Debug, Serialize)]
pub struct ApprovedResponse {
    pub kind: DocumentKind,
    pub approved: bool,
}

#[derive(Debug, Deserialize)]
pub struct DocumentListQuery {
    pub status: Option<DocumentStatus>,
    pub kind: Option<DocumentKind>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewDocumentRequest {
    pub status: DocumentStatus,
}

/// Documents the caller has uploaded, newest first
pub async fn my_documents(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<ApiResponse<Vec<document::Model>>> {
    let documents = document::Entity::find()
        .filter(document::Column::UserId.eq(claims.sub))
        .order_by_desc(document::Column::UploadedAt)
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(documents))
}

/// Whether the caller has an approved document of the given kind
pub async fn check_approved(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    QueryParams(query): QueryParams<ApprovedQuery>,
) -> AppResult<ApiResponse<ApprovedResponse>> {
    let approved = document::Entity::find()
        .filter(document::Column::UserId.eq(claims.sub))
        .filter(document::Column::Kind.eq(query.kind))
        .filter(document::Column::Status.eq(DocumentStatus::Approved))
        .count(&state.db)
        .await?
        > 0;

    Ok(ApiResponse::ok(ApprovedResponse {
        kind: query.kind,
        approved,
    }))
}

/// The uploaded file of a document, for its owner or an admin
pub async fn document_file(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(document_id): Path<Uuid>,
) -> AppResult<Response> {
    let document = document::Entity::find_by_id(document_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    if !claims.is_admin() && document.user_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only view your own documents".to_string(),
        ));
    }

    let path = std::path::Path::new(&document.file_path);
    let bytes = state.storage.read(path).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(path)),
            (header::CACHE_CONTROL, "private, no-store"),
        ],
        bytes,
    )
        .into_response())
}

/// Review queue (admin)
pub async fn list_documents(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<DocumentListQuery>,
) -> AppResult<ApiResponse<Vec<document::Model>>> {
    let mut select = document::Entity::find().order_by_asc(document::Column::UploadedAt);
    if let Some(status) = query.status {
        select = select.filter(document::Column::Status.eq(status));
    }
    if let Some(kind) = query.kind {
        select = select.filter(document::Column::Kind.eq(kind));
    }

    Ok(ApiResponse::ok(select.all(&state.db).await?))
}

/// Approve or reject a pending document (admin)
pub async fn review_document(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(document_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReviewDocumentRequest>,
) -> AppResult<ApiResponse<document::Model>> {
    let txn = state.db.begin().await?;

    let existing = document::Entity::find_by_id(document_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    let status = domain::document::review(existing.status, payload.status)?;

    let mut active: document::ActiveModel = existing.into();
    active.status = Set(status);
    active.reviewed_by = Set(Some(claims.sub));
    active.reviewed_at = Set(Some(Utc::now().into()));
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        document_id = %updated.id,
        reviewer_id = %claims.sub,
        status = ?updated.status,
        "Document reviewed"
    );

    Ok(ApiResponse::ok(updated).with_message("Document reviewed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use sea_orm::{DbBackend, MockDatabase};

    use crate::entities::user::UserRole;
    use crate::storage::UploadCategory;
    use crate::test_support::{claims, mock_state, state_with};

    fn license(user_id: Uuid, file_path: String) -> document::Model {
        let id = Uuid::new_v4();
        document::Model {
            id,
            user_id,
            kind: DocumentKind::DrivingLicense,
            file_path,
            file_url: format!("http://localhost:5000/api/documents/{}/file", id),
            status: DocumentStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            uploaded_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_document_file_served_to_owner_and_admin() {
        let files = mock_state().storage;
        let stored = files
            .save(UploadCategory::Licenses, "png", b"license scan")
            .await
            .unwrap();
        let owner = Uuid::new_v4();
        let doc = license(owner, stored.path.to_string_lossy().into_owned());

        for viewer in [claims(owner, UserRole::Driver), claims(Uuid::new_v4(), UserRole::Admin)] {
            let state = state_with(
                MockDatabase::new(DbBackend::Postgres)
                    .append_query_results([[doc.clone()]])
                    .into_connection(),
            );
            let response = document_file(State(state), Extension(viewer), Path(doc.id))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
            assert_eq!(response.headers()[header::CACHE_CONTROL], "private, no-store");
        }

        files.remove(&stored).await;
    }

    #[tokio::test]
    async fn test_document_file_hidden_from_other_users() {
        let doc = license(Uuid::new_v4(), "/nowhere/license.png".to_string());
        let state = state_with(
            MockDatabase::new(DbBackend::Postgres)
                .append_query_results([[doc.clone()]])
                .into_connection(),
        );

        let err = document_file(
            State(state),
            Extension(claims(Uuid::new_v4(), UserRole::Traveler)),
            Path(doc.id),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
