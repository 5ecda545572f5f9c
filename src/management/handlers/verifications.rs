//! # 审核处理器

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::response::Response;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::management::handlers::{invalid_body, invalid_id};
use crate::management::response;
use crate::management::server::AppState;
use crate::management::services::talents::{
    BatchApproveRequest, BatchRejectRequest, RejectTalentRequest, TalentListQuery,
    TalentsService,
};
use crate::manage_error;

/// 待审核人才
pub async fn list_pending(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Query(query): Query<TalentListQuery>,
) -> Response {
    match TalentsService::new(&state).list_pending(&auth, query).await {
        Ok(page) => response::page(page),
        Err(err) => manage_error!(err),
    }
}

pub async fn approve(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    match TalentsService::new(&state).approve(&auth, id).await {
        Ok(talent) => response::success_with_message(talent, "Talenta berhasil disetujui"),
        Err(err) => manage_error!(err),
    }
}

pub async fn reject(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<RejectTalentRequest>, JsonRejection>,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(&rejection),
    };
    match TalentsService::new(&state)
        .reject(&auth, id, request.rejection_reason)
        .await
    {
        Ok(talent) => response::success_with_message(talent, "Talenta berhasil ditolak"),
        Err(err) => manage_error!(err),
    }
}

pub async fn batch_approve(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    payload: Result<Json<BatchApproveRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(&rejection),
    };
    match TalentsService::new(&state)
        .batch_approve(&auth, request.talent_ids)
        .await
    {
        Ok(result) => {
            let message = format!("{} talenta berhasil disetujui", result.success_count);
            response::success_with_message(result, &message)
        }
        Err(err) => manage_error!(err),
    }
}

pub async fn batch_reject(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    payload: Result<Json<BatchRejectRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(&rejection),
    };
    match TalentsService::new(&state)
        .batch_reject(&auth, request.talent_ids, request.rejection_reason)
        .await
    {
        Ok(result) => {
            let message = format!("{} talenta berhasil ditolak", result.success_count);
            response::success_with_message(result, &message)
        }
        Err(err) => manage_error!(err),
    }
}
