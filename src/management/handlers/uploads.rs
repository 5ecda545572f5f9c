//! # 上传处理器

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, State};
use axum::response::Response;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::management::handlers::{invalid_body, invalid_id};
use crate::management::response;
use crate::management::server::AppState;
use crate::management::services::uploads::{PresignRequest, UploadService};
use crate::manage_error;

pub async fn presign(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    payload: Result<Json<PresignRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(&rejection),
    };
    match UploadService::new(&state).presign(&auth, request).await {
        Ok(presigned) => response::success(presigned),
        Err(err) => manage_error!(err),
    }
}

pub async fn confirm(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(upload_id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    match UploadService::new(&state).confirm(&auth, upload_id).await {
        Ok(confirmed) => response::success_with_message(confirmed, "Upload berhasil dikonfirmasi"),
        Err(err) => manage_error!(err),
    }
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(upload_id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    match UploadService::new(&state).cancel(&auth, upload_id).await {
        Ok(()) => response::success_without_data("Upload dibatalkan"),
        Err(err) => manage_error!(err),
    }
}
