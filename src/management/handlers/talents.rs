//! # 人才处理器

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::response::Response;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error;
use crate::management::handlers::{invalid_body, invalid_id};
use crate::management::response;
use crate::management::server::AppState;
use crate::management::services::talents::{
    CreateTalentRequest, TalentListQuery, TalentsService, UpdateTalentRequest,
};
use crate::management::services::uploads::{ClaimedUpload, UploadService};
use crate::manage_error;
use crate::upload::UploadType;

/// 认领请求引用的证书上传，未携带 `upload_id` 时不附证书
async fn claim_certificate(
    uploads: &UploadService,
    auth: &AuthContext,
    upload_id: Option<Uuid>,
) -> error::Result<Option<ClaimedUpload>> {
    match upload_id {
        Some(upload_id) => uploads
            .claim(upload_id, auth.user_id, UploadType::TalentCertificate)
            .await
            .map(Some),
        None => Ok(None),
    }
}

/// 写入失败时归还已认领的上传
async fn release_if_failed(uploads: &UploadService, claimed: Option<ClaimedUpload>, failed: bool) {
    if let (true, Some(claimed)) = (failed, claimed) {
        uploads.release(claimed).await;
    }
}

pub async fn list_my_talents(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Query(query): Query<TalentListQuery>,
) -> Response {
    match TalentsService::new(&state).list_own(&auth, query).await {
        Ok(page) => response::page(page),
        Err(err) => manage_error!(err),
    }
}

pub async fn create_talent(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    payload: Result<Json<CreateTalentRequest>, JsonRejection>,
) -> Response {
    let Json(mut request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(&rejection),
    };
    let uploads = UploadService::new(&state);
    let claimed = match claim_certificate(&uploads, &auth, request.upload_id).await {
        Ok(claimed) => claimed,
        Err(err) => return manage_error!(err),
    };
    request.certificate_url = claimed.as_ref().map(|c| c.file_url.clone());

    let result = TalentsService::new(&state).create(&auth, request).await;
    release_if_failed(&uploads, claimed, result.is_err()).await;
    match result {
        Ok(talent) => response::created(
            talent,
            "Talenta berhasil ditambahkan dan menunggu verifikasi",
        ),
        Err(err) => manage_error!(err),
    }
}

pub async fn update_talent(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateTalentRequest>, JsonRejection>,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    let Json(mut request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(&rejection),
    };
    let uploads = UploadService::new(&state);
    let claimed = match claim_certificate(&uploads, &auth, request.upload_id).await {
        Ok(claimed) => claimed,
        Err(err) => return manage_error!(err),
    };
    request.certificate_url = claimed.as_ref().map(|c| c.file_url.clone());

    let result = TalentsService::new(&state).update(&auth, id, request).await;
    release_if_failed(&uploads, claimed, result.is_err()).await;
    match result {
        Ok(talent) => response::success_with_message(
            talent,
            "Talenta berhasil diperbarui dan menunggu verifikasi ulang",
        ),
        Err(err) => manage_error!(err),
    }
}

pub async fn delete_talent(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    match TalentsService::new(&state).delete(&auth, id).await {
        Ok(()) => response::success_without_data("Talenta berhasil dihapus"),
        Err(err) => manage_error!(err),
    }
}

pub async fn list_talents(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Query(query): Query<TalentListQuery>,
) -> Response {
    match TalentsService::new(&state).list(&auth, query).await {
        Ok(page) => response::page(page),
        Err(err) => manage_error!(err),
    }
}

pub async fn get_talent(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    match TalentsService::new(&state).get(&auth, id).await {
        Ok(talent) => response::success(talent),
        Err(err) => manage_error!(err),
    }
}
