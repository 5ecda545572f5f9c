//! # 用户管理处理器

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::AppError;
use crate::management::handlers::{invalid_body, invalid_id};
use crate::management::response;
use crate::management::server::AppState;
use crate::management::services::users::{
    ChangePasswordRequest, CreateUserRequest, UpdateProfileRequest, UpdateUserRequest,
    UserListQuery, UsersService,
};
use crate::management::services::uploads::UploadService;
use crate::manage_error;
use crate::upload::UploadType;

/// 头像更新请求，引用已确认的头像上传
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePhotoRequest {
    pub upload_id: Option<Uuid>,
}

pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    match UsersService::new(&state).get_me(&auth).await {
        Ok(user) => response::success(user),
        Err(err) => manage_error!(err),
    }
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(&rejection),
    };
    match UsersService::new(&state).update_profile(&auth, request).await {
        Ok(user) => response::success_with_message(user, "Profil berhasil diperbarui"),
        Err(err) => manage_error!(err),
    }
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(&rejection),
    };
    match UsersService::new(&state).change_password(&auth, &request).await {
        Ok(()) => response::success_without_data("Password berhasil diubah"),
        Err(err) => manage_error!(err),
    }
}

pub async fn update_photo(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    payload: Result<Json<UpdatePhotoRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(&rejection),
    };

    let Some(upload_id) = request.upload_id else {
        return manage_error!(AppError::field("upload_id", "Foto wajib diisi"));
    };
    let uploads = UploadService::new(&state);
    let claimed = match uploads
        .claim(upload_id, auth.user_id, UploadType::ProfilePhoto)
        .await
    {
        Ok(claimed) => claimed,
        Err(err) => return manage_error!(err),
    };

    match UsersService::new(&state)
        .update_photo(&auth, Some(claimed.file_url.clone()))
        .await
    {
        Ok(user) => response::success_with_message(user, "Foto profil berhasil diperbarui"),
        Err(err) => {
            uploads.release(claimed).await;
            manage_error!(err)
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Query(query): Query<UserListQuery>,
) -> Response {
    match UsersService::new(&state).list(&auth, query).await {
        Ok(page) => response::page(page),
        Err(err) => manage_error!(err),
    }
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    match UsersService::new(&state).get(&auth, id).await {
        Ok(user) => response::success(user),
        Err(err) => manage_error!(err),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(&rejection),
    };
    match UsersService::new(&state).create(&auth, request).await {
        Ok(user) => response::created(user, "User berhasil ditambahkan"),
        Err(err) => manage_error!(err),
    }
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(&rejection),
    };
    match UsersService::new(&state).update(&auth, id, request).await {
        Ok(user) => response::success_with_message(user, "User berhasil diperbarui"),
        Err(err) => manage_error!(err),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    match UsersService::new(&state).delete(&auth, id).await {
        Ok(()) => response::success_without_data("User berhasil dihapus"),
        Err(err) => manage_error!(err),
    }
}

pub async fn activate(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    set_active(&state, &auth, path, true, "User berhasil diaktifkan").await
}

pub async fn deactivate(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    set_active(&state, &auth, path, false, "User berhasil dinonaktifkan").await
}

async fn set_active(
    state: &AppState,
    auth: &AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
    is_active: bool,
    message: &str,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    match UsersService::new(state).set_active(auth, id, is_active).await {
        Ok(user) => response::success_with_message(user, message),
        Err(err) => manage_error!(err),
    }
}
