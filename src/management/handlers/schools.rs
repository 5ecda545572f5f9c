//! # 学校管理处理器

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
use crate::management::services::schools::{
    CreateSchoolRequest, SchoolListQuery, SchoolsService, UpdateSchoolRequest,
};
use crate::management::services::users::UserListQuery;
use crate::manage_error;

pub async fn list(State(state): State<AppState>, Query(query): Query<SchoolListQuery>) -> Response {
    match SchoolsService::new(&state).list(&query).await {
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
    match SchoolsService::new(&state).get(&auth, id).await {
        Ok(school) => response::success(school),
        Err(err) => manage_error!(err),
    }
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateSchoolRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(&rejection),
    };
    match SchoolsService::new(&state).create(request).await {
        Ok(school) => response::created(school, "Sekolah berhasil ditambahkan"),
        Err(err) => manage_error!(err),
    }
}

pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateSchoolRequest>, JsonRejection>,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(&rejection),
    };
    match SchoolsService::new(&state).update(id, request).await {
        Ok(school) => response::success_with_message(school, "Sekolah berhasil diperbarui"),
        Err(err) => manage_error!(err),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    match SchoolsService::new(&state).delete(id).await {
        Ok(()) => response::success_without_data("Sekolah berhasil dihapus"),
        Err(err) => manage_error!(err),
    }
}

/// 学校下的用户列表
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    path: Result<Path<Uuid>, PathRejection>,
    Query(query): Query<UserListQuery>,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    match SchoolsService::new(&state).get_users(&auth, id, query).await {
        Ok(page) => response::page(page),
        Err(err) => manage_error!(err),
    }
}
