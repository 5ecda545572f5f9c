//! # 通知处理器

use axum::extract::rejection::PathRejection;
use axum::extract::{Extension, Path, Query, State};
use axum::response::Response;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::management::handlers::invalid_id;
use crate::management::response;
use crate::management::server::AppState;
use crate::management::services::notifications::{NotificationListQuery, NotificationsService};
use crate::manage_error;

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Query(query): Query<NotificationListQuery>,
) -> Response {
    match NotificationsService::new(&state).list(&auth, &query).await {
        Ok(page) => response::page(page),
        Err(err) => manage_error!(err),
    }
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    match NotificationsService::new(&state).unread_count(&auth).await {
        Ok(count) => response::success(count),
        Err(err) => manage_error!(err),
    }
}

pub async fn mark_as_read(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_id(&rejection),
    };
    match NotificationsService::new(&state).mark_as_read(&auth, id).await {
        Ok(notification) => {
            response::success_with_message(notification, "Notifikasi ditandai sudah dibaca")
        }
        Err(err) => manage_error!(err),
    }
}

pub async fn mark_all_as_read(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    match NotificationsService::new(&state).mark_all_as_read(&auth).await {
        Ok(marked) => response::success_with_message(
            marked,
            "Semua notifikasi ditandai sudah dibaca",
        ),
        Err(err) => manage_error!(err),
    }
}
