//! # 仪表盘处理器

use axum::extract::{Extension, State};
use axum::response::Response;
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::management::response;
use crate::management::server::AppState;
use crate::management::services::dashboard::DashboardService;
use crate::manage_error;

pub async fn summary(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    match DashboardService::new(&state).summary(&auth).await {
        Ok(summary) => response::success(summary),
        Err(err) => manage_error!(err),
    }
}
