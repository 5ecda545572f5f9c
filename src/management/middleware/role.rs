//! # 角色中间件
//!
//! 路由级角色白名单，需放在认证中间件之后。

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use entity::enums::UserRole;
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::auth::permissions::{ROLE_DENIED_MESSAGE, role_allowed};
use crate::error::AppError;
use crate::management::response;
use crate::{
    logging::{LogComponent, LogStage},
    lwarn,
};

/// 角色不在 `allowed` 内时返回 403
///
/// 用法：`middleware::from_fn_with_state(ADMINS, require_roles)`
pub async fn require_roles(
    State(allowed): State<&'static [UserRole]>,
    request: Request,
    next: Next,
) -> Response {
    let Some(auth) = request.extensions().get::<Arc<AuthContext>>() else {
        return response::app_error(AppError::unauthorized("Token tidak ditemukan"));
    };
    if !role_allowed(auth.role, allowed) {
        lwarn!(
            "system",
            LogStage::Authorization,
            LogComponent::Auth,
            "role_denied",
            "角色不允许访问该路由",
            user_id = %auth.user_id,
            role = %auth.role,
            path = %request.uri().path()
        );
        return response::app_error(AppError::forbidden(ROLE_DENIED_MESSAGE));
    }
    next.run(request).await
}
