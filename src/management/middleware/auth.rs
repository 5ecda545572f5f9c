//! # 认证中间件
//!
//! 从请求头中提取 Bearer 访问令牌，校验后把 `AuthContext` 注入请求扩展。

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{AuthService, AuthUtils};
use crate::error::AppError;
use crate::management::response;
use crate::management::server::AppState;
use crate::{
    ldebug,
    logging::{LogComponent, LogStage},
};

/// Axum 认证中间件
pub async fn auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let Some(auth_header) = AuthUtils::extract_authorization_header(request.headers()) else {
        return response::app_error(AppError::unauthorized("Token tidak ditemukan"));
    };

    let Some(token) = AuthUtils::extract_bearer_token(auth_header) else {
        return response::app_error(AppError::unauthorized("Format token tidak valid"));
    };

    match AuthService::new(&state).authenticate(token) {
        Ok(auth_context) => {
            request.extensions_mut().insert(Arc::new(auth_context));
            next.run(request).await
        }
        Err(err) => {
            ldebug!(
                "system",
                LogStage::Authentication,
                LogComponent::Auth,
                "token_rejected",
                &format!("访问令牌校验失败: {err}")
            );
            response::app_error(AppError::unauthorized(
                "Token tidak valid atau sudah expired",
            ))
        }
    }
}
