//! # 认证处理器
//!
//! 刷新令牌既在响应体中返回，也写入 HttpOnly cookie；刷新与注销时两处都接受。

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{AuthContext, AuthService, TokenPair};
use crate::error::AppError;
use crate::management::handlers::invalid_body;
use crate::management::response;
use crate::management::server::AppState;
use crate::management::services::shared::Validator;
use crate::management::services::users::{UserResponse, UsersService};
use crate::manage_error;

pub const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    pub revoked_sessions: u64,
}

/// 登录
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body(&rejection),
    };

    let mut v = Validator::new();
    v.email("email", &request.email);
    v.check(!request.password.is_empty(), "password", "Password wajib diisi");
    if let Err(err) = v.finish() {
        return manage_error!(err);
    }

    let (tokens, user) = match AuthService::new(&state)
        .login(&request.email, &request.password)
        .await
    {
        Ok(result) => result,
        Err(err) => return manage_error!(err),
    };

    let user = match UsersService::new(&state).to_response(user).await {
        Ok(user) => user,
        Err(err) => return manage_error!(err),
    };

    let cookie = refresh_cookie(&state, &tokens.refresh_token);
    with_cookie(
        response::success_with_message(LoginResponse { tokens, user }, "Login berhasil"),
        cookie,
    )
}

/// 使用刷新令牌换取新的令牌对
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<RefreshRequest>>,
) -> Response {
    let Some(raw_token) = refresh_token_from(&headers, payload) else {
        return manage_error!(AppError::field(
            "refresh_token",
            "Refresh token wajib diisi"
        ));
    };

    match AuthService::new(&state).refresh(&raw_token).await {
        Ok(tokens) => {
            let cookie = refresh_cookie(&state, &tokens.refresh_token);
            with_cookie(response::success(tokens), cookie)
        }
        Err(err) => manage_error!(err),
    }
}

/// 注销当前会话，令牌不存在时同样视为成功
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<RefreshRequest>>,
) -> Response {
    if let Some(raw_token) = refresh_token_from(&headers, payload)
        && let Err(err) = AuthService::new(&state).logout(&raw_token).await
    {
        return manage_error!(err);
    }

    with_cookie(
        response::success_without_data("Logout berhasil"),
        clear_refresh_cookie(&state),
    )
}

/// 注销全部会话
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    match AuthService::new(&state).logout_all(auth.user_id).await {
        Ok(revoked_sessions) => with_cookie(
            response::success_with_message(
                LogoutAllResponse { revoked_sessions },
                "Berhasil logout dari semua perangkat",
            ),
            clear_refresh_cookie(&state),
        ),
        Err(err) => manage_error!(err),
    }
}

/// 请求体优先，其次 cookie
fn refresh_token_from(headers: &HeaderMap, payload: Option<Json<RefreshRequest>>) -> Option<String> {
    payload
        .and_then(|Json(body)| body.refresh_token)
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| cookie_value(headers, REFRESH_COOKIE))
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn cookie_path(state: &AppState) -> String {
    format!("{}/auth", state.config.server.api_prefix.trim_end_matches('/'))
}

fn refresh_cookie(state: &AppState, token: &str) -> String {
    build_cookie(
        &cookie_path(state),
        token,
        state.config.auth.refresh_ttl_secs,
        state.config.auth.secure_cookie,
    )
}

fn clear_refresh_cookie(state: &AppState) -> String {
    build_cookie(&cookie_path(state), "", 0, state.config.auth.secure_cookie)
}

fn build_cookie(path: &str, value: &str, max_age: u64, secure: bool) -> String {
    let mut cookie =
        format!("{REFRESH_COOKIE}={value}; Path={path}; Max-Age={max_age}; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn with_cookie(mut response: Response, cookie: String) -> Response {
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}
