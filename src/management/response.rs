//! # API 响应结构
//!
//! 定义了标准的 JSON API 响应格式，包括成功、失败和分页响应。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, FieldError};
use crate::management::services::shared::Page;

/// # 分页信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

/// # 标准成功响应
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// # 分页成功响应
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// # 标准错误信息
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    /// 字段级校验错误
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// # 标准错误响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorInfo,
    pub timestamp: DateTime<Utc>,
}

/// # API响应枚举
///
/// 统一所有API出口，方便转换为 `axum::response::Response`
#[derive(Debug)]
pub enum ApiResponse<T: Serialize> {
    Success(T),
    SuccessWithMessage(T, String),
    Created(T, String),
    SuccessWithoutData(String),
    Paginated(Vec<T>, Pagination),
    Error(StatusCode, String, String),
    AppError(AppError),
}

fn success_body<T: Serialize>(status: StatusCode, data: Option<T>, message: String) -> Response {
    (
        status,
        Json(SuccessResponse {
            success: true,
            data,
            message: Some(message),
            timestamp: Utc::now(),
        }),
    )
        .into_response()
}

fn error_body(status: StatusCode, error: ErrorInfo) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error,
            timestamp: Utc::now(),
        }),
    )
        .into_response()
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Success(data) => {
                success_body(StatusCode::OK, Some(data), "Berhasil".to_string())
            }
            Self::SuccessWithMessage(data, message) => {
                success_body(StatusCode::OK, Some(data), message)
            }
            Self::Created(data, message) => success_body(StatusCode::CREATED, Some(data), message),
            Self::SuccessWithoutData(message) => {
                success_body::<()>(StatusCode::OK, None, message)
            }
            Self::Paginated(data, pagination) => (
                StatusCode::OK,
                Json(PaginatedResponse {
                    success: true,
                    data,
                    pagination,
                    message: Some("Data berhasil diambil".to_string()),
                    timestamp: Utc::now(),
                }),
            )
                .into_response(),
            Self::Error(status, code, message) => error_body(
                status,
                ErrorInfo {
                    code,
                    message,
                    details: None,
                },
            ),
            Self::AppError(error) => {
                let (status, code) = error.to_http_response_parts();
                error_body(
                    status,
                    ErrorInfo {
                        code: code.to_string(),
                        message: error.public_message(),
                        details: error.field_errors().map(<[FieldError]>::to_vec),
                    },
                )
            }
        }
    }
}

/// # 便捷函数：成功响应
pub fn success<T: Serialize>(data: T) -> Response {
    ApiResponse::Success(data).into_response()
}

/// # 便捷函数：带消息的成功响应
pub fn success_with_message<T: Serialize>(data: T, message: &str) -> Response {
    ApiResponse::SuccessWithMessage(data, message.to_string()).into_response()
}

/// # 便捷函数：201 创建成功
pub fn created<T: Serialize>(data: T, message: &str) -> Response {
    ApiResponse::Created(data, message.to_string()).into_response()
}

/// # 便捷函数：无数据体的成功响应
pub fn success_without_data(message: &str) -> Response {
    ApiResponse::<()>::SuccessWithoutData(message.to_string()).into_response()
}

/// # 便捷函数：分页响应
pub fn paginated<T: Serialize>(data: Vec<T>, pagination: Pagination) -> Response {
    ApiResponse::Paginated(data, pagination).into_response()
}

/// # 便捷函数：HTTP错误响应
pub fn error(status: StatusCode, code: &str, message: &str) -> Response {
    ApiResponse::<()>::Error(status, code.to_string(), message.to_string()).into_response()
}

/// # 便捷函数：应用错误响应
pub fn app_error(error: AppError) -> Response {
    ApiResponse::<()>::AppError(error).into_response()
}

/// # 便捷函数：分页服务结果
pub fn page<T: Serialize>(page: Page<T>) -> Response {
    paginated(page.items, page.pagination.into())
}

/// 记录错误日志并转换为错误响应
#[macro_export]
macro_rules! manage_error {
    ($err:expr) => {{
        let err: $crate::error::AppError = $err;
        err.log();
        $crate::management::response::app_error(err)
    }};
}
