//! # HTTP 处理器
//!
//! 处理器只负责提取参数、调用服务并包装响应。

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::response::Response;

use crate::error::AppError;
use crate::management::response;
use crate::{
    ldebug,
    logging::{LogComponent, LogStage},
};

pub mod auth;
pub mod dashboard;
pub mod notifications;
pub mod schools;
pub mod system;
pub mod talents;
pub mod uploads;
pub mod users;
pub mod verifications;

/// 路径中的 ID 无法解析
pub(crate) fn invalid_id(rejection: &PathRejection) -> Response {
    ldebug!(
        "system",
        LogStage::RequestStart,
        LogComponent::Handler,
        "invalid_path",
        &format!("路径参数解析失败: {rejection}")
    );
    response::app_error(AppError::bad_request("INVALID_REQUEST", "ID tidak valid"))
}

/// 请求体不是合法 JSON 或字段类型不匹配
pub(crate) fn invalid_body(rejection: &JsonRejection) -> Response {
    ldebug!(
        "system",
        LogStage::RequestStart,
        LogComponent::Handler,
        "invalid_body",
        &format!("请求体解析失败: {rejection}")
    );
    response::app_error(AppError::bad_request(
        "INVALID_REQUEST",
        "Request body tidak valid",
    ))
}
