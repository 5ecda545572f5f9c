//! # 错误类型定义

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ErrorCategory;

/// 单个字段的校验失败信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// 应用主要错误类型
///
/// 基础设施类错误（配置、数据库、存储等）统一以 500 返回且不泄露细节；
/// 业务类错误携带面向用户的印尼语提示。
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库相关错误
    #[error("数据库错误: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 对象存储错误
    #[error("存储服务错误: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// 服务器启动错误
    #[error("服务器启动错误: {message}")]
    ServerStart {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 附加上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<AppError>,
    },

    /// 资源不存在
    #[error("{resource} tidak ditemukan")]
    NotFound { resource: String },

    /// 已认证但无权访问
    #[error("{message}")]
    Forbidden { message: String },

    /// 请求字段校验失败
    #[error("Data yang dikirim tidak valid")]
    Validation { errors: Vec<FieldError> },

    /// 唯一性冲突
    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    /// 审核状态已决定，不允许再次审核
    #[error("Talenta sudah diverifikasi")]
    AlreadyVerified,

    #[error("Email atau password salah")]
    InvalidCredentials,

    #[error("Akun Anda telah dinonaktifkan. Hubungi admin.")]
    AccountDisabled,

    #[error("Refresh token telah expired. Silakan login ulang.")]
    TokenExpired,

    #[error("Refresh token tidak valid")]
    InvalidToken,

    /// 缺少或无法解析认证信息
    #[error("{message}")]
    Unauthorized { message: String },

    /// 上传票据不存在、已过期或不属于当前用户
    #[error("Upload tidak ditemukan atau sudah expired")]
    UploadNotFound,

    #[error("Tidak dapat menghapus akun sendiri")]
    CannotDeleteSelf,

    #[error("Password lama tidak sesuai")]
    InvalidPassword,

    #[error("User yang dipilih bukan kepala sekolah")]
    InvalidHeadMaster,

    #[error("Tidak dapat menghapus sekolah yang masih memiliki GTK")]
    SchoolHasUsers,

    /// 其它带错误码的请求错误
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },
}

impl AppError {
    /// 剥离上下文包装，返回最内层错误
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// 将错误转换为HTTP状态码和错误代码
    #[must_use]
    pub fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        match self.root() {
            Self::NotFound { .. } | Self::UploadNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Conflict { code, .. } => (StatusCode::CONFLICT, code),
            Self::AlreadyVerified => (StatusCode::BAD_REQUEST, "ALREADY_VERIFIED"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            Self::AccountDisabled => (StatusCode::FORBIDDEN, "ACCOUNT_DISABLED"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            Self::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::CannotDeleteSelf => (StatusCode::BAD_REQUEST, "CANNOT_DELETE_SELF"),
            Self::InvalidPassword => (StatusCode::BAD_REQUEST, "INVALID_PASSWORD"),
            Self::InvalidHeadMaster => (StatusCode::BAD_REQUEST, "INVALID_HEAD_MASTER"),
            Self::SchoolHasUsers => (StatusCode::BAD_REQUEST, "HAS_DEPENDENCIES"),
            Self::BadRequest { code, .. } => (StatusCode::BAD_REQUEST, code),
            Self::Config { .. }
            | Self::Database { .. }
            | Self::Storage { .. }
            | Self::Internal { .. }
            | Self::Io { .. }
            | Self::Serialization { .. }
            | Self::ServerStart { .. }
            | Self::Context { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// 错误归类，用于日志级别与对外信息的取舍
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        if self.to_http_response_parts().0.is_server_error() {
            ErrorCategory::Server
        } else {
            ErrorCategory::Client
        }
    }

    /// 对外展示的错误信息，服务端错误不暴露内部细节
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.category() {
            ErrorCategory::Server => "Terjadi kesalahan pada server".to_string(),
            ErrorCategory::Client => self.root().to_string(),
        }
    }

    /// 校验错误的字段明细
    #[must_use]
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self.root() {
            Self::Validation { errors } => Some(errors),
            _ => None,
        }
    }

    /// 记录错误日志
    pub fn log(&self) {
        let (status, code) = self.to_http_response_parts();
        match self.category() {
            ErrorCategory::Server => crate::lerror!(
                "system",
                crate::logging::LogStage::Response,
                crate::logging::LogComponent::Handler,
                "request_failed",
                &format!("{self:#}"),
                status = status.as_u16(),
                code = code
            ),
            ErrorCategory::Client => crate::ldebug!(
                "system",
                crate::logging::LogStage::Response,
                crate::logging::LogComponent::Handler,
                "request_rejected",
                &self.to_string(),
                status = status.as_u16(),
                code = code
            ),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据库错误
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据库错误
    pub fn database_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建存储服务错误
    pub fn storage<T: Into<String>>(message: T) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的存储服务错误
    pub fn storage_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建服务器启动错误
    pub fn server_start_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::ServerStart {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 资源不存在，`resource` 为面向用户的资源名（如 "Talenta"）
    pub fn not_found<T: Into<String>>(resource: T) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn forbidden<T: Into<String>>(message: T) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation { errors }
    }

    /// 单字段校验失败
    pub fn field<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation {
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn conflict<T: Into<String>>(code: &'static str, message: T) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request<T: Into<String>>(code: &'static str, message: T) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }
}
