//! # 外部错误到 `AppError` 的转换

use sea_orm::{DbErr, SqlErr};

use super::AppError;

/// 唯一列与对应的冲突码；按顺序匹配约束消息
const UNIQUE_COLUMNS: [(&str, &str, &str); 4] = [
    ("npsn", "DUPLICATE_NPSN", "NPSN sudah terdaftar"),
    ("nuptk", "NUPTK_TAKEN", "NUPTK sudah terdaftar"),
    ("email", "EMAIL_TAKEN", "Email sudah terdaftar"),
    ("nip", "NIP_TAKEN", "NIP sudah terdaftar"),
];

/// 唯一约束冲突转为业务冲突，无法识别列名时返回 None
#[must_use]
pub fn unique_conflict(err: &DbErr) -> Option<AppError> {
    let Some(SqlErr::UniqueConstraintViolation(message)) = err.sql_err() else {
        return None;
    };
    let message = message.to_lowercase();
    UNIQUE_COLUMNS
        .iter()
        .find(|(column, _, _)| message.contains(column))
        .map(|&(_, code, text)| AppError::conflict(code, text))
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::database_with_source(err.to_string(), err)
    }
}

impl From<sea_orm::TransactionError<AppError>> for AppError {
    fn from(err: sea_orm::TransactionError<AppError>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(db_err) => db_err.into(),
            sea_orm::TransactionError::Transaction(app_err) => app_err,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source(format!("TOML解析失败: {}", err.message()), err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
            source: err.into(),
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::internal_with_source("密码哈希失败", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::storage_with_source(format!("存储请求失败: {err}"), err)
    }
}
