//! # 认证工具函数
//!
//! 令牌提取、哈希与密码处理

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::Result;

/// 认证工具类
pub struct AuthUtils;

impl AuthUtils {
    /// `从HTTP头中提取Authorization头的值`
    #[must_use]
    pub fn extract_authorization_header(headers: &HeaderMap) -> Option<&str> {
        headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
    }

    /// `从Authorization头中提取Bearer` token
    ///
    /// - `Some(token)`: Bearer token部分（非空）
    /// - `None`: 不是Bearer类型的认证头
    #[must_use]
    pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
        auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// 十六进制格式的 SHA-256 摘要，刷新令牌只以此形式落库
    #[must_use]
    pub fn sha256_hash(input: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// 生成不透明的刷新令牌（两个 UUID v4 拼接）
    #[must_use]
    pub fn generate_refresh_token() -> String {
        format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        )
    }

    /// bcrypt 哈希密码
    pub fn hash_password(password: &str, cost: u32) -> Result<String> {
        Ok(bcrypt::hash(password, cost)?)
    }

    /// 校验密码，哈希格式损坏视为不匹配
    #[must_use]
    pub fn verify_password(password: &str, password_hash: &str) -> bool {
        bcrypt::verify(password, password_hash).unwrap_or(false)
    }
}
