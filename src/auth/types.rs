//! # 认证类型定义
//!
//! 访问令牌载荷与请求级认证上下文

use chrono::Utc;
use entity::{enums::UserRole, users};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// JWT 载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// 用户ID
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    /// 所属学校
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<Uuid>,
    /// 签发时间
    pub iat: i64,
    /// 过期时间
    pub exp: i64,
    /// 签发者
    pub iss: String,
    /// 受众
    pub aud: String,
    /// JWT ID
    pub jti: String,
}

impl JwtClaims {
    /// 为用户创建新的载荷
    #[must_use]
    pub fn for_user(
        user: &users::Model,
        expires_in_seconds: i64,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            school_id: user.school_id,
            iat: now,
            exp: now + expires_in_seconds,
            iss: issuer.to_string(),
            aud: audience.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// 获取用户ID
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::InvalidToken)
    }
}

/// 包含认证用户信息的上下文，由认证中间件注入请求扩展
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub school_id: Option<Uuid>,
}

impl AuthContext {
    #[must_use]
    pub const fn is_super_admin(&self) -> bool {
        matches!(self.role, UserRole::SuperAdmin)
    }

    #[must_use]
    pub const fn is_school_admin(&self) -> bool {
        matches!(self.role, UserRole::AdminSekolah)
    }

    #[must_use]
    pub const fn is_gtk(&self) -> bool {
        matches!(self.role, UserRole::Gtk)
    }
}

impl TryFrom<JwtClaims> for AuthContext {
    type Error = AppError;

    fn try_from(claims: JwtClaims) -> Result<Self> {
        Ok(Self {
            user_id: claims.user_id()?,
            email: claims.email,
            role: claims.role,
            school_id: claims.school_id,
        })
    }
}

impl From<&users::Model> for AuthContext {
    fn from(user: &users::Model) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            school_id: user.school_id,
        }
    }
}
