//! # 认证授权模块
//!
//! 访问令牌签发与校验、刷新令牌轮换，以及基于角色和学校范围的访问控制。

pub mod jwt;
pub mod permissions;
pub mod service;
pub mod types;
pub mod utils;

pub use jwt::JwtManager;
pub use service::{AuthService, TokenPair};
pub use types::{AuthContext, JwtClaims};
pub use utils::AuthUtils;
