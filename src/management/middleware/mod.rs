//! # 管理服务器中间件
//!
//! 认证、角色白名单与请求 ID

pub mod auth;
pub mod request_id;
pub mod role;

pub use auth::auth;
pub use request_id::{RequestId, request_id_middleware};
pub use role::require_roles;
