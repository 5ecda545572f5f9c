//! # 管理API模块
//!
//! 对外的 RESTful API：路由、中间件、处理器与业务服务

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod services;

pub use routes::create_routes;
pub use server::{AppState, ManagementServer, build_router};
