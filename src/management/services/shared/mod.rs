//! # 服务层共享工具
//!
//! 分页与字段校验，避免在各域服务中重复实现。
//! 推荐通过 `crate::management::services` 根模块的再导出进行访问。

pub mod pagination;
pub mod validation;

pub use pagination::{Page, PaginationInfo, PaginationParams, build_page};
pub use validation::Validator;
