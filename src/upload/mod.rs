//! # 上传票据模块
//!
//! 客户端先申请预签名地址直传对象存储，再凭 `upload_id` 确认上传。
//! 确认后的票据保留到被业务记录认领或过期为止。
//! 票据只保存在进程内，由后台任务定期清理过期条目。

pub mod registry;
pub mod types;

pub use registry::{ConfirmedFile, UploadRegistry, UploadTicket};
pub use types::UploadType;
