//! # 对象存储模块
//!
//! 预签名上传地址、对象元数据查询与删除。生产环境使用 S3 兼容网关，
//! 测试与本地开发可切换为进程内存储。

mod memory;
mod s3;
pub mod sigv4;

pub use memory::MemoryStorage;
pub use s3::S3Storage;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;

/// 对象元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub size: u64,
    pub content_type: Option<String>,
}

/// 对象存储抽象
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// 生成客户端直传用的 PUT 预签名地址
    async fn presigned_put_url(&self, key: &str, content_type: &str, ttl: Duration)
    -> Result<String>;

    /// 查询对象元数据，不存在返回 None
    async fn stat(&self, key: &str) -> Result<Option<ObjectInfo>>;

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.stat(key).await?.is_some())
    }

    /// 删除对象，不存在时视为成功
    async fn delete(&self, key: &str) -> Result<()>;

    /// 对外访问地址
    fn public_url(&self, key: &str) -> String;
}

/// 根据配置构建存储后端
pub async fn build_storage(config: &StorageConfig) -> Result<Arc<dyn ObjectStorage>> {
    match config.backend {
        StorageBackend::S3 => {
            let storage = S3Storage::new(config)?;
            storage.ensure_bucket().await?;
            Ok(Arc::new(storage))
        }
        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new(
            &config.public_url,
            &config.bucket,
        ))),
    }
}

/// 对象键：`{upload_type}/{YYYY}/{MM}/{uuid}{ext}`
#[must_use]
pub fn generate_object_key(upload_type: &str, filename: &str, now: DateTime<Utc>) -> String {
    let ext = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    format!(
        "{upload_type}/{}/{:02}/{}{ext}",
        now.year(),
        now.month(),
        Uuid::new_v4()
    )
}

/// `{public_url}/{bucket}/{key}`
#[must_use]
pub fn join_public_url(public_url: &str, bucket: &str, key: &str) -> String {
    format!("{}/{bucket}/{key}", public_url.trim_end_matches('/'))
}
