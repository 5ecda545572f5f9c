//! 进程内对象存储

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{ObjectInfo, ObjectStorage, join_public_url};
use crate::error::Result;

/// 以对象键为索引的内存存储，`put_object` 模拟客户端直传
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, ObjectInfo>>,
    public_url: String,
    bucket: String,
}

impl MemoryStorage {
    #[must_use]
    pub fn new(public_url: &str, bucket: &str) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            public_url: public_url.to_string(),
            bucket: bucket.to_string(),
        }
    }

    pub async fn put_object(&self, key: &str, size: u64, content_type: &str) {
        self.objects.write().await.insert(
            key.to_string(),
            ObjectInfo {
                size,
                content_type: Some(content_type.to_string()),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new("http://localhost:9000", "sipodi")
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn presigned_put_url(
        &self,
        key: &str,
        _content_type: &str,
        ttl: Duration,
    ) -> Result<String> {
        Ok(format!(
            "{}?X-Amz-Expires={}",
            join_public_url(&self.public_url, &self.bucket, key),
            ttl.as_secs()
        ))
    }

    async fn stat(&self, key: &str) -> Result<Option<ObjectInfo>> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_public_url(&self.public_url, &self.bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_stat_delete() {
        let storage = MemoryStorage::default();
        assert!(!storage.exists("a.png").await.unwrap());

        storage.put_object("a.png", 42, "image/png").await;
        let info = storage.stat("a.png").await.unwrap().unwrap();
        assert_eq!(info.size, 42);
        assert_eq!(info.content_type.as_deref(), Some("image/png"));

        storage.delete("a.png").await.unwrap();
        assert!(storage.is_empty().await);
    }
}
