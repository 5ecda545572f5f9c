//! 进程内上传票据表

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UploadType;

/// 已通过对象存储核验的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedFile {
    pub file_url: String,
    pub file_size: u64,
}

/// 上传票据，确认后携带核验结果，等待被业务记录认领
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub upload_id: Uuid,
    pub user_id: Uuid,
    pub object_key: String,
    pub upload_type: UploadType,
    pub filename: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub confirmed: Option<ConfirmedFile>,
}

impl UploadTicket {
    #[must_use]
    pub fn new(
        user_id: Uuid,
        object_key: String,
        upload_type: UploadType,
        filename: String,
        content_type: String,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            upload_id: Uuid::new_v4(),
            user_id,
            object_key,
            upload_type,
            filename,
            content_type,
            created_at: now,
            expires_at: now + ttl,
            confirmed: None,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        self.confirmed.is_some()
    }
}

/// 上传票据注册表
#[derive(Debug, Default)]
pub struct UploadRegistry {
    tickets: RwLock<HashMap<Uuid, UploadTicket>>,
}

impl UploadRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, ticket: UploadTicket) {
        self.tickets.write().await.insert(ticket.upload_id, ticket);
    }

    /// 只返回未过期的票据
    pub async fn get(&self, upload_id: Uuid, now: DateTime<Utc>) -> Option<UploadTicket> {
        self.tickets
            .read()
            .await
            .get(&upload_id)
            .filter(|ticket| !ticket.is_expired(now))
            .cloned()
    }

    /// 将未确认的票据标记为已确认并顺延有效期，票据不存在或已确认时返回 false
    pub async fn mark_confirmed(
        &self,
        upload_id: Uuid,
        file: ConfirmedFile,
        expires_at: DateTime<Utc>,
    ) -> bool {
        let mut guard = self.tickets.write().await;
        match guard.get_mut(&upload_id) {
            Some(ticket) if !ticket.is_confirmed() => {
                ticket.confirmed = Some(file);
                ticket.expires_at = expires_at;
                true
            }
            _ => false,
        }
    }

    /// 原子地取走属于 `user_id`、类型匹配且未过期的已确认票据
    pub async fn take_confirmed(
        &self,
        upload_id: Uuid,
        user_id: Uuid,
        upload_type: UploadType,
        now: DateTime<Utc>,
    ) -> Option<UploadTicket> {
        let mut guard = self.tickets.write().await;
        let claimable = guard.get(&upload_id).is_some_and(|ticket| {
            ticket.is_confirmed()
                && ticket.user_id == user_id
                && ticket.upload_type == upload_type
                && !ticket.is_expired(now)
        });
        if claimable {
            guard.remove(&upload_id)
        } else {
            None
        }
    }

    pub async fn remove(&self, upload_id: Uuid) -> Option<UploadTicket> {
        self.tickets.write().await.remove(&upload_id)
    }

    /// 清理过期票据，返回清理数量
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut guard = self.tickets.write().await;
        let before = guard.len();
        guard.retain(|_, ticket| !ticket.is_expired(now));
        before - guard.len()
    }

    pub async fn len(&self) -> usize {
        self.tickets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tickets.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(ttl_secs: i64) -> UploadTicket {
        UploadTicket::new(
            Uuid::new_v4(),
            "profile_photo/2025/01/a.png".to_string(),
            UploadType::ProfilePhoto,
            "a.png".to_string(),
            "image/png".to_string(),
            Duration::seconds(ttl_secs),
        )
    }

    #[tokio::test]
    async fn test_get_hides_expired_ticket() {
        let registry = UploadRegistry::new();
        let live = ticket(3600);
        let id = live.upload_id;
        registry.insert(live).await;

        assert!(registry.get(id, Utc::now()).await.is_some());
        assert!(
            registry
                .get(id, Utc::now() + Duration::hours(2))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let registry = UploadRegistry::new();
        let live = ticket(3600);
        let live_id = live.upload_id;
        registry.insert(live).await;
        registry.insert(ticket(-1)).await;
        registry.insert(ticket(-60)).await;

        assert_eq!(registry.sweep_expired(Utc::now()).await, 2);
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(live_id, Utc::now()).await.is_some());
    }

    #[tokio::test]
    async fn test_only_confirmed_ticket_can_be_taken_once() {
        let registry = UploadRegistry::new();
        let t = ticket(60);
        let (id, owner) = (t.upload_id, t.user_id);
        registry.insert(t).await;

        let now = Utc::now();
        assert!(
            registry
                .take_confirmed(id, owner, UploadType::ProfilePhoto, now)
                .await
                .is_none()
        );

        let file = ConfirmedFile {
            file_url: "http://files/a.png".to_string(),
            file_size: 10,
        };
        assert!(
            registry
                .mark_confirmed(id, file.clone(), now + Duration::hours(1))
                .await
        );
        assert!(!registry.mark_confirmed(id, file.clone(), now).await);

        assert!(
            registry
                .take_confirmed(id, Uuid::new_v4(), UploadType::ProfilePhoto, now)
                .await
                .is_none()
        );
        assert!(
            registry
                .take_confirmed(id, owner, UploadType::TalentCertificate, now)
                .await
                .is_none()
        );

        let taken = registry
            .take_confirmed(id, owner, UploadType::ProfilePhoto, now)
            .await
            .unwrap();
        assert_eq!(taken.confirmed, Some(file));
        assert!(
            registry
                .take_confirmed(id, owner, UploadType::ProfilePhoto, now)
                .await
                .is_none()
        );
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_returns_ticket_once() {
        let registry = UploadRegistry::new();
        let t = ticket(60);
        let id = t.upload_id;
        registry.insert(t).await;

        assert!(registry.remove(id).await.is_some());
        assert!(registry.remove(id).await.is_none());
        assert!(registry.is_empty().await);
    }
}
