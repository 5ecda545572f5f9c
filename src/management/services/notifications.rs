//! # 通知服务
//!
//! 通知只由审核结果产生，用户只能读取和标记自己的通知。

use chrono::{DateTime, Utc};
use entity::enums::NotificationType;
use entity::notifications;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppContext;
use crate::auth::AuthContext;
use crate::error::{AppError, Context, Result};

use super::shared::{Page, PaginationParams};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub is_read: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub talent_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<notifications::Model> for NotificationResponse {
    fn from(model: notifications::Model) -> Self {
        Self {
            id: model.id,
            notification_type: model.notification_type,
            title: model.title,
            message: model.message,
            talent_id: model.talent_id,
            is_read: model.is_read,
            created_at: model.created_at.and_utc(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnreadCount {
    pub unread_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkedCount {
    pub marked_count: u64,
}

/// 审核结果通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TalentOutcome {
    Approved,
    Rejected { reason: String },
}

impl TalentOutcome {
    #[must_use]
    pub const fn notification_type(&self) -> NotificationType {
        match self {
            Self::Approved => NotificationType::TalentApproved,
            Self::Rejected { .. } => NotificationType::TalentRejected,
        }
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Approved => "Talenta Disetujui",
            Self::Rejected { .. } => "Talenta Ditolak",
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Approved => "Talenta Anda telah disetujui".to_string(),
            Self::Rejected { reason } => format!("Talenta Anda ditolak. Alasan: {reason}"),
        }
    }
}

/// 为人才所有者写入一条审核结果通知
pub async fn notify_talent_owner<C: ConnectionTrait>(
    db: &C,
    owner_id: Uuid,
    talent_id: Uuid,
    outcome: &TalentOutcome,
) -> Result<notifications::Model> {
    notifications::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner_id),
        talent_id: Set(Some(talent_id)),
        notification_type: Set(outcome.notification_type()),
        title: Set(outcome.title().to_string()),
        message: Set(outcome.message()),
        is_read: Set(false),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .context("Failed to create notification")
}

pub struct NotificationsService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> NotificationsService<'a> {
    #[must_use]
    pub fn new(context: &'a AppContext) -> Self {
        Self {
            db: context.database.as_ref(),
        }
    }

    fn owned_by(user_id: Uuid, is_read: Option<bool>) -> Select<notifications::Entity> {
        let mut select =
            notifications::Entity::find().filter(notifications::Column::UserId.eq(user_id));
        if let Some(is_read) = is_read {
            select = select.filter(notifications::Column::IsRead.eq(is_read));
        }
        select
    }

    /// 当前用户的通知，新的在前
    pub async fn list(
        &self,
        auth: &AuthContext,
        query: &NotificationListQuery,
    ) -> Result<Page<NotificationResponse>> {
        let params = PaginationParams::standard(query.page, query.limit);

        let total = Self::owned_by(auth.user_id, query.is_read)
            .count(self.db)
            .await
            .context("Failed to count notifications")?;

        let rows = Self::owned_by(auth.user_id, query.is_read)
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await
            .context("Failed to fetch notifications")?;

        Ok(Page::new(
            rows.into_iter().map(NotificationResponse::from).collect(),
            total,
            params,
        ))
    }

    pub async fn unread_count(&self, auth: &AuthContext) -> Result<UnreadCount> {
        let unread_count = Self::owned_by(auth.user_id, Some(false))
            .count(self.db)
            .await
            .context("Failed to count unread notifications")?;
        Ok(UnreadCount { unread_count })
    }

    pub async fn mark_as_read(&self, auth: &AuthContext, id: Uuid) -> Result<NotificationResponse> {
        let notification = notifications::Entity::find_by_id(id)
            .one(self.db)
            .await
            .context("Failed to load notification")?
            .ok_or_else(|| AppError::not_found("Notifikasi"))?;

        if notification.user_id != auth.user_id {
            return Err(AppError::forbidden(
                "Anda tidak memiliki akses ke notifikasi ini",
            ));
        }
        if notification.is_read {
            return Ok(notification.into());
        }

        let mut active: notifications::ActiveModel = notification.into();
        active.is_read = Set(true);
        let updated = active
            .update(self.db)
            .await
            .context("Failed to mark notification as read")?;
        Ok(updated.into())
    }

    pub async fn mark_all_as_read(&self, auth: &AuthContext) -> Result<MarkedCount> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::UserId.eq(auth.user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(self.db)
            .await
            .context("Failed to mark notifications as read")?;
        Ok(MarkedCount {
            marked_count: result.rows_affected,
        })
    }
}
