//! # 人才审核服务
//!
//! GTK 申报人才记录，管理员在学校范围内审核。写操作位于 `workflow`，
//! 查询与视图组装位于 `query`，明细的多态处理位于 `detail`。

pub mod detail;
mod query;
mod workflow;

use chrono::{DateTime, Utc};
use entity::enums::{TalentStatus, TalentType};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::app::AppContext;

pub use detail::{TalentDetail, TalentDetailInput};

/// 新建人才请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTalentRequest {
    pub talent_type: TalentType,
    #[serde(default)]
    pub detail: Option<Value>,
    /// 只由已认领的上传填充，请求体中的同名字段被忽略
    #[serde(skip)]
    pub certificate_url: Option<String>,
    /// 已确认的证书上传票据
    #[serde(default)]
    pub upload_id: Option<Uuid>,
}

/// 更新人才请求，类型不可更改
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTalentRequest {
    #[serde(default)]
    pub talent_type: Option<TalentType>,
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(skip)]
    pub certificate_url: Option<String>,
    #[serde(default)]
    pub upload_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectTalentRequest {
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchApproveRequest {
    #[serde(default, alias = "ids")]
    pub talent_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchRejectRequest {
    #[serde(default, alias = "ids")]
    pub talent_ids: Vec<Uuid>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// 列表筛选参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TalentListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub user_id: Option<Uuid>,
    pub school_id: Option<Uuid>,
    pub talent_type: Option<TalentType>,
    pub status: Option<TalentStatus>,
    /// 按所有者姓名模糊匹配
    pub search: Option<String>,
    /// `created_at`、`-created_at`、`updated_at`、`-updated_at`、`status`、`-status`、`talent_type`
    pub sort: Option<String>,
}

/// 用户的简要引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRef {
    pub id: Uuid,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nip: Option<String>,
}

/// 列表中的所有者信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TalentOwner {
    pub id: Uuid,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
}

/// 人才详情视图
#[derive(Debug, Clone, Serialize)]
pub struct TalentResponse {
    pub id: Uuid,
    pub user: UserRef,
    pub talent_type: TalentType,
    pub status: TalentStatus,
    pub detail: TalentDetail,
    pub certificate_url: Option<String>,
    pub verified_by: Option<UserRef>,
    pub verified_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 人才列表项
#[derive(Debug, Clone, Serialize)]
pub struct TalentListItem {
    pub id: Uuid,
    pub user: TalentOwner,
    pub talent_type: TalentType,
    pub status: TalentStatus,
    pub detail: TalentDetail,
    pub certificate_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub id: Uuid,
    pub reason: String,
}

/// 批量审核结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub success_count: usize,
    pub failed_count: usize,
    pub failed_ids: Vec<FailedItem>,
}

/// 人才服务
pub struct TalentsService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TalentsService<'a> {
    #[must_use]
    pub fn new(context: &'a AppContext) -> Self {
        Self {
            db: context.database.as_ref(),
        }
    }

    #[must_use]
    pub const fn with_connection(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }
}
