//! # 用户实体定义
//!
//! GTK、学校管理员与超级管理员共用的用户表

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::{Gender, GtkType, UserRole};

/// 用户实体
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub full_name: String,
    pub photo_url: Option<String>,
    #[sea_orm(unique)]
    pub nuptk: Option<String>,
    #[sea_orm(unique)]
    pub nip: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<Date>,
    pub gtk_type: Option<GtkType>,
    pub position: Option<String>,
    pub school_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::schools::Entity",
        from = "Column::SchoolId",
        to = "super::schools::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    School,
    #[sea_orm(has_many = "super::talents::Entity")]
    Talents,
    #[sea_orm(has_many = "super::notifications::Entity")]
    Notifications,
    #[sea_orm(has_many = "super::refresh_tokens::Entity")]
    RefreshTokens,
}

impl Related<super::schools::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::School.def()
    }
}

impl Related<super::talents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Talents.def()
    }
}

impl Related<super::notifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl Related<super::refresh_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RefreshTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
