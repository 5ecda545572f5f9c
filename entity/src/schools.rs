//! # 学校实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::SchoolStatus;

/// 学校实体
///
/// `head_master_id` 指向 `gtk_type = kepala_sekolah` 的用户，由服务层校验。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schools")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub npsn: String,
    pub status: SchoolStatus,
    pub address: Option<String>,
    pub head_master_id: Option<Uuid>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::users::Entity")]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
