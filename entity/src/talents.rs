//! # 人才记录实体定义
//!
//! 审核流程的聚合根，每条记录恰好拥有一条与 `talent_type` 对应的明细。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::{TalentStatus, TalentType};

/// 人才记录实体
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "talents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub talent_type: TalentType,
    pub status: TalentStatus,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(has_one = "super::talent_trainings::Entity")]
    Training,
    #[sea_orm(has_one = "super::talent_competition_mentors::Entity")]
    CompetitionMentor,
    #[sea_orm(has_one = "super::talent_competition_participants::Entity")]
    CompetitionParticipant,
    #[sea_orm(has_one = "super::talent_interests::Entity")]
    Interest,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::talent_trainings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Training.def()
    }
}

impl Related<super::talent_competition_mentors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompetitionMentor.def()
    }
}

impl Related<super::talent_competition_participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompetitionParticipant.def()
    }
}

impl Related<super::talent_interests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Interest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
