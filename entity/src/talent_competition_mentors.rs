//! # 比赛指导明细（pembimbing_lomba）

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::{CompetitionField, CompetitionLevel};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "talent_competition_mentors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub talent_id: Uuid,
    pub competition_name: String,
    pub level: CompetitionLevel,
    pub organizer: String,
    pub field: CompetitionField,
    pub achievement: String,
    pub certificate_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::talents::Entity",
        from = "Column::TalentId",
        to = "super::talents::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Talent,
}

impl Related<super::talents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Talent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
