//! # 兴趣特长明细（minat_bakat）

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "talent_interests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub talent_id: Uuid,
    pub interest_name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
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
