//! # 人才明细
//!
//! 四种互斥的明细记录：请求中以 `{talent_type, detail}` 邻接标记的形式出现，
//! 校验后转换为强类型的 [`TalentDetail`]，并写入与类型对应的明细表。

use std::collections::HashMap;

use chrono::NaiveDate;
use entity::enums::{CompetitionField, CompetitionLevel, TalentType};
use entity::{
    talent_competition_mentors, talent_competition_participants, talent_interests,
    talent_trainings, talents,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, Context, Result};
use crate::management::services::shared::Validator;

/// peserta_pelatihan 原始输入
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrainingInput {
    pub activity_name: Option<String>,
    pub organizer: Option<String>,
    pub start_date: Option<String>,
    pub duration_days: Option<i64>,
}

/// pembimbing_lomba 原始输入
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MentorInput {
    pub competition_name: Option<String>,
    pub level: Option<String>,
    pub organizer: Option<String>,
    pub field: Option<String>,
    pub achievement: Option<String>,
}

/// peserta_lomba 原始输入
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParticipantInput {
    pub competition_name: Option<String>,
    pub level: Option<String>,
    pub organizer: Option<String>,
    pub field: Option<String>,
    pub start_date: Option<String>,
    pub duration_days: Option<i64>,
    pub competition_field: Option<String>,
    pub achievement: Option<String>,
}

/// minat_bakat 原始输入
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InterestInput {
    pub interest_name: Option<String>,
    pub description: Option<String>,
}

/// 未校验的明细，`talent_type` 为标签，`detail` 为内容
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "talent_type", content = "detail")]
pub enum TalentDetailInput {
    #[serde(rename = "peserta_pelatihan")]
    Training(TrainingInput),
    #[serde(rename = "pembimbing_lomba")]
    Mentor(MentorInput),
    #[serde(rename = "peserta_lomba")]
    Participant(ParticipantInput),
    #[serde(rename = "minat_bakat")]
    Interest(InterestInput),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingDetail {
    pub activity_name: String,
    pub organizer: String,
    pub start_date: NaiveDate,
    pub duration_days: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentorDetail {
    pub competition_name: String,
    pub level: CompetitionLevel,
    pub organizer: String,
    pub field: CompetitionField,
    pub achievement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantDetail {
    pub competition_name: String,
    pub level: CompetitionLevel,
    pub organizer: String,
    pub field: CompetitionField,
    pub start_date: NaiveDate,
    pub duration_days: i32,
    pub competition_field: String,
    pub achievement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterestDetail {
    pub interest_name: String,
    pub description: String,
}

/// 已校验的明细；序列化时只输出明细字段本身
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TalentDetail {
    Training(TrainingDetail),
    Mentor(MentorDetail),
    Participant(ParticipantDetail),
    Interest(InterestDetail),
}

impl TalentDetailInput {
    /// 由类型与 JSON 内容组装
    pub fn from_parts(talent_type: TalentType, detail: Option<Value>) -> Result<Self> {
        let detail = match detail {
            None | Some(Value::Null) => {
                return Err(AppError::field("detail", "Detail wajib diisi"));
            }
            Some(value @ Value::Object(_)) => value,
            Some(_) => return Err(AppError::field("detail", "Format detail tidak valid")),
        };

        serde_json::from_value(serde_json::json!({
            "talent_type": talent_type,
            "detail": detail,
        }))
        .map_err(|_| AppError::field("detail", "Format detail tidak valid"))
    }

    #[must_use]
    pub const fn talent_type(&self) -> TalentType {
        match self {
            Self::Training(_) => TalentType::PesertaPelatihan,
            Self::Mentor(_) => TalentType::PembimbingLomba,
            Self::Participant(_) => TalentType::PesertaLomba,
            Self::Interest(_) => TalentType::MinatBakat,
        }
    }

    /// 校验必填字段，所有缺失项一次性返回
    pub fn validate(self) -> Result<TalentDetail> {
        let mut v = Validator::new();
        let detail = match self {
            Self::Training(input) => {
                let activity_name = v.required_text(
                    "detail.activity_name",
                    input.activity_name,
                    "Nama kegiatan wajib diisi",
                );
                let organizer =
                    v.required_text("detail.organizer", input.organizer, "Penyelenggara wajib diisi");
                let start_date =
                    v.required_date("detail.start_date", input.start_date, "Tanggal mulai wajib diisi");
                let duration_days = v.required_positive(
                    "detail.duration_days",
                    input.duration_days,
                    "Jangka waktu wajib diisi",
                );
                match (activity_name, organizer, start_date, duration_days) {
                    (Some(activity_name), Some(organizer), Some(start_date), Some(duration_days)) => {
                        Some(TalentDetail::Training(TrainingDetail {
                            activity_name,
                            organizer,
                            start_date,
                            duration_days,
                        }))
                    }
                    _ => None,
                }
            }
            Self::Mentor(input) => {
                let competition_name = v.required_text(
                    "detail.competition_name",
                    input.competition_name,
                    "Nama lomba wajib diisi",
                );
                let level = v.required_enum("detail.level", input.level, "Jenjang wajib diisi");
                let organizer =
                    v.required_text("detail.organizer", input.organizer, "Penyelenggara wajib diisi");
                let field = v.required_enum("detail.field", input.field, "Bidang wajib diisi");
                let achievement =
                    v.required_text("detail.achievement", input.achievement, "Prestasi wajib diisi");
                match (competition_name, level, organizer, field, achievement) {
                    (
                        Some(competition_name),
                        Some(level),
                        Some(organizer),
                        Some(field),
                        Some(achievement),
                    ) => Some(TalentDetail::Mentor(MentorDetail {
                        competition_name,
                        level,
                        organizer,
                        field,
                        achievement,
                    })),
                    _ => None,
                }
            }
            Self::Participant(input) => {
                let competition_name = v.required_text(
                    "detail.competition_name",
                    input.competition_name,
                    "Nama lomba wajib diisi",
                );
                let level = v.required_enum("detail.level", input.level, "Jenjang wajib diisi");
                let organizer =
                    v.required_text("detail.organizer", input.organizer, "Penyelenggara wajib diisi");
                let field = v.required_enum("detail.field", input.field, "Bidang wajib diisi");
                let start_date =
                    v.required_date("detail.start_date", input.start_date, "Tanggal mulai wajib diisi");
                let duration_days = v.required_positive(
                    "detail.duration_days",
                    input.duration_days,
                    "Jangka waktu wajib diisi",
                );
                let competition_field = v.required_text(
                    "detail.competition_field",
                    input.competition_field,
                    "Bidang lomba wajib diisi",
                );
                let achievement =
                    v.required_text("detail.achievement", input.achievement, "Prestasi wajib diisi");
                match (
                    competition_name,
                    level,
                    organizer,
                    field,
                    start_date,
                    duration_days,
                    competition_field,
                    achievement,
                ) {
                    (
                        Some(competition_name),
                        Some(level),
                        Some(organizer),
                        Some(field),
                        Some(start_date),
                        Some(duration_days),
                        Some(competition_field),
                        Some(achievement),
                    ) => Some(TalentDetail::Participant(ParticipantDetail {
                        competition_name,
                        level,
                        organizer,
                        field,
                        start_date,
                        duration_days,
                        competition_field,
                        achievement,
                    })),
                    _ => None,
                }
            }
            Self::Interest(input) => {
                let interest_name = v.required_text(
                    "detail.interest_name",
                    input.interest_name,
                    "Nama minat/bakat wajib diisi",
                );
                let description =
                    v.required_text("detail.description", input.description, "Deskripsi wajib diisi");
                match (interest_name, description) {
                    (Some(interest_name), Some(description)) => {
                        Some(TalentDetail::Interest(InterestDetail {
                            interest_name,
                            description,
                        }))
                    }
                    _ => None,
                }
            }
        };

        v.finish()?;
        detail.ok_or_else(|| AppError::field("detail", "Format detail tidak valid"))
    }
}

impl TalentDetail {
    #[must_use]
    pub const fn talent_type(&self) -> TalentType {
        match self {
            Self::Training(_) => TalentType::PesertaPelatihan,
            Self::Mentor(_) => TalentType::PembimbingLomba,
            Self::Participant(_) => TalentType::PesertaLomba,
            Self::Interest(_) => TalentType::MinatBakat,
        }
    }
}

impl From<talent_trainings::Model> for TrainingDetail {
    fn from(row: talent_trainings::Model) -> Self {
        Self {
            activity_name: row.activity_name,
            organizer: row.organizer,
            start_date: row.start_date,
            duration_days: row.duration_days,
        }
    }
}

impl From<talent_competition_mentors::Model> for MentorDetail {
    fn from(row: talent_competition_mentors::Model) -> Self {
        Self {
            competition_name: row.competition_name,
            level: row.level,
            organizer: row.organizer,
            field: row.field,
            achievement: row.achievement,
        }
    }
}

impl From<talent_competition_participants::Model> for ParticipantDetail {
    fn from(row: talent_competition_participants::Model) -> Self {
        Self {
            competition_name: row.competition_name,
            level: row.level,
            organizer: row.organizer,
            field: row.field,
            start_date: row.start_date,
            duration_days: row.duration_days,
            competition_field: row.competition_field,
            achievement: row.achievement,
        }
    }
}

impl From<talent_interests::Model> for InterestDetail {
    fn from(row: talent_interests::Model) -> Self {
        Self {
            interest_name: row.interest_name,
            description: row.description,
        }
    }
}

/// 明细及其证书地址
pub type StoredDetail = (TalentDetail, Option<String>);

/// 写入明细行；培训类不保存证书
pub async fn insert_detail<C: ConnectionTrait>(
    db: &C,
    talent_id: Uuid,
    detail: TalentDetail,
    certificate_url: Option<String>,
) -> Result<()> {
    match detail {
        TalentDetail::Training(d) => {
            talent_trainings::ActiveModel {
                id: Set(Uuid::new_v4()),
                talent_id: Set(talent_id),
                activity_name: Set(d.activity_name),
                organizer: Set(d.organizer),
                start_date: Set(d.start_date),
                duration_days: Set(d.duration_days),
            }
            .insert(db)
            .await
            .context("Failed to insert training detail")?;
        }
        TalentDetail::Mentor(d) => {
            talent_competition_mentors::ActiveModel {
                id: Set(Uuid::new_v4()),
                talent_id: Set(talent_id),
                competition_name: Set(d.competition_name),
                level: Set(d.level),
                organizer: Set(d.organizer),
                field: Set(d.field),
                achievement: Set(d.achievement),
                certificate_url: Set(certificate_url),
            }
            .insert(db)
            .await
            .context("Failed to insert mentor detail")?;
        }
        TalentDetail::Participant(d) => {
            talent_competition_participants::ActiveModel {
                id: Set(Uuid::new_v4()),
                talent_id: Set(talent_id),
                competition_name: Set(d.competition_name),
                level: Set(d.level),
                organizer: Set(d.organizer),
                field: Set(d.field),
                start_date: Set(d.start_date),
                duration_days: Set(d.duration_days),
                competition_field: Set(d.competition_field),
                achievement: Set(d.achievement),
                certificate_url: Set(certificate_url),
            }
            .insert(db)
            .await
            .context("Failed to insert participant detail")?;
        }
        TalentDetail::Interest(d) => {
            talent_interests::ActiveModel {
                id: Set(Uuid::new_v4()),
                talent_id: Set(talent_id),
                interest_name: Set(d.interest_name),
                description: Set(d.description),
                certificate_url: Set(certificate_url),
            }
            .insert(db)
            .await
            .context("Failed to insert interest detail")?;
        }
    }
    Ok(())
}

/// 删除指定类型的明细行
pub async fn delete_detail<C: ConnectionTrait>(
    db: &C,
    talent_type: TalentType,
    talent_id: Uuid,
) -> Result<u64> {
    let result = match talent_type {
        TalentType::PesertaPelatihan => {
            talent_trainings::Entity::delete_many()
                .filter(talent_trainings::Column::TalentId.eq(talent_id))
                .exec(db)
                .await
        }
        TalentType::PembimbingLomba => {
            talent_competition_mentors::Entity::delete_many()
                .filter(talent_competition_mentors::Column::TalentId.eq(talent_id))
                .exec(db)
                .await
        }
        TalentType::PesertaLomba => {
            talent_competition_participants::Entity::delete_many()
                .filter(talent_competition_participants::Column::TalentId.eq(talent_id))
                .exec(db)
                .await
        }
        TalentType::MinatBakat => {
            talent_interests::Entity::delete_many()
                .filter(talent_interests::Column::TalentId.eq(talent_id))
                .exec(db)
                .await
        }
    }
    .context("Failed to delete talent detail")?;
    Ok(result.rows_affected)
}

/// 按类型读取单条明细
pub async fn load_detail<C: ConnectionTrait>(
    db: &C,
    talent_type: TalentType,
    talent_id: Uuid,
) -> Result<StoredDetail> {
    let detail = match talent_type {
        TalentType::PesertaPelatihan => talent_trainings::Entity::find()
            .filter(talent_trainings::Column::TalentId.eq(talent_id))
            .one(db)
            .await
            .context("Failed to load training detail")?
            .map(|row| (TalentDetail::Training(row.into()), None)),
        TalentType::PembimbingLomba => talent_competition_mentors::Entity::find()
            .filter(talent_competition_mentors::Column::TalentId.eq(talent_id))
            .one(db)
            .await
            .context("Failed to load mentor detail")?
            .map(|row| {
                let url = row.certificate_url.clone();
                (TalentDetail::Mentor(row.into()), url)
            }),
        TalentType::PesertaLomba => talent_competition_participants::Entity::find()
            .filter(talent_competition_participants::Column::TalentId.eq(talent_id))
            .one(db)
            .await
            .context("Failed to load participant detail")?
            .map(|row| {
                let url = row.certificate_url.clone();
                (TalentDetail::Participant(row.into()), url)
            }),
        TalentType::MinatBakat => talent_interests::Entity::find()
            .filter(talent_interests::Column::TalentId.eq(talent_id))
            .one(db)
            .await
            .context("Failed to load interest detail")?
            .map(|row| {
                let url = row.certificate_url.clone();
                (TalentDetail::Interest(row.into()), url)
            }),
    };

    detail.ok_or_else(|| {
        AppError::internal(format!(
            "talent {talent_id} ({talent_type}) has no detail row"
        ))
    })
}

/// 批量读取一页人才的明细，按类型分组查询
pub async fn load_details<C: ConnectionTrait>(
    db: &C,
    rows: &[talents::Model],
) -> Result<HashMap<Uuid, StoredDetail>> {
    let ids_of = |kind: TalentType| -> Vec<Uuid> {
        rows.iter()
            .filter(|t| t.talent_type == kind)
            .map(|t| t.id)
            .collect()
    };
    let mut details = HashMap::with_capacity(rows.len());

    let ids = ids_of(TalentType::PesertaPelatihan);
    if !ids.is_empty() {
        for row in talent_trainings::Entity::find()
            .filter(talent_trainings::Column::TalentId.is_in(ids))
            .all(db)
            .await
            .context("Failed to load training details")?
        {
            details.insert(row.talent_id, (TalentDetail::Training(row.into()), None));
        }
    }

    let ids = ids_of(TalentType::PembimbingLomba);
    if !ids.is_empty() {
        for row in talent_competition_mentors::Entity::find()
            .filter(talent_competition_mentors::Column::TalentId.is_in(ids))
            .all(db)
            .await
            .context("Failed to load mentor details")?
        {
            let key = row.talent_id;
            let url = row.certificate_url.clone();
            details.insert(key, (TalentDetail::Mentor(row.into()), url));
        }
    }

    let ids = ids_of(TalentType::PesertaLomba);
    if !ids.is_empty() {
        for row in talent_competition_participants::Entity::find()
            .filter(talent_competition_participants::Column::TalentId.is_in(ids))
            .all(db)
            .await
            .context("Failed to load participant details")?
        {
            let key = row.talent_id;
            let url = row.certificate_url.clone();
            details.insert(key, (TalentDetail::Participant(row.into()), url));
        }
    }

    let ids = ids_of(TalentType::MinatBakat);
    if !ids.is_empty() {
        for row in talent_interests::Entity::find()
            .filter(talent_interests::Column::TalentId.is_in(ids))
            .all(db)
            .await
            .context("Failed to load interest details")?
        {
            let key = row.talent_id;
            let url = row.certificate_url.clone();
            details.insert(key, (TalentDetail::Interest(row.into()), url));
        }
    }

    Ok(details)
}
