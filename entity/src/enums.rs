//! # 枚举列定义
//!
//! 所有以字符串形式存储的枚举列，数据库值与 JSON 值保持一致。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 用户角色
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
    #[sea_orm(string_value = "admin_sekolah")]
    AdminSekolah,
    #[sea_orm(string_value = "gtk")]
    Gtk,
}

/// 性别
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(1))")]
pub enum Gender {
    #[sea_orm(string_value = "L")]
    L,
    #[sea_orm(string_value = "P")]
    P,
}

/// GTK 类型（guru / tendik / kepala sekolah）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum GtkType {
    #[sea_orm(string_value = "guru")]
    Guru,
    #[sea_orm(string_value = "tendik")]
    Tendik,
    #[sea_orm(string_value = "kepala_sekolah")]
    KepalaSekolah,
}

/// 学校性质
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "snake_case")]
pub enum SchoolStatus {
    #[sea_orm(string_value = "negeri")]
    Negeri,
    #[sea_orm(string_value = "swasta")]
    Swasta,
}

/// 人才记录类型，决定明细表
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(30))")]
#[serde(rename_all = "snake_case")]
pub enum TalentType {
    #[sea_orm(string_value = "peserta_pelatihan")]
    PesertaPelatihan,
    #[sea_orm(string_value = "pembimbing_lomba")]
    PembimbingLomba,
    #[sea_orm(string_value = "peserta_lomba")]
    PesertaLomba,
    #[sea_orm(string_value = "minat_bakat")]
    MinatBakat,
}

/// 审核状态
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum TalentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// 比赛级别
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum CompetitionLevel {
    #[sea_orm(string_value = "kota")]
    Kota,
    #[sea_orm(string_value = "provinsi")]
    Provinsi,
    #[sea_orm(string_value = "nasional")]
    Nasional,
    #[sea_orm(string_value = "internasional")]
    Internasional,
}

/// 比赛领域
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum CompetitionField {
    #[sea_orm(string_value = "akademik")]
    Akademik,
    #[sea_orm(string_value = "inovasi")]
    Inovasi,
    #[sea_orm(string_value = "teknologi")]
    Teknologi,
    #[sea_orm(string_value = "sosial")]
    Sosial,
    #[sea_orm(string_value = "olahraga")]
    Olahraga,
    #[sea_orm(string_value = "seni")]
    Seni,
    #[sea_orm(string_value = "kepemimpinan")]
    Kepemimpinan,
}

/// 通知类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(30))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    #[sea_orm(string_value = "talent_approved")]
    TalentApproved,
    #[sea_orm(string_value = "talent_rejected")]
    TalentRejected,
}

macro_rules! impl_display_via_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.to_value())
                }
            }
        )*
    };
}

impl_display_via_value!(
    UserRole,
    Gender,
    GtkType,
    SchoolStatus,
    TalentType,
    TalentStatus,
    CompetitionLevel,
    CompetitionField,
    NotificationType,
);

impl TalentType {
    /// 该类型的明细是否允许附带证书
    #[must_use]
    pub const fn accepts_certificate(self) -> bool {
        !matches!(self, Self::PesertaPelatihan)
    }
}
