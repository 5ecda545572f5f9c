//! # 仪表盘汇总
//!
//! 按调用者角色返回不同的统计视图。

use entity::enums::{GtkType, TalentStatus, TalentType, UserRole};
use entity::{notifications, schools, talents, users};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QuerySelect, RelationTrait, Select,
};
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppContext;
use crate::auth::AuthContext;
use crate::auth::permissions::ROLE_DENIED_MESSAGE;
use crate::error::{AppError, Context, Result};
use crate::{
    ldebug,
    logging::{LogComponent, LogStage},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TalentStatusCounts {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub total: u64,
}

impl TalentStatusCounts {
    fn from_rows(rows: Vec<(TalentStatus, i64)>) -> Self {
        let mut counts = Self::default();
        for (status, count) in rows {
            let count = u64::try_from(count).unwrap_or_default();
            match status {
                TalentStatus::Pending => counts.pending = count,
                TalentStatus::Approved => counts.approved = count,
                TalentStatus::Rejected => counts.rejected = count,
            }
            counts.total += count;
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TalentTypeCounts {
    pub peserta_pelatihan: u64,
    pub pembimbing_lomba: u64,
    pub peserta_lomba: u64,
    pub minat_bakat: u64,
}

impl TalentTypeCounts {
    fn from_rows(rows: Vec<(TalentType, i64)>) -> Self {
        let mut counts = Self::default();
        for (talent_type, count) in rows {
            let count = u64::try_from(count).unwrap_or_default();
            match talent_type {
                TalentType::PesertaPelatihan => counts.peserta_pelatihan = count,
                TalentType::PembimbingLomba => counts.pembimbing_lomba = count,
                TalentType::PesertaLomba => counts.peserta_lomba = count,
                TalentType::MinatBakat => counts.minat_bakat = count,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GtkTypeCounts {
    pub guru: u64,
    pub tendik: u64,
    pub kepala_sekolah: u64,
}

impl GtkTypeCounts {
    fn from_rows(rows: Vec<(Option<GtkType>, i64)>) -> Self {
        let mut counts = Self::default();
        for (gtk_type, count) in rows {
            let count = u64::try_from(count).unwrap_or_default();
            match gtk_type {
                Some(GtkType::Guru) => counts.guru = count,
                Some(GtkType::Tendik) => counts.tendik = count,
                Some(GtkType::KepalaSekolah) => counts.kepala_sekolah = count,
                None => {}
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchoolSummaryRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuperAdminSummary {
    pub total_schools: u64,
    pub total_users: u64,
    pub total_gtk: u64,
    pub total_admin_sekolah: u64,
    pub gtk_by_type: GtkTypeCounts,
    pub total_talents: u64,
    pub talents_by_status: TalentStatusCounts,
    pub talents_by_type: TalentTypeCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchoolAdminSummary {
    pub school: Option<SchoolSummaryRef>,
    pub total_gtk: u64,
    pub gtk_by_type: GtkTypeCounts,
    pub total_talents: u64,
    pub talents_by_status: TalentStatusCounts,
    pub pending_verifications: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GtkSummary {
    pub my_talents: TalentStatusCounts,
    pub unread_notifications: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DashboardSummary {
    SuperAdmin(SuperAdminSummary),
    SchoolAdmin(SchoolAdminSummary),
    Gtk(GtkSummary),
}

pub struct DashboardService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DashboardService<'a> {
    #[must_use]
    pub fn new(context: &'a AppContext) -> Self {
        Self {
            db: context.database.as_ref(),
        }
    }

    pub async fn summary(&self, auth: &AuthContext) -> Result<DashboardSummary> {
        ldebug!(
            "system",
            LogStage::Db,
            LogComponent::Dashboard,
            "dashboard_summary",
            "汇总仪表盘数据",
            user_id = %auth.user_id,
            role = %auth.role
        );
        match auth.role {
            UserRole::SuperAdmin => Ok(DashboardSummary::SuperAdmin(
                self.super_admin_summary().await?,
            )),
            UserRole::AdminSekolah => {
                let school_id = auth
                    .school_id
                    .ok_or_else(|| AppError::forbidden(ROLE_DENIED_MESSAGE))?;
                Ok(DashboardSummary::SchoolAdmin(
                    self.school_admin_summary(school_id).await?,
                ))
            }
            UserRole::Gtk => Ok(DashboardSummary::Gtk(self.gtk_summary(auth.user_id).await?)),
        }
    }

    async fn super_admin_summary(&self) -> Result<SuperAdminSummary> {
        let total_schools = schools::Entity::find()
            .count(self.db)
            .await
            .context("Failed to count schools")?;
        let total_users = users::Entity::find()
            .count(self.db)
            .await
            .context("Failed to count users")?;
        let total_gtk = self.count_role(UserRole::Gtk).await?;
        let total_admin_sekolah = self.count_role(UserRole::AdminSekolah).await?;
        let gtk_by_type = self.gtk_by_type(None).await?;

        let talents_by_status = self.talents_by_status(talents::Entity::find()).await?;
        let talents_by_type = TalentTypeCounts::from_rows(
            talents::Entity::find()
                .select_only()
                .column(talents::Column::TalentType)
                .column_as(talents::Column::Id.count(), "count")
                .group_by(talents::Column::TalentType)
                .into_tuple::<(TalentType, i64)>()
                .all(self.db)
                .await
                .context("Failed to group talents by type")?,
        );

        Ok(SuperAdminSummary {
            total_schools,
            total_users,
            total_gtk,
            total_admin_sekolah,
            gtk_by_type,
            total_talents: talents_by_status.total,
            talents_by_status,
            talents_by_type,
        })
    }

    async fn school_admin_summary(&self, school_id: Uuid) -> Result<SchoolAdminSummary> {
        let school = schools::Entity::find_by_id(school_id)
            .one(self.db)
            .await
            .context("Failed to load school")?
            .map(|s| SchoolSummaryRef {
                id: s.id,
                name: s.name,
            });

        let gtk_by_type = self.gtk_by_type(Some(school_id)).await?;
        let total_gtk = users::Entity::find()
            .filter(users::Column::Role.eq(UserRole::Gtk))
            .filter(users::Column::SchoolId.eq(school_id))
            .count(self.db)
            .await
            .context("Failed to count school gtk")?;

        let school_talents = talents::Entity::find()
            .join(JoinType::InnerJoin, talents::Relation::Owner.def())
            .filter(users::Column::SchoolId.eq(school_id));
        let talents_by_status = self.talents_by_status(school_talents).await?;

        Ok(SchoolAdminSummary {
            school,
            total_gtk,
            gtk_by_type,
            total_talents: talents_by_status.total,
            pending_verifications: talents_by_status.pending,
            talents_by_status,
        })
    }

    async fn gtk_summary(&self, user_id: Uuid) -> Result<GtkSummary> {
        let my_talents = self
            .talents_by_status(talents::Entity::find().filter(talents::Column::UserId.eq(user_id)))
            .await?;
        let unread_notifications = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .count(self.db)
            .await
            .context("Failed to count unread notifications")?;

        Ok(GtkSummary {
            my_talents,
            unread_notifications,
        })
    }

    async fn count_role(&self, role: UserRole) -> Result<u64> {
        users::Entity::find()
            .filter(users::Column::Role.eq(role))
            .count(self.db)
            .await
            .context("Failed to count users by role")
    }

    async fn gtk_by_type(&self, school_id: Option<Uuid>) -> Result<GtkTypeCounts> {
        let mut select = users::Entity::find().filter(users::Column::Role.eq(UserRole::Gtk));
        if let Some(school_id) = school_id {
            select = select.filter(users::Column::SchoolId.eq(school_id));
        }
        let rows = select
            .select_only()
            .column(users::Column::GtkType)
            .column_as(users::Column::Id.count(), "count")
            .group_by(users::Column::GtkType)
            .into_tuple::<(Option<GtkType>, i64)>()
            .all(self.db)
            .await
            .context("Failed to group gtk by type")?;
        Ok(GtkTypeCounts::from_rows(rows))
    }

    async fn talents_by_status(&self, select: Select<talents::Entity>) -> Result<TalentStatusCounts> {
        let rows = select
            .select_only()
            .column(talents::Column::Status)
            .column_as(talents::Column::Id.count(), "count")
            .group_by(talents::Column::Status)
            .into_tuple::<(TalentStatus, i64)>()
            .all(self.db)
            .await
            .context("Failed to group talents by status")?;
        Ok(TalentStatusCounts::from_rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_counts_sum_into_total() {
        let counts = TalentStatusCounts::from_rows(vec![
            (TalentStatus::Pending, 3),
            (TalentStatus::Rejected, 1),
        ]);
        assert_eq!(
            counts,
            TalentStatusCounts {
                pending: 3,
                approved: 0,
                rejected: 1,
                total: 4,
            }
        );
    }

    #[test]
    fn test_gtk_counts_ignore_untyped_rows() {
        let counts = GtkTypeCounts::from_rows(vec![(Some(GtkType::Guru), 5), (None, 2)]);
        assert_eq!(counts.guru, 5);
        assert_eq!(counts.tendik + counts.kepala_sekolah, 0);
    }
}
