//! 人才查询与视图组装

use std::collections::HashMap;

use entity::enums::{TalentStatus, UserRole};
use entity::{schools, talents, users};
use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Select,
};
use uuid::Uuid;

use super::detail::{StoredDetail, load_detail, load_details};
use super::{
    TalentListItem, TalentListQuery, TalentOwner, TalentResponse, TalentsService, UserRef,
};
use crate::auth::AuthContext;
use crate::auth::permissions::{ROLE_DENIED_MESSAGE, ensure_can_read_talent};
use crate::error::{AppError, Context, Result};
use crate::management::services::shared::{Page, PaginationParams};

impl TalentsService<'_> {
    pub(super) async fn find_talent(&self, id: Uuid) -> Result<talents::Model> {
        talents::Entity::find_by_id(id)
            .one(self.db)
            .await
            .context("Failed to load talent")?
            .ok_or_else(|| AppError::not_found("Talenta"))
    }

    pub(super) async fn find_owner(&self, user_id: Uuid) -> Result<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(self.db)
            .await
            .context("Failed to load talent owner")?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// 按类型读取明细与证书地址
    pub async fn get_detail(&self, talent: &talents::Model) -> Result<StoredDetail> {
        load_detail(self.db, talent.talent_type, talent.id).await
    }

    /// 单条人才：本人、超级管理员或同校管理员可见
    pub async fn get(&self, auth: &AuthContext, id: Uuid) -> Result<TalentResponse> {
        let talent = self.find_talent(id).await?;
        let owner = self.find_owner(talent.user_id).await?;
        ensure_can_read_talent(auth, owner.id, owner.school_id)?;
        self.assemble(talent, owner).await
    }

    /// 按角色限定范围的列表：学校管理员限本校，GTK 限本人
    pub async fn list(
        &self,
        auth: &AuthContext,
        query: TalentListQuery,
    ) -> Result<Page<TalentListItem>> {
        let query = scope_query(auth, query)?;
        self.list_filtered(&query).await
    }

    /// 待审核列表
    pub async fn list_pending(
        &self,
        auth: &AuthContext,
        query: TalentListQuery,
    ) -> Result<Page<TalentListItem>> {
        let query = TalentListQuery {
            status: Some(TalentStatus::Pending),
            ..query
        };
        self.list(auth, query).await
    }

    /// 当前用户自己的人才，任何角色都只看到本人的记录
    pub async fn list_own(
        &self,
        auth: &AuthContext,
        query: TalentListQuery,
    ) -> Result<Page<TalentListItem>> {
        let query = TalentListQuery {
            user_id: Some(auth.user_id),
            school_id: None,
            ..query
        };
        self.list_filtered(&query).await
    }

    async fn list_filtered(&self, query: &TalentListQuery) -> Result<Page<TalentListItem>> {
        let params = PaginationParams::standard(query.page, query.limit);

        let total = filtered_talents(query)
            .count(self.db)
            .await
            .context("Failed to count talents")?;

        let rows = apply_sort(filtered_talents(query), query.sort.as_deref())
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await
            .context("Failed to fetch talents")?;

        let owner_ids: Vec<Uuid> = rows.iter().map(|t| t.user_id).collect();
        let owners: HashMap<Uuid, users::Model> = if owner_ids.is_empty() {
            HashMap::new()
        } else {
            users::Entity::find()
                .filter(users::Column::Id.is_in(owner_ids))
                .all(self.db)
                .await
                .context("Failed to load talent owners")?
                .into_iter()
                .map(|u| (u.id, u))
                .collect()
        };

        let school_ids: Vec<Uuid> = owners.values().filter_map(|u| u.school_id).collect();
        let school_names: HashMap<Uuid, String> = if school_ids.is_empty() {
            HashMap::new()
        } else {
            schools::Entity::find()
                .filter(schools::Column::Id.is_in(school_ids))
                .all(self.db)
                .await
                .context("Failed to load owner schools")?
                .into_iter()
                .map(|s| (s.id, s.name))
                .collect()
        };

        let mut details = load_details(self.db, &rows).await?;
        let mut items = Vec::with_capacity(rows.len());
        for talent in rows {
            let (detail, certificate_url) = details.remove(&talent.id).ok_or_else(|| {
                AppError::internal(format!("talent {} has no detail row", talent.id))
            })?;
            let owner = owners.get(&talent.user_id).ok_or_else(|| {
                AppError::internal(format!("talent {} has no owner", talent.id))
            })?;
            items.push(TalentListItem {
                id: talent.id,
                user: TalentOwner {
                    id: owner.id,
                    full_name: owner.full_name.clone(),
                    school_name: owner
                        .school_id
                        .and_then(|id| school_names.get(&id).cloned()),
                },
                talent_type: talent.talent_type,
                status: talent.status,
                detail,
                certificate_url,
                created_at: talent.created_at.and_utc(),
                updated_at: talent.updated_at.and_utc(),
            });
        }

        Ok(Page::new(items, total, params))
    }

    pub(super) async fn build_response(&self, talent: talents::Model) -> Result<TalentResponse> {
        let owner = self.find_owner(talent.user_id).await?;
        self.assemble(talent, owner).await
    }

    async fn assemble(&self, talent: talents::Model, owner: users::Model) -> Result<TalentResponse> {
        let (detail, certificate_url) = self.get_detail(&talent).await?;

        let verified_by = match talent.verified_by {
            Some(verifier_id) => users::Entity::find_by_id(verifier_id)
                .one(self.db)
                .await
                .context("Failed to load verifier")?
                .map(|v| UserRef {
                    id: v.id,
                    full_name: v.full_name,
                    nip: v.nip,
                }),
            None => None,
        };

        Ok(TalentResponse {
            id: talent.id,
            user: UserRef {
                id: owner.id,
                full_name: owner.full_name,
                nip: owner.nip,
            },
            talent_type: talent.talent_type,
            status: talent.status,
            detail,
            certificate_url,
            verified_by,
            verified_at: talent.verified_at.map(|at| at.and_utc()),
            rejection_reason: talent.rejection_reason,
            created_at: talent.created_at.and_utc(),
            updated_at: talent.updated_at.and_utc(),
        })
    }
}

/// 根据调用者角色收窄筛选条件
fn scope_query(auth: &AuthContext, mut query: TalentListQuery) -> Result<TalentListQuery> {
    match auth.role {
        UserRole::SuperAdmin => {}
        UserRole::AdminSekolah => {
            let school_id = auth
                .school_id
                .ok_or_else(|| AppError::forbidden(ROLE_DENIED_MESSAGE))?;
            query.school_id = Some(school_id);
        }
        UserRole::Gtk => {
            query.user_id = Some(auth.user_id);
            query.school_id = None;
        }
    }
    Ok(query)
}

fn filtered_talents(query: &TalentListQuery) -> Select<talents::Entity> {
    let mut select =
        talents::Entity::find().join(JoinType::InnerJoin, talents::Relation::Owner.def());

    if let Some(user_id) = query.user_id {
        select = select.filter(talents::Column::UserId.eq(user_id));
    }
    if let Some(school_id) = query.school_id {
        select = select.filter(users::Column::SchoolId.eq(school_id));
    }
    if let Some(talent_type) = query.talent_type {
        select = select.filter(talents::Column::TalentType.eq(talent_type));
    }
    if let Some(status) = query.status {
        select = select.filter(talents::Column::Status.eq(status));
    }
    if let Some(search) = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        select = select.filter(users::Column::FullName.like(format!("%{search}%")));
    }

    select
}

fn apply_sort(select: Select<talents::Entity>, sort: Option<&str>) -> Select<talents::Entity> {
    let sort = sort.map(str::trim).unwrap_or("-created_at");
    let (field, desc) = sort
        .strip_prefix('-')
        .map_or((sort, false), |field| (field, true));

    let column = match field {
        "updated_at" => talents::Column::UpdatedAt,
        "status" => talents::Column::Status,
        "talent_type" => talents::Column::TalentType,
        "created_at" => talents::Column::CreatedAt,
        _ => {
            return select
                .order_by_desc(talents::Column::CreatedAt)
                .order_by_asc(talents::Column::Id);
        }
    };

    let select = if desc {
        select.order_by_desc(column)
    } else {
        select.order_by_asc(column)
    };
    select.order_by_asc(talents::Column::Id)
}
