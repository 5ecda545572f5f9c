//! # 学校管理服务

use chrono::{DateTime, Utc};
use entity::enums::{GtkType, SchoolStatus, UserRole};
use entity::{schools, users};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::app::AppContext;
use crate::auth::AuthContext;
use crate::error::{AppError, Context, Result, WriteContext};
use crate::{
    linfo,
    logging::{LogComponent, LogStage},
};

use super::shared::validation::normalize_optional;
use super::shared::{Page, PaginationParams, Validator};
use super::talents::UserRef;
use super::users::{UserListQuery, UserResponse, UsersService};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchoolListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// 匹配名称或 NPSN
    pub search: Option<String>,
    pub status: Option<SchoolStatus>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateSchoolRequest {
    pub name: String,
    pub npsn: String,
    pub status: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateSchoolRequest {
    pub name: Option<String>,
    pub npsn: Option<String>,
    pub status: Option<String>,
    pub address: Option<String>,
    pub head_master_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchoolResponse {
    pub id: Uuid,
    pub name: String,
    pub npsn: String,
    pub status: SchoolStatus,
    pub address: Option<String>,
    pub head_master: Option<UserRef>,
    pub gtk_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 学校详情，额外包含按 GTK 类型的人数
#[derive(Debug, Clone, Serialize)]
pub struct SchoolDetailResponse {
    #[serde(flatten)]
    pub school: SchoolResponse,
    pub guru_count: u64,
    pub tendik_count: u64,
    pub kepala_sekolah_count: u64,
}

pub struct SchoolsService<'a> {
    context: &'a AppContext,
    db: &'a DatabaseConnection,
}

impl<'a> SchoolsService<'a> {
    #[must_use]
    pub fn new(context: &'a AppContext) -> Self {
        Self {
            context,
            db: context.database.as_ref(),
        }
    }

    async fn fetch_school(&self, id: Uuid) -> Result<schools::Model> {
        schools::Entity::find_by_id(id)
            .one(self.db)
            .await
            .context("Failed to load school")?
            .ok_or_else(|| AppError::not_found("Sekolah"))
    }

    async fn count_gtk(&self, school_id: Uuid, gtk_type: Option<GtkType>) -> Result<u64> {
        let mut select = users::Entity::find()
            .filter(users::Column::SchoolId.eq(school_id))
            .filter(users::Column::Role.eq(UserRole::Gtk));
        if let Some(gtk_type) = gtk_type {
            select = select.filter(users::Column::GtkType.eq(gtk_type));
        }
        select
            .count(self.db)
            .await
            .context("Failed to count school gtk")
    }

    async fn head_master_ref(&self, head_master_id: Option<Uuid>) -> Result<Option<UserRef>> {
        let Some(id) = head_master_id else {
            return Ok(None);
        };
        Ok(users::Entity::find_by_id(id)
            .one(self.db)
            .await
            .context("Failed to load head master")?
            .map(|u| UserRef {
                id: u.id,
                full_name: u.full_name,
                nip: u.nip,
            }))
    }

    async fn to_response(&self, school: schools::Model) -> Result<SchoolResponse> {
        let head_master = self.head_master_ref(school.head_master_id).await?;
        let gtk_count = self.count_gtk(school.id, None).await?;
        Ok(build_response(school, head_master, gtk_count))
    }

    pub async fn list(&self, query: &SchoolListQuery) -> Result<Page<SchoolResponse>> {
        let params = PaginationParams::standard(query.page, query.limit);

        let total = filtered_schools(query)
            .count(self.db)
            .await
            .context("Failed to count schools")?;

        let rows = apply_school_sort(filtered_schools(query), query.sort.as_deref())
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await
            .context("Failed to fetch schools")?;

        let head_master_ids: Vec<Uuid> = rows.iter().filter_map(|s| s.head_master_id).collect();
        let head_masters: HashMap<Uuid, UserRef> = if head_master_ids.is_empty() {
            HashMap::new()
        } else {
            users::Entity::find()
                .filter(users::Column::Id.is_in(head_master_ids))
                .all(self.db)
                .await
                .context("Failed to load head masters")?
                .into_iter()
                .map(|u| {
                    (
                        u.id,
                        UserRef {
                            id: u.id,
                            full_name: u.full_name,
                            nip: u.nip,
                        },
                    )
                })
                .collect()
        };

        let mut items = Vec::with_capacity(rows.len());
        for school in rows {
            let gtk_count = self.count_gtk(school.id, None).await?;
            let head_master = school
                .head_master_id
                .and_then(|id| head_masters.get(&id).cloned());
            items.push(build_response(school, head_master, gtk_count));
        }

        Ok(Page::new(items, total, params))
    }

    /// 学校详情：超级管理员，或属于该校的用户
    pub async fn get(&self, auth: &AuthContext, id: Uuid) -> Result<SchoolDetailResponse> {
        if !auth.is_super_admin() && auth.school_id != Some(id) {
            return Err(AppError::forbidden(
                "Anda tidak memiliki akses ke sekolah ini",
            ));
        }

        let school = self.fetch_school(id).await?;
        let guru_count = self.count_gtk(id, Some(GtkType::Guru)).await?;
        let tendik_count = self.count_gtk(id, Some(GtkType::Tendik)).await?;
        let kepala_sekolah_count = self.count_gtk(id, Some(GtkType::KepalaSekolah)).await?;

        Ok(SchoolDetailResponse {
            school: self.to_response(school).await?,
            guru_count,
            tendik_count,
            kepala_sekolah_count,
        })
    }

    pub async fn create(&self, request: CreateSchoolRequest) -> Result<SchoolResponse> {
        let mut v = Validator::new();
        let name = v.required_text("name", Some(request.name), "Nama sekolah wajib diisi");
        let npsn = v.required_text("npsn", Some(request.npsn), "NPSN wajib diisi");
        let status: Option<SchoolStatus> =
            v.required_enum("status", request.status, "Status harus negeri atau swasta");
        let address = v.required_text("address", request.address, "Alamat wajib diisi");
        v.finish()?;

        let (Some(name), Some(npsn), Some(status), Some(address)) = (name, npsn, status, address)
        else {
            return Err(AppError::internal("validated school fields missing"));
        };

        self.ensure_unique_npsn(&npsn, None).await?;

        let now = Utc::now().naive_utc();
        let school = schools::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            npsn: Set(npsn),
            status: Set(status),
            address: Set(Some(address)),
            head_master_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await
        .write_context("Failed to create school")?;

        linfo!(
            "system",
            LogStage::Db,
            LogComponent::Schools,
            "school_created",
            "学校已创建",
            school_id = %school.id,
            npsn = %school.npsn
        );

        self.to_response(school).await
    }

    pub async fn update(&self, id: Uuid, request: UpdateSchoolRequest) -> Result<SchoolResponse> {
        let mut v = Validator::new();
        let name = request
            .name
            .and_then(|name| v.required_text("name", Some(name), "Nama sekolah wajib diisi"));
        let npsn = request
            .npsn
            .and_then(|npsn| v.required_text("npsn", Some(npsn), "NPSN wajib diisi"));
        let status: Option<SchoolStatus> = request.status.and_then(|status| {
            v.required_enum("status", Some(status), "Status harus negeri atau swasta")
        });
        v.finish()?;

        let school = self.fetch_school(id).await?;

        if let Some(npsn) = &npsn {
            self.ensure_unique_npsn(npsn, Some(id)).await?;
        }
        if let Some(head_master_id) = request.head_master_id {
            let head_master = users::Entity::find_by_id(head_master_id)
                .one(self.db)
                .await
                .context("Failed to load head master")?;
            if !head_master.is_some_and(|u| u.gtk_type == Some(GtkType::KepalaSekolah)) {
                return Err(AppError::InvalidHeadMaster);
            }
        }

        let mut active: schools::ActiveModel = school.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(npsn) = npsn {
            active.npsn = Set(npsn);
        }
        if let Some(status) = status {
            active.status = Set(status);
        }
        if let Some(address) = request.address {
            active.address = Set(normalize_optional(Some(address)));
        }
        if let Some(head_master_id) = request.head_master_id {
            active.head_master_id = Set(Some(head_master_id));
        }
        active.updated_at = Set(Utc::now().naive_utc());

        let updated = active
            .update(self.db)
            .await
            .write_context("Failed to update school")?;
        self.to_response(updated).await
    }

    /// 删除学校，仍有用户时拒绝
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let school = self.fetch_school(id).await?;

        let members = users::Entity::find()
            .filter(users::Column::SchoolId.eq(school.id))
            .count(self.db)
            .await
            .context("Failed to count school users")?;
        if members > 0 {
            return Err(AppError::SchoolHasUsers);
        }

        schools::Entity::delete_by_id(school.id)
            .exec(self.db)
            .await
            .context("Failed to delete school")?;

        linfo!(
            "system",
            LogStage::Db,
            LogComponent::Schools,
            "school_deleted",
            "学校已删除",
            school_id = %id
        );
        Ok(())
    }

    /// 学校成员列表，学校管理员只能查看本校
    pub async fn get_users(
        &self,
        auth: &AuthContext,
        id: Uuid,
        query: UserListQuery,
    ) -> Result<Page<UserResponse>> {
        if auth.is_school_admin() && auth.school_id != Some(id) {
            return Err(AppError::forbidden(
                "Anda hanya dapat melihat GTK di sekolah Anda",
            ));
        }
        self.fetch_school(id).await?;

        let query = UserListQuery {
            school_id: Some(id),
            ..query
        };
        UsersService::new(self.context).list_filtered(&query).await
    }

    async fn ensure_unique_npsn(&self, npsn: &str, exclude: Option<Uuid>) -> Result<()> {
        let mut select = schools::Entity::find().filter(schools::Column::Npsn.eq(npsn));
        if let Some(exclude) = exclude {
            select = select.filter(schools::Column::Id.ne(exclude));
        }
        let taken = select
            .count(self.db)
            .await
            .context("Failed to check npsn uniqueness")?;
        if taken > 0 {
            Err(AppError::conflict("DUPLICATE_NPSN", "NPSN sudah terdaftar"))
        } else {
            Ok(())
        }
    }
}

fn build_response(
    school: schools::Model,
    head_master: Option<UserRef>,
    gtk_count: u64,
) -> SchoolResponse {
    SchoolResponse {
        id: school.id,
        name: school.name,
        npsn: school.npsn,
        status: school.status,
        address: school.address,
        head_master,
        gtk_count,
        created_at: school.created_at.and_utc(),
        updated_at: school.updated_at.and_utc(),
    }
}

fn filtered_schools(query: &SchoolListQuery) -> Select<schools::Entity> {
    let mut select = schools::Entity::find();
    if let Some(search) = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = format!("%{search}%");
        select = select.filter(
            Condition::any()
                .add(schools::Column::Name.like(&pattern))
                .add(schools::Column::Npsn.like(&pattern)),
        );
    }
    if let Some(status) = query.status {
        select = select.filter(schools::Column::Status.eq(status));
    }
    select
}

fn apply_school_sort(
    select: Select<schools::Entity>,
    sort: Option<&str>,
) -> Select<schools::Entity> {
    let sort = sort.map(str::trim).unwrap_or("name");
    let (field, desc) = sort
        .strip_prefix('-')
        .map_or((sort, false), |field| (field, true));

    let (column, desc) = match field {
        "npsn" => (schools::Column::Npsn, desc),
        "created_at" => (schools::Column::CreatedAt, desc),
        "updated_at" => (schools::Column::UpdatedAt, desc),
        "name" => (schools::Column::Name, desc),
        _ => (schools::Column::Name, false),
    };

    let select = if desc {
        select.order_by_desc(column)
    } else {
        select.order_by_asc(column)
    };
    select.order_by_asc(schools::Column::Id)
}
