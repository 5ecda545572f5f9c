//! # 用户管理服务
//!
//! 集中管理个人资料、用户查询、创建、更新与启停用等业务逻辑，供 HTTP handler 复用。

use chrono::{DateTime, NaiveDate, Utc};
use entity::enums::{Gender, GtkType, UserRole};
use entity::{schools, users};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::app::AppContext;
use crate::auth::permissions::{
    ensure_assignable_role, ensure_can_read_user, ensure_not_self, ensure_school_scope,
};
use crate::auth::service::revoke_user_tokens;
use crate::auth::{AuthContext, AuthUtils};
use crate::error::{AppError, Context, Result, WriteContext};
use crate::{
    linfo,
    logging::{LogComponent, LogStage},
};

use super::shared::validation::normalize_optional;
use super::shared::{Page, PaginationParams, Validator};

/// 用户列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub role: Option<UserRole>,
    pub school_id: Option<Uuid>,
    pub gtk_type: Option<GtkType>,
    pub is_active: Option<bool>,
    /// 匹配姓名、邮箱、NUPTK 或 NIP
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// 创建用户请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub role: Option<UserRole>,
    pub full_name: String,
    pub nuptk: Option<String>,
    pub nip: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<String>,
    pub gtk_type: Option<GtkType>,
    pub position: Option<String>,
    pub school_id: Option<Uuid>,
}

/// 更新用户请求，缺省字段保持不变
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub nuptk: Option<String>,
    pub nip: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<String>,
    pub gtk_type: Option<GtkType>,
    pub position: Option<String>,
    pub school_id: Option<Uuid>,
}

/// 更新个人资料请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<String>,
    pub position: Option<String>,
}

/// 修改密码请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirmation: String,
}

/// 学校简要引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchoolRef {
    pub id: Uuid,
    pub name: String,
    pub npsn: String,
}

impl From<schools::Model> for SchoolRef {
    fn from(school: schools::Model) -> Self {
        Self {
            id: school.id,
            name: school.name,
            npsn: school.npsn,
        }
    }
}

/// 用户响应
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub full_name: String,
    pub photo_url: Option<String>,
    pub nuptk: Option<String>,
    pub nip: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub gtk_type: Option<GtkType>,
    pub position: Option<String>,
    pub is_active: bool,
    pub school: Option<SchoolRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    #[must_use]
    pub fn from_model(user: users::Model, school: Option<SchoolRef>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            full_name: user.full_name,
            photo_url: user.photo_url,
            nuptk: user.nuptk,
            nip: user.nip,
            gender: user.gender,
            birth_date: user.birth_date,
            gtk_type: user.gtk_type,
            position: user.position,
            is_active: user.is_active,
            school,
            created_at: user.created_at.and_utc(),
            updated_at: user.updated_at.and_utc(),
        }
    }
}

/// 用户服务
pub struct UsersService<'a> {
    db: &'a DatabaseConnection,
    bcrypt_cost: u32,
}

impl<'a> UsersService<'a> {
    #[must_use]
    pub fn new(context: &'a AppContext) -> Self {
        Self {
            db: context.database.as_ref(),
            bcrypt_cost: context.config.auth.bcrypt_cost,
        }
    }

    async fn fetch_user(&self, id: Uuid) -> Result<users::Model> {
        users::Entity::find_by_id(id)
            .one(self.db)
            .await
            .context("Failed to load user")?
            .ok_or_else(|| AppError::not_found("User"))
    }

    async fn school_ref(&self, school_id: Option<Uuid>) -> Result<Option<SchoolRef>> {
        let Some(school_id) = school_id else {
            return Ok(None);
        };
        Ok(schools::Entity::find_by_id(school_id)
            .one(self.db)
            .await
            .context("Failed to load user school")?
            .map(SchoolRef::from))
    }

    pub async fn to_response(&self, user: users::Model) -> Result<UserResponse> {
        let school = self.school_ref(user.school_id).await?;
        Ok(UserResponse::from_model(user, school))
    }

    /// 当前登录用户
    pub async fn get_me(&self, auth: &AuthContext) -> Result<UserResponse> {
        let user = self.fetch_user(auth.user_id).await?;
        self.to_response(user).await
    }

    pub async fn update_profile(
        &self,
        auth: &AuthContext,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse> {
        let mut v = Validator::new();
        let full_name = optional_required_text(
            &mut v,
            "full_name",
            request.full_name,
            "Nama lengkap wajib diisi",
        );
        let birth_date = v.optional_date(
            "birth_date",
            request.birth_date,
            "Format tanggal lahir tidak valid",
        );
        v.finish()?;

        let user = self.fetch_user(auth.user_id).await?;
        let mut active: users::ActiveModel = user.into();
        if let Some(full_name) = full_name {
            active.full_name = Set(full_name);
        }
        if let Some(gender) = request.gender {
            active.gender = Set(Some(gender));
        }
        if let Some(birth_date) = birth_date {
            active.birth_date = Set(Some(birth_date));
        }
        if let Some(position) = request.position {
            active.position = Set(normalize_optional(Some(position)));
        }
        active.updated_at = Set(Utc::now().naive_utc());

        let updated = active
            .update(self.db)
            .await
            .context("Failed to update profile")?;
        self.to_response(updated).await
    }

    /// 修改密码，需校验旧密码
    pub async fn change_password(
        &self,
        auth: &AuthContext,
        request: &ChangePasswordRequest,
    ) -> Result<()> {
        let mut v = Validator::new();
        v.check(
            !request.current_password.is_empty(),
            "current_password",
            "Password lama wajib diisi",
        );
        v.password("new_password", &request.new_password);
        v.check(
            request.new_password == request.new_password_confirmation,
            "new_password_confirmation",
            "Konfirmasi password tidak cocok",
        );
        v.finish()?;

        let user = self.fetch_user(auth.user_id).await?;
        if !AuthUtils::verify_password(&request.current_password, &user.password_hash) {
            return Err(AppError::InvalidPassword);
        }

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(AuthUtils::hash_password(
            &request.new_password,
            self.bcrypt_cost,
        )?);
        active.updated_at = Set(Utc::now().naive_utc());
        active
            .update(self.db)
            .await
            .context("Failed to update password")?;

        linfo!(
            "system",
            LogStage::Authentication,
            LogComponent::Users,
            "password_changed",
            "用户已修改密码",
            user_id = %auth.user_id
        );
        Ok(())
    }

    /// 更新头像地址
    pub async fn update_photo(
        &self,
        auth: &AuthContext,
        photo_url: Option<String>,
    ) -> Result<UserResponse> {
        let photo_url = normalize_optional(photo_url)
            .ok_or_else(|| AppError::field("photo_url", "Foto wajib diisi"))?;

        let user = self.fetch_user(auth.user_id).await?;
        let mut active: users::ActiveModel = user.into();
        active.photo_url = Set(Some(photo_url));
        active.updated_at = Set(Utc::now().naive_utc());
        let updated = active
            .update(self.db)
            .await
            .context("Failed to update photo")?;
        self.to_response(updated).await
    }

    /// 用户列表；学校管理员只能看到本校用户
    pub async fn list(
        &self,
        auth: &AuthContext,
        mut query: UserListQuery,
    ) -> Result<Page<UserResponse>> {
        if auth.is_school_admin() {
            query.school_id = Some(
                auth.school_id
                    .ok_or_else(|| AppError::forbidden("Anda tidak memiliki akses ke user ini"))?,
            );
        } else if !auth.is_super_admin() {
            return Err(AppError::forbidden("Anda tidak memiliki akses ke user ini"));
        }

        self.list_filtered(&query).await
    }

    /// 不做角色收窄的列表，供学校用户列表复用
    pub(crate) async fn list_filtered(&self, query: &UserListQuery) -> Result<Page<UserResponse>> {
        let params = PaginationParams::standard(query.page, query.limit);

        let total = filtered_users(query)
            .count(self.db)
            .await
            .context("Failed to count users")?;

        let rows = apply_user_sort(filtered_users(query), query.sort.as_deref())
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await
            .context("Failed to fetch users")?;

        let school_ids: Vec<Uuid> = rows.iter().filter_map(|u| u.school_id).collect();
        let schools: HashMap<Uuid, SchoolRef> = if school_ids.is_empty() {
            HashMap::new()
        } else {
            schools::Entity::find()
                .filter(schools::Column::Id.is_in(school_ids))
                .all(self.db)
                .await
                .context("Failed to load user schools")?
                .into_iter()
                .map(|s| (s.id, SchoolRef::from(s)))
                .collect()
        };

        let items = rows
            .into_iter()
            .map(|user| {
                let school = user.school_id.and_then(|id| schools.get(&id).cloned());
                UserResponse::from_model(user, school)
            })
            .collect();

        Ok(Page::new(items, total, params))
    }

    pub async fn get(&self, auth: &AuthContext, id: Uuid) -> Result<UserResponse> {
        let user = self.fetch_user(id).await?;
        ensure_can_read_user(auth, user.id, user.school_id)?;
        self.to_response(user).await
    }

    /// 创建用户
    pub async fn create(
        &self,
        auth: &AuthContext,
        request: CreateUserRequest,
    ) -> Result<UserResponse> {
        let mut v = Validator::new();
        v.email("email", &request.email);
        if request.password.is_empty() {
            v.push("password", "Password wajib diisi");
        } else {
            v.password("password", &request.password);
        }
        let full_name = v.required_text(
            "full_name",
            Some(request.full_name.clone()),
            "Nama lengkap wajib diisi",
        );
        if request.role.is_none() {
            v.push("role", "Role wajib diisi");
        }
        let birth_date = v.optional_date(
            "birth_date",
            request.birth_date.clone(),
            "Format tanggal lahir tidak valid",
        );
        v.finish()?;

        let (Some(role), Some(full_name)) = (request.role, full_name) else {
            return Err(AppError::field("role", "Role wajib diisi"));
        };

        ensure_assignable_role(auth, role)?;
        if auth.is_school_admin() {
            ensure_school_scope(
                auth,
                request.school_id,
                "Anda hanya dapat menambah user di sekolah Anda",
            )?;
        }
        self.ensure_school_exists(request.school_id).await?;

        let email = request.email.trim().to_lowercase();
        let nuptk = normalize_optional(request.nuptk);
        let nip = normalize_optional(request.nip);
        self.ensure_unique(None, Some(&email), nuptk.as_deref(), nip.as_deref())
            .await?;

        let now = Utc::now().naive_utc();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(AuthUtils::hash_password(
                &request.password,
                self.bcrypt_cost,
            )?),
            role: Set(role),
            full_name: Set(full_name),
            photo_url: Set(None),
            nuptk: Set(nuptk),
            nip: Set(nip),
            gender: Set(request.gender),
            birth_date: Set(birth_date),
            gtk_type: Set(request.gtk_type),
            position: Set(normalize_optional(request.position)),
            school_id: Set(request.school_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await
        .write_context("Failed to create user")?;

        linfo!(
            "system",
            LogStage::Db,
            LogComponent::Users,
            "user_created",
            "用户已创建",
            user_id = %user.id,
            role = %user.role,
            created_by = %auth.user_id
        );

        self.to_response(user).await
    }

    /// 更新用户
    pub async fn update(
        &self,
        auth: &AuthContext,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<UserResponse> {
        let mut v = Validator::new();
        let full_name = optional_required_text(
            &mut v,
            "full_name",
            request.full_name,
            "Nama lengkap wajib diisi",
        );
        let birth_date = v.optional_date(
            "birth_date",
            request.birth_date,
            "Format tanggal lahir tidak valid",
        );
        v.finish()?;

        let user = self.fetch_user(id).await?;
        ensure_manageable(auth, &user)?;
        if let Some(school_id) = request.school_id {
            if auth.is_school_admin() {
                ensure_school_scope(
                    auth,
                    Some(school_id),
                    "Anda hanya dapat mengelola user di sekolah Anda",
                )?;
            }
            self.ensure_school_exists(Some(school_id)).await?;
        }

        let nuptk = request.nuptk.map(|v| normalize_optional(Some(v)));
        let nip = request.nip.map(|v| normalize_optional(Some(v)));
        self.ensure_unique(
            Some(user.id),
            None,
            nuptk.as_ref().and_then(Option::as_deref),
            nip.as_ref().and_then(Option::as_deref),
        )
        .await?;

        let user_id = user.id;
        let demoted = user.gtk_type == Some(GtkType::KepalaSekolah)
            && request
                .gtk_type
                .is_some_and(|gtk_type| gtk_type != GtkType::KepalaSekolah);
        let moved_to = request.school_id.filter(|&school_id| user.school_id != Some(school_id));

        let mut active: users::ActiveModel = user.into();
        if let Some(full_name) = full_name {
            active.full_name = Set(full_name);
        }
        if let Some(nuptk) = nuptk {
            active.nuptk = Set(nuptk);
        }
        if let Some(nip) = nip {
            active.nip = Set(nip);
        }
        if let Some(gender) = request.gender {
            active.gender = Set(Some(gender));
        }
        if let Some(birth_date) = birth_date {
            active.birth_date = Set(Some(birth_date));
        }
        if let Some(gtk_type) = request.gtk_type {
            active.gtk_type = Set(Some(gtk_type));
        }
        if let Some(position) = request.position {
            active.position = Set(normalize_optional(Some(position)));
        }
        if let Some(school_id) = request.school_id {
            active.school_id = Set(Some(school_id));
        }
        active.updated_at = Set(Utc::now().naive_utc());

        let txn = self.db.begin().await.context("Failed to begin transaction")?;
        // 不再是校长，或调往其它学校时，解除原学校的校长关联
        if demoted || moved_to.is_some() {
            let mut detach = schools::Entity::update_many()
                .col_expr(schools::Column::HeadMasterId, Expr::value(Option::<Uuid>::None))
                .filter(schools::Column::HeadMasterId.eq(user_id));
            if let Some(school_id) = moved_to.filter(|_| !demoted) {
                detach = detach.filter(schools::Column::Id.ne(school_id));
            }
            let detached = detach
                .exec(&txn)
                .await
                .context("Failed to detach head master")?;
            if detached.rows_affected > 0 {
                linfo!(
                    "system",
                    LogStage::Db,
                    LogComponent::Users,
                    "head_master_detached",
                    "已解除校长关联",
                    user_id = %user_id,
                    schools = detached.rows_affected
                );
            }
        }
        let updated = active
            .update(&txn)
            .await
            .write_context("Failed to update user")?;
        txn.commit().await.context("Failed to commit user update")?;
        self.to_response(updated).await
    }

    /// 删除用户；若为某校校长则同时解除关联
    pub async fn delete(&self, auth: &AuthContext, id: Uuid) -> Result<()> {
        ensure_not_self(auth, id)?;
        let user = self.fetch_user(id).await?;
        ensure_manageable(auth, &user)?;

        let txn = self.db.begin().await.context("Failed to begin transaction")?;
        schools::Entity::update_many()
            .col_expr(schools::Column::HeadMasterId, Expr::value(Option::<Uuid>::None))
            .filter(schools::Column::HeadMasterId.eq(user.id))
            .exec(&txn)
            .await
            .context("Failed to detach head master")?;
        users::Entity::delete_by_id(user.id)
            .exec(&txn)
            .await
            .context("Failed to delete user")?;
        txn.commit().await.context("Failed to commit user deletion")?;

        linfo!(
            "system",
            LogStage::Db,
            LogComponent::Users,
            "user_deleted",
            "用户已删除",
            user_id = %id,
            deleted_by = %auth.user_id
        );
        Ok(())
    }

    /// 启用或停用用户，停用时撤销其全部刷新令牌
    pub async fn set_active(
        &self,
        auth: &AuthContext,
        id: Uuid,
        is_active: bool,
    ) -> Result<UserResponse> {
        let user = self.fetch_user(id).await?;
        ensure_manageable(auth, &user)?;
        if !is_active {
            ensure_not_self(auth, id)?;
        }

        let txn = self.db.begin().await.context("Failed to begin transaction")?;
        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().naive_utc());
        let updated = active
            .update(&txn)
            .await
            .context("Failed to update user status")?;
        let revoked = if is_active {
            0
        } else {
            revoke_user_tokens(&txn, id).await?
        };
        txn.commit().await.context("Failed to commit user status")?;

        linfo!(
            "system",
            LogStage::Db,
            LogComponent::Users,
            "user_status_changed",
            "用户状态已变更",
            user_id = %id,
            is_active = is_active,
            revoked_sessions = revoked
        );

        self.to_response(updated).await
    }

    async fn ensure_school_exists(&self, school_id: Option<Uuid>) -> Result<()> {
        let Some(school_id) = school_id else {
            return Ok(());
        };
        let exists = schools::Entity::find_by_id(school_id)
            .one(self.db)
            .await
            .context("Failed to load school")?
            .is_some();
        if exists {
            Ok(())
        } else {
            Err(AppError::field("school_id", "Sekolah tidak ditemukan"))
        }
    }

    /// 邮箱、NUPTK、NIP 唯一性检查，`exclude` 为正在更新的用户
    async fn ensure_unique(
        &self,
        exclude: Option<Uuid>,
        email: Option<&str>,
        nuptk: Option<&str>,
        nip: Option<&str>,
    ) -> Result<()> {
        let checks = [
            (email, users::Column::Email, "EMAIL_TAKEN", "Email sudah terdaftar"),
            (nuptk, users::Column::Nuptk, "NUPTK_TAKEN", "NUPTK sudah terdaftar"),
            (nip, users::Column::Nip, "NIP_TAKEN", "NIP sudah terdaftar"),
        ];

        for (value, column, code, message) in checks {
            let Some(value) = value else { continue };
            let mut select = users::Entity::find().filter(column.eq(value));
            if let Some(exclude) = exclude {
                select = select.filter(users::Column::Id.ne(exclude));
            }
            let taken = select
                .count(self.db)
                .await
                .context("Failed to check user uniqueness")?;
            if taken > 0 {
                return Err(AppError::conflict(code, message));
            }
        }
        Ok(())
    }
}

/// 学校管理员只能管理本校用户
fn ensure_manageable(auth: &AuthContext, user: &users::Model) -> Result<()> {
    ensure_school_scope(
        auth,
        user.school_id,
        "Anda hanya dapat mengelola user di sekolah Anda",
    )
}

/// 字段缺省时不校验；给出时不得为空白
fn optional_required_text(
    v: &mut Validator,
    field: &str,
    value: Option<String>,
    message: &str,
) -> Option<String> {
    value.and_then(|value| v.required_text(field, Some(value), message))
}

fn filtered_users(query: &UserListQuery) -> Select<users::Entity> {
    let mut select = users::Entity::find();

    if let Some(search) = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = format!("%{search}%");
        select = select.filter(
            Condition::any()
                .add(users::Column::FullName.like(&pattern))
                .add(users::Column::Email.like(&pattern))
                .add(users::Column::Nuptk.like(&pattern))
                .add(users::Column::Nip.like(&pattern)),
        );
    }
    if let Some(role) = query.role {
        select = select.filter(users::Column::Role.eq(role));
    }
    if let Some(school_id) = query.school_id {
        select = select.filter(users::Column::SchoolId.eq(school_id));
    }
    if let Some(gtk_type) = query.gtk_type {
        select = select.filter(users::Column::GtkType.eq(gtk_type));
    }
    if let Some(is_active) = query.is_active {
        select = select.filter(users::Column::IsActive.eq(is_active));
    }

    select
}

fn apply_user_sort(select: Select<users::Entity>, sort: Option<&str>) -> Select<users::Entity> {
    let sort = sort.map(str::trim).unwrap_or("-created_at");
    let (field, desc) = sort
        .strip_prefix('-')
        .map_or((sort, false), |field| (field, true));

    let (column, desc) = match field {
        "full_name" => (users::Column::FullName, desc),
        "email" => (users::Column::Email, desc),
        "updated_at" => (users::Column::UpdatedAt, desc),
        "created_at" => (users::Column::CreatedAt, desc),
        _ => (users::Column::CreatedAt, true),
    };

    let select = if desc {
        select.order_by_desc(column)
    } else {
        select.order_by_asc(column)
    };
    select.order_by_asc(users::Column::Id)
}
