//! # 测试数据 Fixtures
//!
//! 用户、学校与人才的构建器，直接写库以绕过业务校验

use chrono::Utc;
use entity::enums::{GtkType, SchoolStatus, TalentType, UserRole};
use entity::{schools, users};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::auth::{AuthContext, AuthUtils};
use crate::error::{Context, Result};
use crate::management::services::talents::CreateTalentRequest;
use crate::testing::helpers::TEST_BCRYPT_COST;

/// 所有用户 fixture 的默认密码
pub const DEFAULT_PASSWORD: &str = "rahasia123";

/// 用户测试数据构建器
pub struct UserFixture {
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub full_name: String,
    pub gtk_type: Option<GtkType>,
    pub nip: Option<String>,
    pub school_id: Option<Uuid>,
    pub is_active: bool,
}

impl Default for UserFixture {
    fn default() -> Self {
        Self {
            email: format!("gtk-{}@sipodi.test", Uuid::new_v4().simple()),
            password: DEFAULT_PASSWORD.to_string(),
            role: UserRole::Gtk,
            full_name: "Guru Uji".to_string(),
            gtk_type: Some(GtkType::Guru),
            nip: None,
            school_id: None,
            is_active: true,
        }
    }
}

impl UserFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn super_admin() -> Self {
        Self {
            email: format!("root-{}@sipodi.test", Uuid::new_v4().simple()),
            role: UserRole::SuperAdmin,
            full_name: "Super Admin".to_string(),
            gtk_type: None,
            ..Self::default()
        }
    }

    pub fn school_admin(school_id: Uuid) -> Self {
        Self {
            email: format!("admin-{}@sipodi.test", Uuid::new_v4().simple()),
            role: UserRole::AdminSekolah,
            full_name: "Admin Sekolah".to_string(),
            gtk_type: None,
            school_id: Some(school_id),
            ..Self::default()
        }
    }

    pub fn gtk(school_id: Uuid) -> Self {
        Self {
            school_id: Some(school_id),
            ..Self::default()
        }
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    pub fn full_name(mut self, full_name: &str) -> Self {
        self.full_name = full_name.to_string();
        self
    }

    pub fn gtk_type(mut self, gtk_type: GtkType) -> Self {
        self.gtk_type = Some(gtk_type);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn to_active_model(self) -> Result<users::ActiveModel> {
        let now = Utc::now().naive_utc();
        Ok(users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(self.email.to_lowercase()),
            password_hash: Set(AuthUtils::hash_password(&self.password, TEST_BCRYPT_COST)?),
            role: Set(self.role),
            full_name: Set(self.full_name),
            photo_url: Set(None),
            nuptk: Set(None),
            nip: Set(self.nip),
            gender: Set(None),
            birth_date: Set(None),
            gtk_type: Set(self.gtk_type),
            position: Set(None),
            school_id: Set(self.school_id),
            is_active: Set(self.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        })
    }

    pub async fn insert(self, db: &DatabaseConnection) -> Result<users::Model> {
        self.to_active_model()?
            .insert(db)
            .await
            .context("Failed to insert user fixture")
    }
}

/// 学校测试数据构建器
pub struct SchoolFixture {
    pub name: String,
    pub npsn: String,
    pub status: SchoolStatus,
    pub address: Option<String>,
}

impl Default for SchoolFixture {
    fn default() -> Self {
        let suffix = Uuid::new_v4().as_u128() % 100_000_000;
        Self {
            name: "SMA Negeri Uji".to_string(),
            npsn: format!("{suffix:08}"),
            status: SchoolStatus::Negeri,
            address: None,
        }
    }
}

impl SchoolFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn npsn(mut self, npsn: &str) -> Self {
        self.npsn = npsn.to_string();
        self
    }

    pub fn swasta(mut self) -> Self {
        self.status = SchoolStatus::Swasta;
        self
    }

    pub async fn insert(self, db: &DatabaseConnection) -> Result<schools::Model> {
        let now = Utc::now().naive_utc();
        schools::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(self.name),
            npsn: Set(self.npsn),
            status: Set(self.status),
            address: Set(self.address),
            head_master_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .context("Failed to insert school fixture")
    }
}

/// 用户对应的请求上下文
#[must_use]
pub fn auth_of(user: &users::Model) -> AuthContext {
    AuthContext::from(user)
}

/// 各人才类型的合法明细
#[must_use]
pub fn sample_detail(talent_type: TalentType) -> Value {
    match talent_type {
        TalentType::PesertaPelatihan => json!({
            "activity_name": "Pelatihan Kurikulum Merdeka",
            "organizer": "BGP Provinsi",
            "start_date": "2025-01-15",
            "duration_days": 5
        }),
        TalentType::PembimbingLomba => json!({
            "competition_name": "Olimpiade Sains Nasional",
            "level": "nasional",
            "organizer": "Puspresnas",
            "field": "akademik",
            "achievement": "Medali Perak"
        }),
        TalentType::PesertaLomba => json!({
            "competition_name": "Lomba Guru Inovatif",
            "level": "provinsi",
            "organizer": "Dinas Pendidikan",
            "field": "inovasi",
            "start_date": "2025-03-01",
            "duration_days": 2,
            "competition_field": "Media Pembelajaran",
            "achievement": "Juara 2"
        }),
        TalentType::MinatBakat => json!({
            "interest_name": "Paduan Suara",
            "description": "Pelatih paduan suara sekolah"
        }),
    }
}

/// 以合法明细构造新建人才请求
#[must_use]
pub fn talent_request(talent_type: TalentType) -> CreateTalentRequest {
    CreateTalentRequest {
        talent_type,
        detail: Some(sample_detail(talent_type)),
        certificate_url: None,
        upload_id: None,
    }
}
