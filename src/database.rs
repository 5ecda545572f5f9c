//! # 数据库模块
//!
//! 数据库连接、迁移管理与初始管理员账号

use chrono::Utc;
use entity::{enums::UserRole, users};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::AuthUtils;
use crate::config::{BootstrapConfig, DatabaseConfig};
use crate::error::{Context, Result};
use crate::{
    lerror, linfo, lwarn,
    logging::{LogComponent, LogStage},
};

/// 初始化数据库连接
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "connect",
        &format!("正在连接数据库: {}", redact_url(&config.url))
    );

    config.ensure_database_path()?;

    let mut options = ConnectOptions::new(config.url.clone());
    // SQLite 内存库每个连接都是独立的数据库
    let max_connections = if config.is_memory_database() {
        1
    } else {
        config.max_connections
    };
    options
        .max_connections(max_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .context("Failed to connect to database")?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "connected",
        "数据库连接成功"
    );
    Ok(db)
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "migrate",
        "开始运行数据库迁移..."
    );

    match ::migration::Migrator::up(db, None).await {
        Ok(()) => {
            linfo!(
                "system",
                LogStage::Startup,
                LogComponent::Database,
                "migrate_done",
                "数据库迁移完成"
            );
            Ok(())
        }
        Err(e) => {
            lerror!(
                "system",
                LogStage::Startup,
                LogComponent::Database,
                "migrate_failed",
                &format!("数据库迁移失败: {e}")
            );
            Err(e.into())
        }
    }
}

/// 检查数据库状态
pub async fn check_database_status(db: &DatabaseConnection) -> Result<()> {
    let pending = ::migration::Migrator::get_pending_migrations(db)
        .await
        .context("Failed to read migration status")?;

    if pending.is_empty() {
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Database,
            "migration_status",
            "所有迁移都已应用"
        );
    } else {
        lwarn!(
            "system",
            LogStage::Startup,
            LogComponent::Database,
            "migration_status",
            &format!("有 {} 个待应用的迁移", pending.len())
        );
    }

    Ok(())
}

/// 不存在超级管理员时按配置创建一个
///
/// 返回是否新建了账号。
pub async fn ensure_default_admin(
    db: &DatabaseConnection,
    bootstrap: Option<&BootstrapConfig>,
    bcrypt_cost: u32,
) -> Result<bool> {
    let existing = users::Entity::find()
        .filter(users::Column::Role.eq(UserRole::SuperAdmin))
        .count(db)
        .await
        .context("Failed to count super admins")?;
    if existing > 0 {
        return Ok(false);
    }

    let Some(bootstrap) = bootstrap else {
        lwarn!(
            "system",
            LogStage::Startup,
            LogComponent::Database,
            "no_super_admin",
            "数据库中没有超级管理员，且未配置 bootstrap 账号"
        );
        return Ok(false);
    };

    let now = Utc::now().naive_utc();
    let admin = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(bootstrap.email.trim().to_lowercase()),
        password_hash: Set(AuthUtils::hash_password(&bootstrap.password, bcrypt_cost)?),
        role: Set(UserRole::SuperAdmin),
        full_name: Set(bootstrap.full_name.clone()),
        photo_url: Set(None),
        nuptk: Set(None),
        nip: Set(None),
        gender: Set(None),
        birth_date: Set(None),
        gtk_type: Set(None),
        position: Set(None),
        school_id: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .context("Failed to create bootstrap super admin")?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "bootstrap_admin_created",
        "已创建初始超级管理员",
        user_id = %admin.id,
        email = %admin.email
    );
    Ok(true)
}

/// 隐藏连接串中的密码
fn redact_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("****"));
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}
