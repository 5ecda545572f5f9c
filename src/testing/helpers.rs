//! # 测试辅助函数
//!
//! 内存数据库、测试配置与完整的应用上下文

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::sync::{Arc, Once};
use tempfile::TempDir;
use tracing::Level;

use crate::app::AppContext;
use crate::auth::{AuthContext, AuthService, TokenPair};
use crate::config::{AppConfig, StorageBackend};
use crate::error::Result;
use crate::storage::MemoryStorage;

static INIT: Once = Once::new();

/// 测试 bcrypt 成本，取库允许的最小值
pub const TEST_BCRYPT_COST: u32 = 4;

/// 初始化测试日志
pub fn init_test_env() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 创建已迁移的内存数据库
///
/// 内存库只在单个连接内可见，因此连接池固定为一个连接。
pub async fn create_test_db() -> std::result::Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// 测试配置：内存存储、低成本哈希、非 Secure cookie
#[must_use]
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.auth.jwt_secret = "sipodi-test-secret".to_string();
    config.auth.bcrypt_cost = TEST_BCRYPT_COST;
    config.auth.secure_cookie = false;
    config.storage.backend = StorageBackend::Memory;
    config.server.enable_cors = false;
    config
}

/// 集成测试用的应用实例，持有具体的内存存储以模拟客户端直传
pub struct TestApp {
    pub context: Arc<AppContext>,
    pub storage: Arc<MemoryStorage>,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Result<Self> {
        init_test_env();
        let db = create_test_db().await?;
        Self::with_database(config, db)
    }

    /// 基于临时文件数据库，允许并发请求各自持有连接；`TempDir` 须存活到测试结束
    pub async fn with_temp_db() -> Result<(Self, TempDir)> {
        init_test_env();
        let (db, dir) = create_temp_db().await?;
        Ok((Self::with_database(test_config(), db)?, dir))
    }

    fn with_database(config: AppConfig, db: DatabaseConnection) -> Result<Self> {
        let storage = Arc::new(MemoryStorage::new(
            &config.storage.public_url,
            &config.storage.bucket,
        ));
        let context = AppContext::new(Arc::new(config), Arc::new(db), storage.clone())?;
        Ok(Self {
            context: Arc::new(context),
            storage,
        })
    }

    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        self.context.db()
    }

    /// 以账号密码登录，返回令牌对
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let (tokens, _) = AuthService::new(&self.context).login(email, password).await?;
        Ok(tokens)
    }

    /// 解析访问令牌得到请求上下文
    pub fn authenticate(&self, access_token: &str) -> Result<AuthContext> {
        AuthService::new(&self.context).authenticate(access_token)
    }
}

/// 创建基于临时文件的数据库，允许多个连接并发访问
pub async fn create_temp_db() -> std::result::Result<(DatabaseConnection, TempDir), DbErr> {
    let temp_dir = tempfile::tempdir()
        .map_err(|e| DbErr::Custom(format!("创建临时目录失败: {e}")))?;
    let db_url = format!("sqlite://{}?mode=rwc", temp_dir.path().join("test.db").display());

    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok((db, temp_dir))
}
