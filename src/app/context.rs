//! 应用上下文（DI 容器）
//!
//! 统一持有跨模块共享的组件，便于在测试中注入替身实现。

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::JwtManager;
use crate::config::AppConfig;
use crate::error::Result;
use crate::storage::ObjectStorage;
use crate::upload::UploadRegistry;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub database: Arc<DatabaseConnection>,
    pub jwt: Arc<JwtManager>,
    pub storage: Arc<dyn ObjectStorage>,
    pub uploads: Arc<UploadRegistry>,
}

impl AppContext {
    /// 从配置构建上下文，JWT 管理器由认证配置派生
    pub fn new(
        config: Arc<AppConfig>,
        database: Arc<DatabaseConnection>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Result<Self> {
        let jwt = Arc::new(JwtManager::new(&config.auth)?);
        Ok(Self {
            config,
            database,
            jwt,
            storage,
            uploads: Arc::new(UploadRegistry::new()),
        })
    }

    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        self.database.as_ref()
    }
}
