//! # 配置管理模块
//!
//! 处理应用配置加载、环境变量覆盖和验证

mod app_config;
mod database;

pub use app_config::{
    AppConfig, AuthConfig, BootstrapConfig, ServerConfig, StorageBackend, StorageConfig,
    UploadConfig,
};
pub use database::DatabaseConfig;

use crate::error::{AppError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// 默认配置文件路径，按 `RUST_ENV` 区分
#[must_use]
pub fn default_config_path() -> PathBuf {
    let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
    PathBuf::from(format!("config/config.{env}.toml"))
}

/// 加载配置文件
///
/// 未指定路径时使用 [`default_config_path`]，随后应用环境变量覆盖并验证。
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config_file = path.map_or_else(default_config_path, Path::to_path_buf);

    if !config_file.exists() {
        return Err(AppError::config(format!(
            "配置文件不存在: {}",
            config_file.display()
        )));
    }

    let config_content = std::fs::read_to_string(&config_file).map_err(|e| {
        AppError::config_with_source(format!("读取配置文件失败: {}", config_file.display()), e)
    })?;

    let mut config: AppConfig = toml::from_str(&config_content)?;
    apply_env_overrides(&mut config, |key| env::var(key).ok());

    config.validate().map_err(AppError::config)?;

    Ok(config)
}

/// 使用环境变量覆盖敏感配置
fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = lookup("SIPODI_JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }
    if let Some(url) = lookup("SIPODI_DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(key) = lookup("SIPODI_S3_ACCESS_KEY") {
        config.storage.access_key = key;
    }
    if let Some(key) = lookup("SIPODI_S3_SECRET_KEY") {
        config.storage.secret_key = key;
    }
}
