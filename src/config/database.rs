//! # 数据库配置

use crate::error::{AppError, Result};
use crate::{
    linfo,
    logging::{LogComponent, LogStage},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 数据库URL
    pub url: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 连接超时时间（秒）
    pub connect_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/sipodi.db?mode=rwc".to_string(),
            max_connections: 10,
            connect_timeout: 30,
        }
    }
}

impl DatabaseConfig {
    /// 确保数据库路径存在（仅对SQLite文件数据库）
    pub fn ensure_database_path(&self) -> Result<()> {
        if let Some(db_path) = self.sqlite_file_path() {
            let db_path = Path::new(db_path);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::config_with_source(
                            format!("无法创建数据库目录: {}", parent.display()),
                            e,
                        )
                    })?;

                    linfo!(
                        "system",
                        LogStage::Startup,
                        LogComponent::Database,
                        "create_db_dir",
                        &format!("创建数据库目录: {}", parent.display())
                    );
                }
            }
        }

        Ok(())
    }

    /// SQLite 文件路径，内存库或其它数据库返回 None
    #[must_use]
    pub fn sqlite_file_path(&self) -> Option<&str> {
        if self.is_memory_database() {
            return None;
        }
        let rest = self.url.strip_prefix("sqlite://")?;
        Some(rest.split('?').next().unwrap_or(rest))
    }

    /// 检查是否为内存数据库
    #[must_use]
    pub fn is_memory_database(&self) -> bool {
        self.url.contains(":memory:")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_file_path_strips_query() {
        let config = DatabaseConfig {
            url: "sqlite://./data/sipodi.db?mode=rwc".to_string(),
            ..DatabaseConfig::default()
        };
        assert_eq!(config.sqlite_file_path(), Some("./data/sipodi.db"));
    }

    #[test]
    fn test_memory_database_has_no_path() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(config.is_memory_database());
        assert!(config.sqlite_file_path().is_none());
        assert!(config.ensure_database_path().is_ok());
    }

    #[test]
    fn test_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db_file = dir.path().join("nested").join("sipodi.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", db_file.display()),
            ..DatabaseConfig::default()
        };
        config.ensure_database_path().unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
