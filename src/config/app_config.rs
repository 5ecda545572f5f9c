//! # 应用配置结构定义

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP 服务配置
    pub server: ServerConfig,
    /// 数据库配置
    pub database: super::DatabaseConfig,
    /// 认证配置
    pub auth: AuthConfig,
    /// 对象存储配置
    pub storage: StorageConfig,
    /// 上传票据配置
    pub upload: UploadConfig,
    /// 首次启动时创建的超级管理员（可选）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<BootstrapConfig>,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// API 路由前缀
    pub api_prefix: String,
    /// 是否启用 CORS
    pub enable_cors: bool,
    /// 允许的跨域来源
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            api_prefix: "/api/v1".to_string(),
            enable_cors: true,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl ServerConfig {
    /// 获取绑定地址
    pub fn bind_address(&self) -> std::io::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid address '{addr}': {e}"),
            )
        })
    }
}

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT 签名密钥
    pub jwt_secret: String,
    /// 访问令牌有效期（秒）
    pub access_ttl_secs: u64,
    /// 刷新令牌有效期（秒）
    pub refresh_ttl_secs: u64,
    /// bcrypt 计算成本
    pub bcrypt_cost: u32,
    pub issuer: String,
    pub audience: String,
    /// 刷新令牌 Cookie 是否带 Secure 标记
    pub secure_cookie: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 604_800,
            bcrypt_cost: 10,
            issuer: "sipodi".to_string(),
            audience: "sipodi-app".to_string(),
            secure_cookie: true,
        }
    }
}

/// 存储后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// S3 兼容网关（如 MinIO）
    #[default]
    S3,
    /// 进程内存储，仅用于开发与测试
    Memory,
}

/// 对象存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// 网关地址，形如 `localhost:9000`
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    pub use_ssl: bool,
    /// 对外访问的基础地址
    pub public_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            endpoint: "localhost:9000".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            bucket: "sipodi".to_string(),
            region: "us-east-1".to_string(),
            use_ssl: false,
            public_url: "http://localhost:9000".to_string(),
        }
    }
}

impl StorageConfig {
    /// 网关的完整基础地址
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            return self.endpoint.trim_end_matches('/').to_string();
        }
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{scheme}://{}", self.endpoint.trim_end_matches('/'))
    }
}

/// 上传票据配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// 预签名地址与票据的有效期（秒）
    pub ticket_ttl_secs: u64,
    /// 过期票据清理间隔（秒）
    pub sweep_interval_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            ticket_ttl_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

/// 初始超级管理员
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub email: String,
    pub password: String,
    #[serde(default = "default_admin_name")]
    pub full_name: String,
}

fn default_admin_name() -> String {
    "Super Admin".to_string()
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be greater than 0".to_string());
        }
        if !self.server.api_prefix.starts_with('/') {
            return Err("server.api_prefix must start with '/'".to_string());
        }

        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }

        if self.auth.jwt_secret.is_empty() {
            return Err("auth.jwt_secret cannot be empty".to_string());
        }
        if self.auth.access_ttl_secs == 0 || self.auth.refresh_ttl_secs == 0 {
            return Err("token ttl must be greater than 0".to_string());
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err("auth.bcrypt_cost must be between 4 and 31".to_string());
        }

        if self.storage.backend == StorageBackend::S3 {
            if self.storage.endpoint.is_empty() || self.storage.bucket.is_empty() {
                return Err("storage.endpoint and storage.bucket cannot be empty".to_string());
            }
            if self.storage.access_key.is_empty() || self.storage.secret_key.is_empty() {
                return Err("storage credentials cannot be empty".to_string());
            }
        }

        if self.upload.ticket_ttl_secs == 0 || self.upload.sweep_interval_secs == 0 {
            return Err("upload ttl and sweep interval must be greater than 0".to_string());
        }

        if let Some(bootstrap) = &self.bootstrap {
            if bootstrap.email.is_empty() || bootstrap.password.len() < 8 {
                return Err(
                    "bootstrap requires an email and a password of at least 8 characters"
                        .to_string(),
                );
            }
        }

        Ok(())
    }
}
