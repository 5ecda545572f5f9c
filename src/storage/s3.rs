//! S3 兼容网关（MinIO）客户端

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, StatusCode, header};
use std::time::Duration;
use url::Url;

use super::sigv4::{PresignRequest, SigningKey};
use super::{ObjectInfo, ObjectStorage, join_public_url};
use crate::config::StorageConfig;
use crate::error::{AppError, Result};
use crate::{
    linfo,
    logging::{LogComponent, LogStage},
};

/// 服务端内部请求使用的签名有效期
const INTERNAL_REQUEST_TTL: u64 = 300;

pub struct S3Storage {
    http: Client,
    signing: SigningKey,
    /// 服务端访问网关的地址
    endpoint: Url,
    /// 浏览器可访问的地址，用于预签名上传
    public_base: Url,
    public_url: String,
    bucket: String,
}

impl S3Storage {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint_url()).map_err(|e| {
            AppError::config_with_source(format!("无效的存储地址: {}", config.endpoint), e)
        })?;
        let public_base = if config.public_url.is_empty() {
            endpoint.clone()
        } else {
            Url::parse(&config.public_url).map_err(|e| {
                AppError::config_with_source(format!("无效的公开地址: {}", config.public_url), e)
            })?
        };
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::storage_with_source("无法创建存储 HTTP 客户端", e))?;

        Ok(Self {
            http,
            signing: SigningKey {
                access_key: config.access_key.clone(),
                secret_key: config.secret_key.clone(),
                region: config.region.clone(),
            },
            endpoint,
            public_base,
            public_url: config.public_url.clone(),
            bucket: config.bucket.clone(),
        })
    }

    fn object_path(&self, key: &str) -> String {
        format!("/{}/{}", self.bucket, key.trim_start_matches('/'))
    }

    fn sign(&self, method: &Method, base: &Url, path: &str, ttl: u64) -> Result<String> {
        self.signing.presign(PresignRequest {
            method: method.as_str(),
            base_url: base,
            path,
            expires_secs: ttl,
            now: Utc::now(),
        })
    }

    async fn send(&self, method: Method, path: &str) -> Result<reqwest::Response> {
        let url = self.sign(&method, &self.endpoint, path, INTERNAL_REQUEST_TTL)?;
        Ok(self.http.request(method, url).send().await?)
    }

    /// 存储桶不存在时创建
    pub async fn ensure_bucket(&self) -> Result<()> {
        let path = format!("/{}", self.bucket);
        let response = self.send(Method::HEAD, &path).await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                let created = self.send(Method::PUT, &path).await?;
                if !created.status().is_success() {
                    return Err(AppError::storage(format!(
                        "创建存储桶失败: {} ({})",
                        self.bucket,
                        created.status()
                    )));
                }
                linfo!(
                    "system",
                    LogStage::Startup,
                    LogComponent::Storage,
                    "bucket_created",
                    &format!("已创建存储桶: {}", self.bucket)
                );
                Ok(())
            }
            status => Err(AppError::storage(format!(
                "检查存储桶失败: {} ({status})",
                self.bucket
            ))),
        }
    }
}

/// 从 HEAD 响应头读取对象信息，缺少大小时视为网关异常
fn object_info(key: &str, headers: &header::HeaderMap) -> Result<ObjectInfo> {
    let size = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .ok_or_else(|| AppError::storage(format!("对象缺少有效的 Content-Length: {key}")))?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    Ok(ObjectInfo { size, content_type })
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn presigned_put_url(
        &self,
        key: &str,
        _content_type: &str,
        ttl: Duration,
    ) -> Result<String> {
        self.sign(&Method::PUT, &self.public_base, &self.object_path(key), ttl.as_secs())
    }

    async fn stat(&self, key: &str) -> Result<Option<ObjectInfo>> {
        let response = self.send(Method::HEAD, &self.object_path(key)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => object_info(key, response.headers()).map(Some),
            status => Err(AppError::storage(format!(
                "查询对象失败: {key} ({status})"
            ))),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self.send(Method::DELETE, &self.object_path(key)).await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(AppError::storage(format!("删除对象失败: {key} ({status})")))
        }
    }

    fn public_url(&self, key: &str) -> String {
        let base = if self.public_url.is_empty() {
            self.endpoint.as_str()
        } else {
            self.public_url.as_str()
        };
        join_public_url(base, &self.bucket, key)
    }
}
