//! # 上传服务
//!
//! 预签名直传流程：申请票据，客户端 PUT 到对象存储，再确认或取消。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::app::AppContext;
use crate::auth::AuthContext;
use crate::error::{AppError, Result};
use crate::storage::{ObjectStorage, generate_object_key};
use crate::upload::{ConfirmedFile, UploadRegistry, UploadTicket, UploadType};
use crate::{
    linfo, lwarn,
    logging::{LogComponent, LogStage},
};

use super::shared::Validator;

const INVALID_FILE_TYPE_MESSAGE: &str =
    "Tipe file tidak diizinkan. Gunakan PDF atau gambar (JPG, PNG)";
const UNCLAIMABLE_UPLOAD_MESSAGE: &str =
    "File belum dikonfirmasi, sudah kedaluwarsa, atau tidak sesuai jenis upload";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PresignRequest {
    pub filename: String,
    pub content_type: String,
    pub upload_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresignResponse {
    pub upload_id: Uuid,
    pub upload_url: String,
    pub method: &'static str,
    pub object_key: String,
    pub expires_at: DateTime<Utc>,
    pub max_size: u64,
    pub allowed_types: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmUploadResponse {
    pub upload_id: Uuid,
    pub file_url: String,
    pub filename: String,
    pub file_size: u64,
    pub content_type: String,
}

/// 已认领的上传，持有原票据以便失败时归还
#[derive(Debug, Clone)]
pub struct ClaimedUpload {
    pub file_url: String,
    ticket: UploadTicket,
}

pub struct UploadService {
    storage: Arc<dyn ObjectStorage>,
    registry: Arc<UploadRegistry>,
    ticket_ttl: Duration,
}

impl UploadService {
    #[must_use]
    pub fn new(context: &AppContext) -> Self {
        let ttl_secs = i64::try_from(context.config.upload.ticket_ttl_secs).unwrap_or(3600);
        Self::with_parts(
            Arc::clone(&context.storage),
            Arc::clone(&context.uploads),
            Duration::seconds(ttl_secs),
        )
    }

    #[must_use]
    pub fn with_parts(
        storage: Arc<dyn ObjectStorage>,
        registry: Arc<UploadRegistry>,
        ticket_ttl: Duration,
    ) -> Self {
        Self {
            storage,
            registry,
            ticket_ttl,
        }
    }

    /// 校验类型后签发直传地址并登记票据
    pub async fn presign(&self, auth: &AuthContext, request: PresignRequest) -> Result<PresignResponse> {
        let mut v = Validator::new();
        let filename = v.required_text("filename", Some(request.filename), "Nama file wajib diisi");
        let content_type = v.required_text(
            "content_type",
            Some(request.content_type),
            "Tipe konten wajib diisi",
        );
        let upload_type = v.required_text(
            "upload_type",
            Some(request.upload_type),
            "Tipe upload wajib diisi",
        );
        v.finish()?;

        let (Some(filename), Some(content_type), Some(upload_type)) =
            (filename, content_type, upload_type)
        else {
            return Err(AppError::internal("validated upload fields missing"));
        };

        let upload_type: UploadType = upload_type
            .parse()
            .map_err(|_| AppError::bad_request("INVALID_FILE_TYPE", INVALID_FILE_TYPE_MESSAGE))?;
        if !upload_type.accepts(&content_type) {
            return Err(AppError::bad_request(
                "INVALID_FILE_TYPE",
                INVALID_FILE_TYPE_MESSAGE,
            ));
        }

        let object_key = generate_object_key(upload_type.as_str(), &filename, Utc::now());
        let ttl = self
            .ticket_ttl
            .to_std()
            .map_err(|e| AppError::config_with_source("invalid upload ticket ttl", e))?;
        let upload_url = self
            .storage
            .presigned_put_url(&object_key, &content_type, ttl)
            .await?;

        let ticket = UploadTicket::new(
            auth.user_id,
            object_key.clone(),
            upload_type,
            filename,
            content_type,
            self.ticket_ttl,
        );
        let response = PresignResponse {
            upload_id: ticket.upload_id,
            upload_url,
            method: "PUT",
            object_key,
            expires_at: ticket.expires_at,
            max_size: upload_type.max_size(),
            allowed_types: upload_type.allowed_content_types(),
        };
        self.registry.insert(ticket).await;

        linfo!(
            "system",
            LogStage::Storage,
            LogComponent::Upload,
            "upload_presigned",
            "已签发上传地址",
            upload_id = %response.upload_id,
            user_id = %auth.user_id,
            upload_type = %upload_type
        );

        Ok(response)
    }

    /// 确认对象已上传且未超出大小限制
    pub async fn confirm(&self, auth: &AuthContext, upload_id: Uuid) -> Result<ConfirmUploadResponse> {
        let ticket = self.owned_ticket(auth, upload_id).await?;
        if ticket.is_confirmed() {
            return Err(AppError::UploadNotFound);
        }

        let Some(info) = self.storage.stat(&ticket.object_key).await? else {
            return Err(AppError::bad_request(
                "FILE_NOT_UPLOADED",
                "File belum diupload",
            ));
        };

        let max_size = ticket.upload_type.max_size();
        if info.size > max_size {
            if let Err(err) = self.storage.delete(&ticket.object_key).await {
                lwarn!(
                    "system",
                    LogStage::Storage,
                    LogComponent::Upload,
                    "oversized_delete_failed",
                    &format!("删除超限对象失败: {err}"),
                    object_key = %ticket.object_key
                );
            }
            self.registry.remove(upload_id).await;
            return Err(AppError::bad_request(
                "FILE_TOO_LARGE",
                format!(
                    "Ukuran file melebihi batas maksimal {} MB",
                    max_size / (1024 * 1024)
                ),
            ));
        }

        let file_url = self.storage.public_url(&ticket.object_key);
        let confirmed = ConfirmedFile {
            file_url: file_url.clone(),
            file_size: info.size,
        };
        if !self
            .registry
            .mark_confirmed(upload_id, confirmed, Utc::now() + self.ticket_ttl)
            .await
        {
            return Err(AppError::UploadNotFound);
        }

        linfo!(
            "system",
            LogStage::Storage,
            LogComponent::Upload,
            "upload_confirmed",
            "上传已确认",
            upload_id = %upload_id,
            size = info.size
        );

        Ok(ConfirmUploadResponse {
            upload_id,
            file_url,
            filename: ticket.filename,
            file_size: info.size,
            content_type: info.content_type.unwrap_or(ticket.content_type),
        })
    }

    /// 取消上传：尽力删除对象并移除票据
    pub async fn cancel(&self, auth: &AuthContext, upload_id: Uuid) -> Result<()> {
        let ticket = self.owned_ticket(auth, upload_id).await?;

        if let Err(err) = self.storage.delete(&ticket.object_key).await {
            lwarn!(
                "system",
                LogStage::Storage,
                LogComponent::Upload,
                "cancel_delete_failed",
                &format!("取消上传时删除对象失败: {err}"),
                object_key = %ticket.object_key
            );
        }
        self.registry.remove(upload_id).await;
        Ok(())
    }

    /// 认领调用者已确认的上传，票据随之移出注册表
    ///
    /// 只有确认过、未过期且类型匹配的票据才能被认领；业务写入失败时
    /// 应通过 [`UploadService::release`] 归还票据。
    pub async fn claim(
        &self,
        upload_id: Uuid,
        user_id: Uuid,
        upload_type: UploadType,
    ) -> Result<ClaimedUpload> {
        let ticket = self
            .registry
            .take_confirmed(upload_id, user_id, upload_type, Utc::now())
            .await
            .ok_or_else(|| AppError::field("upload_id", UNCLAIMABLE_UPLOAD_MESSAGE))?;
        let file_url = ticket
            .confirmed
            .as_ref()
            .map(|file| file.file_url.clone())
            .ok_or_else(|| AppError::internal("claimed upload ticket is not confirmed"))?;
        Ok(ClaimedUpload { file_url, ticket })
    }

    /// 归还认领后未被使用的票据
    pub async fn release(&self, claimed: ClaimedUpload) {
        self.registry.insert(claimed.ticket).await;
    }

    async fn owned_ticket(&self, auth: &AuthContext, upload_id: Uuid) -> Result<UploadTicket> {
        self.registry
            .get(upload_id, Utc::now())
            .await
            .filter(|ticket| ticket.user_id == auth.user_id)
            .ok_or(AppError::UploadNotFound)
    }
}
