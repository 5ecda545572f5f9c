//! 人才的写操作与审核状态迁移

use chrono::Utc;
use entity::enums::{TalentStatus, TalentType};
use entity::talents;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use uuid::Uuid;

use super::detail::{TalentDetailInput, delete_detail, insert_detail};
use super::{
    BatchResult, CreateTalentRequest, FailedItem, TalentResponse, TalentsService,
    UpdateTalentRequest,
};
use crate::auth::AuthContext;
use crate::auth::permissions::{ensure_can_verify, ensure_talent_owner};
use crate::error::{AppError, Context, ErrorCategory, Result};
use crate::management::services::notifications::{TalentOutcome, notify_talent_owner};
use crate::management::services::shared::validation::normalize_optional;
use crate::{
    linfo, lwarn,
    logging::{LogComponent, LogStage},
};

impl TalentsService<'_> {
    /// GTK 为自己申报人才，初始状态为 pending
    pub async fn create(
        &self,
        auth: &AuthContext,
        request: CreateTalentRequest,
    ) -> Result<TalentResponse> {
        if !auth.is_gtk() {
            return Err(AppError::forbidden("Hanya GTK yang dapat menambahkan talenta"));
        }

        let detail =
            TalentDetailInput::from_parts(request.talent_type, request.detail)?.validate()?;
        let talent_type = detail.talent_type();
        let certificate_url = certificate_for(talent_type, request.certificate_url);

        let now = Utc::now().naive_utc();
        let txn = self.db.begin().await.context("Failed to begin transaction")?;
        let talent = talents::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(auth.user_id),
            talent_type: Set(talent_type),
            status: Set(TalentStatus::Pending),
            verified_by: Set(None),
            verified_at: Set(None),
            rejection_reason: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .context("Failed to insert talent")?;
        insert_detail(&txn, talent.id, detail, certificate_url).await?;
        txn.commit().await.context("Failed to commit talent")?;

        linfo!(
            "system",
            LogStage::Db,
            LogComponent::Talents,
            "talent_created",
            "人才记录已创建",
            talent_id = %talent.id,
            user_id = %auth.user_id,
            talent_type = %talent_type
        );

        self.build_response(talent).await
    }

    /// 覆盖明细并重置为待审核
    pub async fn update(
        &self,
        auth: &AuthContext,
        id: Uuid,
        request: UpdateTalentRequest,
    ) -> Result<TalentResponse> {
        let talent = self.find_talent(id).await?;
        ensure_talent_owner(
            auth,
            talent.user_id,
            "Anda hanya dapat mengubah talenta milik sendiri",
        )?;

        if request
            .talent_type
            .is_some_and(|requested| requested != talent.talent_type)
        {
            return Err(AppError::field(
                "talent_type",
                "Jenis talenta tidak dapat diubah",
            ));
        }

        let detail =
            TalentDetailInput::from_parts(talent.talent_type, request.detail)?.validate()?;
        let certificate_url = certificate_for(talent.talent_type, request.certificate_url);

        let txn = self.db.begin().await.context("Failed to begin transaction")?;
        delete_detail(&txn, talent.talent_type, talent.id).await?;
        insert_detail(&txn, talent.id, detail, certificate_url).await?;

        let mut active: talents::ActiveModel = talent.into();
        active.status = Set(TalentStatus::Pending);
        active.verified_by = Set(None);
        active.verified_at = Set(None);
        active.rejection_reason = Set(None);
        active.updated_at = Set(Utc::now().naive_utc());
        let updated = active
            .update(&txn)
            .await
            .context("Failed to reset talent status")?;
        txn.commit().await.context("Failed to commit talent update")?;

        linfo!(
            "system",
            LogStage::Db,
            LogComponent::Talents,
            "talent_updated",
            "人才记录已更新并重置为待审核",
            talent_id = %updated.id
        );

        self.build_response(updated).await
    }

    /// 删除人才，明细行由外键级联删除
    pub async fn delete(&self, auth: &AuthContext, id: Uuid) -> Result<()> {
        let talent = self.find_talent(id).await?;
        ensure_talent_owner(
            auth,
            talent.user_id,
            "Anda hanya dapat menghapus talenta milik sendiri",
        )?;

        talents::Entity::delete_by_id(talent.id)
            .exec(self.db)
            .await
            .context("Failed to delete talent")?;

        linfo!(
            "system",
            LogStage::Db,
            LogComponent::Talents,
            "talent_deleted",
            "人才记录已删除",
            talent_id = %id
        );
        Ok(())
    }

    pub async fn approve(&self, auth: &AuthContext, id: Uuid) -> Result<TalentResponse> {
        let talent = self.verify_one(auth, id, TalentOutcome::Approved).await?;
        self.build_response(talent).await
    }

    pub async fn reject(
        &self,
        auth: &AuthContext,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<TalentResponse> {
        let reason = required_reason(reason)?;
        let talent = self
            .verify_one(auth, id, TalentOutcome::Rejected { reason })
            .await?;
        self.build_response(talent).await
    }

    /// 逐条审核通过，单条失败不影响其它条目
    pub async fn batch_approve(&self, auth: &AuthContext, ids: Vec<Uuid>) -> Result<BatchResult> {
        ensure_batch_ids(&ids)?;
        Ok(self.verify_many(auth, ids, &TalentOutcome::Approved).await)
    }

    pub async fn batch_reject(
        &self,
        auth: &AuthContext,
        ids: Vec<Uuid>,
        reason: Option<String>,
    ) -> Result<BatchResult> {
        let reason = required_reason(reason)?;
        ensure_batch_ids(&ids)?;
        Ok(self
            .verify_many(auth, ids, &TalentOutcome::Rejected { reason })
            .await)
    }

    async fn verify_many(
        &self,
        auth: &AuthContext,
        ids: Vec<Uuid>,
        outcome: &TalentOutcome,
    ) -> BatchResult {
        let mut result = BatchResult::default();
        for id in ids {
            match self.verify_one(auth, id, outcome.clone()).await {
                Ok(_) => result.success_count += 1,
                Err(err) => {
                    if err.category() == ErrorCategory::Server {
                        err.log();
                    }
                    result.failed_ids.push(FailedItem {
                        id,
                        reason: err.public_message(),
                    });
                }
            }
        }
        result.failed_count = result.failed_ids.len();

        linfo!(
            "system",
            LogStage::Db,
            LogComponent::Verification,
            "batch_verified",
            "批量审核完成",
            verifier_id = %auth.user_id,
            success = result.success_count,
            failed = result.failed_count
        );
        result
    }

    /// 单条审核：范围检查后以 `status = pending` 为条件更新，然后通知所有者
    async fn verify_one(
        &self,
        auth: &AuthContext,
        id: Uuid,
        outcome: TalentOutcome,
    ) -> Result<talents::Model> {
        let talent = self.find_talent(id).await?;
        let owner = self.find_owner(talent.user_id).await?;
        ensure_can_verify(auth, owner.school_id)?;

        let (status, reason) = match &outcome {
            TalentOutcome::Approved => (TalentStatus::Approved, None),
            TalentOutcome::Rejected { reason } => (TalentStatus::Rejected, Some(reason.clone())),
        };
        let now = Utc::now().naive_utc();

        let updated = talents::Entity::update_many()
            .col_expr(talents::Column::Status, Expr::value(status))
            .col_expr(talents::Column::VerifiedBy, Expr::value(Some(auth.user_id)))
            .col_expr(talents::Column::VerifiedAt, Expr::value(Some(now)))
            .col_expr(talents::Column::RejectionReason, Expr::value(reason))
            .col_expr(talents::Column::UpdatedAt, Expr::value(now))
            .filter(talents::Column::Id.eq(id))
            .filter(talents::Column::Status.eq(TalentStatus::Pending))
            .exec(self.db)
            .await
            .context("Failed to update talent status")?;

        if updated.rows_affected == 0 {
            let still_exists = talents::Entity::find_by_id(id)
                .one(self.db)
                .await
                .context("Failed to reload talent")?
                .is_some();
            return Err(if still_exists {
                AppError::AlreadyVerified
            } else {
                AppError::not_found("Talenta")
            });
        }

        linfo!(
            "system",
            LogStage::Db,
            LogComponent::Verification,
            "talent_verified",
            "人才审核完成",
            talent_id = %id,
            verifier_id = %auth.user_id,
            status = %status
        );

        if let Err(err) = notify_talent_owner(self.db, owner.id, id, &outcome).await {
            lwarn!(
                "system",
                LogStage::Db,
                LogComponent::Notifications,
                "notify_failed",
                &format!("审核通知写入失败: {err}"),
                talent_id = %id
            );
        }

        self.find_talent(id).await
    }
}

fn certificate_for(talent_type: TalentType, url: Option<String>) -> Option<String> {
    if talent_type.accepts_certificate() {
        normalize_optional(url)
    } else {
        None
    }
}

fn required_reason(reason: Option<String>) -> Result<String> {
    normalize_optional(reason)
        .ok_or_else(|| AppError::field("rejection_reason", "Alasan penolakan wajib diisi"))
}

fn ensure_batch_ids(ids: &[Uuid]) -> Result<()> {
    if ids.is_empty() {
        Err(AppError::field("talent_ids", "Daftar talenta wajib diisi"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_never_keeps_certificate() {
        assert_eq!(
            certificate_for(
                TalentType::PesertaPelatihan,
                Some("http://files/x.pdf".to_string())
            ),
            None
        );
        assert_eq!(
            certificate_for(TalentType::MinatBakat, Some(" http://files/x.pdf ".to_string()))
                .as_deref(),
            Some("http://files/x.pdf")
        );
    }

    #[test]
    fn test_blank_reason_is_rejected() {
        let err = required_reason(Some("   ".to_string())).unwrap_err();
        assert_eq!(err.field_errors().unwrap()[0].field, "rejection_reason");
        assert_eq!(required_reason(Some(" buram ".to_string())).unwrap(), "buram");
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let err = ensure_batch_ids(&[]).unwrap_err();
        assert_eq!(err.field_errors().unwrap()[0].field, "talent_ids");
    }
}
