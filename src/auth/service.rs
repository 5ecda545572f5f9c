//! Authentication service
//!
//! Credential login, refresh-token rotation and session invalidation

use chrono::{Duration, Utc};
use entity::{refresh_tokens, users};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppContext;
use crate::auth::jwt::JwtManager;
use crate::auth::types::AuthContext;
use crate::auth::utils::AuthUtils;
use crate::config::AuthConfig;
use crate::error::{AppError, Context, Result};
use crate::{
    ldebug, linfo,
    logging::{LogComponent, LogStage},
};

/// Token pair structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token
    pub access_token: String,
    /// Opaque refresh token
    pub refresh_token: String,
    /// Token type
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Authentication service
pub struct AuthService<'a> {
    db: &'a DatabaseConnection,
    jwt: &'a JwtManager,
    config: &'a AuthConfig,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub fn new(context: &'a AppContext) -> Self {
        Self {
            db: context.database.as_ref(),
            jwt: context.jwt.as_ref(),
            config: &context.config.auth,
        }
    }

    /// Verify credentials and open a new session
    pub async fn login(&self, email: &str, password: &str) -> Result<(TokenPair, users::Model)> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(self.db)
            .await
            .context("Failed to load user by email")?
            .ok_or(AppError::InvalidCredentials)?;

        if !AuthUtils::verify_password(password, &user.password_hash) {
            ldebug!(
                "system",
                LogStage::Authentication,
                LogComponent::Auth,
                "login_rejected",
                "密码校验失败",
                user_id = %user.id
            );
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AppError::AccountDisabled);
        }

        let tokens = self.issue_tokens(&user).await?;

        linfo!(
            "system",
            LogStage::Authentication,
            LogComponent::Auth,
            "login_success",
            "用户登录成功",
            user_id = %user.id,
            role = %user.role
        );

        Ok((tokens, user))
    }

    /// Exchange a refresh token for a new pair; the old token is consumed
    pub async fn refresh(&self, raw_token: &str) -> Result<TokenPair> {
        let stored = self.find_refresh_token(raw_token).await?.ok_or(AppError::InvalidToken)?;

        if stored.expires_at <= Utc::now().naive_utc() {
            refresh_tokens::Entity::delete_by_id(stored.id)
                .exec(self.db)
                .await
                .context("Failed to delete expired refresh token")?;
            return Err(AppError::TokenExpired);
        }

        let user = users::Entity::find_by_id(stored.user_id)
            .one(self.db)
            .await
            .context("Failed to load refresh token owner")?;
        let Some(user) = user.filter(|user| user.is_active) else {
            return Err(AppError::AccountDisabled);
        };

        // 只有成功删除旧令牌的一方可以换取新令牌
        let deleted = refresh_tokens::Entity::delete_by_id(stored.id)
            .exec(self.db)
            .await
            .context("Failed to rotate refresh token")?;
        if deleted.rows_affected == 0 {
            return Err(AppError::InvalidToken);
        }

        self.issue_tokens(&user).await
    }

    /// Remove one session; unknown tokens are ignored
    pub async fn logout(&self, raw_token: &str) -> Result<()> {
        refresh_tokens::Entity::delete_many()
            .filter(refresh_tokens::Column::TokenHash.eq(AuthUtils::sha256_hash(raw_token)))
            .exec(self.db)
            .await
            .context("Failed to delete refresh token")?;
        Ok(())
    }

    /// Remove every session of the user, returning how many were terminated
    pub async fn logout_all(&self, user_id: Uuid) -> Result<u64> {
        let count = revoke_user_tokens(self.db, user_id).await?;
        linfo!(
            "system",
            LogStage::Authentication,
            LogComponent::Auth,
            "logout_all",
            "已注销全部会话",
            user_id = %user_id,
            sessions = count
        );
        Ok(count)
    }

    /// Validate an access token and build the request context
    pub fn authenticate(&self, access_token: &str) -> Result<AuthContext> {
        let claims = self.jwt.validate_token(access_token)?;
        AuthContext::try_from(claims)
    }

    async fn find_refresh_token(&self, raw_token: &str) -> Result<Option<refresh_tokens::Model>> {
        refresh_tokens::Entity::find()
            .filter(refresh_tokens::Column::TokenHash.eq(AuthUtils::sha256_hash(raw_token)))
            .one(self.db)
            .await
            .context("Failed to load refresh token")
    }

    async fn issue_tokens(&self, user: &users::Model) -> Result<TokenPair> {
        let access_token = self.jwt.generate_access_token(user)?;
        let refresh_token = AuthUtils::generate_refresh_token();
        let refresh_ttl = i64::try_from(self.config.refresh_ttl_secs).unwrap_or(i64::MAX);
        let now = Utc::now().naive_utc();

        refresh_tokens::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            token_hash: Set(AuthUtils::sha256_hash(&refresh_token)),
            expires_at: Set(now + Duration::seconds(refresh_ttl)),
            created_at: Set(now),
        }
        .insert(self.db)
        .await
        .context("Failed to store refresh token")?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.access_ttl(),
        })
    }
}

/// Delete all refresh tokens of a user
pub async fn revoke_user_tokens<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64> {
    let result = refresh_tokens::Entity::delete_many()
        .filter(refresh_tokens::Column::UserId.eq(user_id))
        .exec(db)
        .await
        .context("Failed to revoke refresh tokens")?;
    Ok(result.rows_affected)
}
