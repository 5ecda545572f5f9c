//! JWT token management
//!
//! Issues and validates HS256 access tokens

use entity::users;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
    errors::ErrorKind,
};

use crate::auth::types::JwtClaims;
use crate::config::AuthConfig;
use crate::error::{AppError, Result};
use crate::{
    ldebug,
    logging::{LogComponent, LogStage},
};

/// JWT token manager
pub struct JwtManager {
    /// Encoding key
    encoding_key: EncodingKey,
    /// Decoding key
    decoding_key: DecodingKey,
    /// Validation configuration
    validation: Validation,
    issuer: String,
    audience: String,
    /// Access token lifetime in seconds
    access_ttl: i64,
}

impl JwtManager {
    /// Create new JWT manager
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if config.jwt_secret.is_empty() {
            return Err(AppError::config("JWT secret cannot be empty"));
        }
        let access_ttl = i64::try_from(config.access_ttl_secs)
            .map_err(|e| AppError::config_with_source("access_ttl_secs is too large", e))?;

        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 30;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_ttl,
        })
    }

    /// Access token lifetime in seconds
    #[must_use]
    pub const fn access_ttl(&self) -> i64 {
        self.access_ttl
    }

    /// Generate access token
    pub fn generate_access_token(&self, user: &users::Model) -> Result<String> {
        self.encode_claims(&JwtClaims::for_user(
            user,
            self.access_ttl,
            &self.issuer,
            &self.audience,
        ))
    }

    fn encode_claims(&self, claims: &JwtClaims) -> Result<String> {
        let header = Header::new(Algorithm::HS256);
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AppError::internal_with_source("Token generation failed", e))
    }

    /// Validate and parse token
    ///
    /// Expiry maps to `TokenExpired`, every other failure to `InvalidToken`.
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        let token_data: TokenData<JwtClaims> = decode(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                ldebug!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::Jwt,
                    "token_rejected",
                    "JWT 校验失败",
                    reason = ?e.kind()
                );
                match e.kind() {
                    ErrorKind::ExpiredSignature => AppError::TokenExpired,
                    _ => AppError::InvalidToken,
                }
            })?;

        Ok(token_data.claims)
    }
}
