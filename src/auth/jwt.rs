//! # JWT 令牌校验
//!
//! HS256 令牌，携带调用方所属组织与角色。

use async_trait::async_trait;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use std::fmt;
use std::sync::Arc;

use super::{AuthUtils, Constraints, FormulaClaims};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::ldebug;
use crate::logging::{LogComponent, LogStage};

/// 基于 JWT 的授权策略
pub struct JwtConstraints {
    /// 签名密钥
    encoding_key: EncodingKey,
    /// 验签密钥
    decoding_key: DecodingKey,
    /// 校验规则
    validation: Validation,
    /// 认证配置
    config: Arc<AuthConfig>,
}

impl JwtConstraints {
    /// 按认证配置创建授权策略
    #[must_use]
    pub fn new(config: Arc<AuthConfig>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        if config.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(config.audience.as_slice());
        }
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = config.leeway;

        Self {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// 签发令牌
    pub fn issue(
        &self,
        subject: &str,
        organization: Option<&str>,
        roles: Vec<String>,
        expires_in_seconds: i64,
    ) -> Result<String, AuthError> {
        let claims = FormulaClaims::new(
            subject,
            organization.map(ToString::to_string),
            roles,
            self.config.issuer.clone(),
            self.config.audience.first().cloned(),
            expires_in_seconds,
        );

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// 校验并解析令牌
    pub fn validate_token(&self, token: &str) -> Result<FormulaClaims, AuthError> {
        let token_data: TokenData<FormulaClaims> =
            decode(token, &self.decoding_key, &self.validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            })?;

        Ok(token_data.claims)
    }
}

impl fmt::Debug for JwtConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConstraints")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Constraints for JwtConstraints {
    async fn roles(
        &self,
        authorization: &str,
        organization: &str,
    ) -> Result<Vec<String>, AuthError> {
        if authorization.trim().is_empty() {
            return Err(AuthError::TokenMissing);
        }
        let token = AuthUtils::extract_bearer_token(authorization).ok_or(AuthError::TokenMalformed)?;
        let claims = self.validate_token(&token)?;

        if let Some(token_org) = &claims.org {
            if token_org != organization {
                return Err(AuthError::OrganizationMismatch {
                    expected: organization.to_string(),
                    actual: token_org.clone(),
                });
            }
        }

        ldebug!(
            "system",
            LogStage::Authentication,
            LogComponent::Auth,
            "token_validated",
            "bearer token accepted",
            subject = %claims.sub,
            organization = %organization,
            roles = ?claims.roles
        );

        Ok(claims.roles)
    }
}
