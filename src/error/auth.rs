//! # 令牌认证错误

use thiserror::Error;

/// 令牌校验错误
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Bearer token was not provided")]
    TokenMissing,

    #[error("Authorization header is not a bearer token")]
    TokenMalformed,

    #[error("Bearer token has expired")]
    TokenExpired,

    #[error("Bearer token is invalid: {0}")]
    TokenInvalid(String),

    #[error("Token issued for organization '{actual}', request targets '{expected}'")]
    OrganizationMismatch { expected: String, actual: String },

    #[error("Token signing failed: {0}")]
    Signing(String),
}
