//! # 认证类型定义

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// 访问令牌载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaClaims {
    /// 用户标识
    pub sub: String,
    /// 令牌所属组织；为空时不限制组织
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    /// 角色列表
    #[serde(default)]
    pub roles: Vec<String>,
    /// 签发时间
    pub iat: i64,
    /// 过期时间
    pub exp: i64,
    /// 签发者
    pub iss: String,
    /// 受众
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// 令牌 ID
    pub jti: String,
}

impl FormulaClaims {
    /// 创建新的载荷
    pub fn new(
        subject: impl Into<String>,
        organization: Option<String>,
        roles: Vec<String>,
        issuer: impl Into<String>,
        audience: Option<String>,
        expires_in_seconds: i64,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: subject.into(),
            org: organization,
            roles,
            iat: now,
            exp: now + expires_in_seconds,
            iss: issuer.into(),
            aud: audience,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }
}
