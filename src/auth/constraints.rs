//! # 授权策略接口
//!
//! 把调用方携带的 `Authorization` 头解析为其在组织内拥有的角色

use async_trait::async_trait;

use crate::error::AuthError;

/// 授权策略句柄
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Constraints: Send + Sync {
    /// 解析调用方在组织内的角色
    ///
    /// `authorization` 为原样的 `Authorization` 头值。
    async fn roles(&self, authorization: &str, organization: &str)
    -> Result<Vec<String>, AuthError>;
}
