//! # 仓库配置读取接口

use async_trait::async_trait;

use crate::error::ConfigError;
use crate::repository::Repository;

/// 按组织读取仓库配置
///
/// 未知组织返回 `Ok(None)`；读取本身失败时返回错误。
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RepositoryConfigReader: Send + Sync {
    /// 读取组织的仓库集合
    async fn read_repository_config(
        &self,
        organization: &str,
    ) -> Result<Option<Vec<Repository>>, ConfigError>;
}
