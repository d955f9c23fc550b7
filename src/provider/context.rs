//! # 提供方上下文

use std::fmt;
use std::sync::Arc;

use crate::auth::Constraints;
use crate::repository::Repository;

/// 构造提供方处理器所需的全部输入
#[derive(Clone)]
pub struct ProviderContext {
    /// 授权策略句柄
    pub constraints: Arc<dyn Constraints>,
    /// 请求路径，即授权主体
    pub path: String,
    /// 原样的 `Authorization` 头值
    pub bearer_token: String,
    /// 组织标识
    pub organization: String,
    /// 已解析的仓库
    pub repository: Repository,
}

impl ProviderContext {
    pub fn new(
        constraints: Arc<dyn Constraints>,
        path: impl Into<String>,
        bearer_token: impl Into<String>,
        organization: impl Into<String>,
        repository: Repository,
    ) -> Self {
        Self {
            constraints,
            path: path.into(),
            bearer_token: bearer_token.into(),
            organization: organization.into(),
            repository,
        }
    }
}

impl fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderContext")
            .field("path", &self.path)
            .field("bearer_token", &"***")
            .field("organization", &self.organization)
            .field("repository", &self.repository)
            .finish_non_exhaustive()
    }
}
