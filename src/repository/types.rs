//! # 仓库记录定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 默认的配方树索引路径
pub const DEFAULT_TREE_PATH: &str = "/tree/tree.json";

fn default_tree_path() -> String {
    DEFAULT_TREE_PATH.to_string()
}

/// 组织配置中的一个配方仓库
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// 仓库名称，与 `x-repo-name` 请求头比对
    pub name: String,
    /// 优先级，数值越小越靠前
    #[serde(default)]
    pub priority: u32,
    /// 配方文件所在的远端基础 URL
    pub remote: String,
    /// 配方树索引相对 `remote` 的路径
    #[serde(default = "default_tree_path")]
    pub tree_path: String,
    /// 访问私有远端时携带的令牌
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Repository {
    /// 创建一个公开仓库记录
    pub fn new(name: impl Into<String>, remote: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            remote: remote.into(),
            tree_path: default_tree_path(),
            token: None,
        }
    }

    /// 设置优先级
    #[must_use]
    pub const fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// 设置远端访问令牌
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

// 令牌不进入日志
impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("remote", &self.remote)
            .field("tree_path", &self.tree_path)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_toml() {
        let repo: Repository = toml::from_str(
            r#"
name = "commons"
remote = "https://commons.example.com"
"#,
        )
        .unwrap();

        assert_eq!(repo.priority, 0);
        assert_eq!(repo.tree_path, DEFAULT_TREE_PATH);
        assert!(repo.token.is_none());
    }

    #[test]
    fn test_debug_masks_token() {
        let repo = Repository::new("private", "https://private.example.com").with_token("s3cr3t");
        let rendered = format!("{repo:?}");
        assert!(rendered.contains("***"));
        assert!(!rendered.contains("s3cr3t"));
    }
}
