//! # 测试数据 Fixtures
//!
//! 提供测试用的配置、仓库与配方树

use serde_json::json;

use crate::config::{AppConfig, AuthConfig};
use crate::provider::Tree;
use crate::repository::Repository;

/// 测试用签名密钥
pub const TEST_JWT_SECRET: &str = "formula-test-secret";
/// 测试组织
pub const TEST_ORG: &str = "zup";

/// 仓库测试数据构建器
pub struct RepositoryFixture {
    name: String,
    remote: String,
    priority: u32,
    token: Option<String>,
}

impl Default for RepositoryFixture {
    fn default() -> Self {
        Self {
            name: "commons".to_string(),
            remote: "https://commons.example.com".to_string(),
            priority: 0,
            token: None,
        }
    }
}

impl RepositoryFixture {
    /// 创建新的仓库 fixture
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    #[must_use]
    pub fn remote(mut self, remote: &str) -> Self {
        self.remote = remote.to_string();
        self
    }

    #[must_use]
    pub const fn priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// 构建仓库记录
    #[must_use]
    pub fn build(self) -> Repository {
        let repo = Repository::new(self.name, self.remote).with_priority(self.priority);
        match self.token {
            Some(token) => repo.with_token(token),
            None => repo,
        }
    }
}

/// 带一个测试组织的完整配置
#[must_use]
pub fn test_app_config(repositories: Vec<Repository>) -> AppConfig {
    AppConfig::new(AuthConfig::new(TEST_JWT_SECRET)).with_organization(TEST_ORG, repositories)
}

/// 示例配方树：`aws/create` 公开，`aws/create/bucket` 需要 `admin` 或 `ops`
#[must_use]
pub fn sample_tree_json() -> serde_json::Value {
    json!({
        "commands": [
            {"id": "root_aws", "parent": "root", "usage": "aws", "help": "Amazon Web Services"},
            {
                "id": "root_aws_create",
                "parent": "root_aws",
                "usage": "create",
                "help": "Create resources",
                "formula": {"path": "aws/create", "bin": "main.sh", "roles": []}
            },
            {
                "id": "root_aws_create_bucket",
                "parent": "root_aws_create",
                "usage": "bucket",
                "help": "Create a bucket",
                "formula": {
                    "path": "aws/create/bucket",
                    "bin": "main.sh",
                    "bundle": "bundle.zip",
                    "config": "config.json",
                    "roles": ["admin", "ops"]
                }
            }
        ]
    })
}

/// 解析后的示例配方树
#[must_use]
pub fn sample_tree() -> Tree {
    serde_json::from_value(sample_tree_json()).unwrap_or_default()
}
