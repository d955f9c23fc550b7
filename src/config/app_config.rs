//! # 应用配置结构定义

use crate::error::ConfigError;
use crate::repository::Repository;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// 应用主配置结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 服务配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 令牌认证配置
    pub auth: AuthConfig,
    /// 上游仓库访问配置
    #[serde(default)]
    pub provider: ProviderConfig,
    /// 组织 → 仓库配置
    #[serde(default)]
    pub organizations: BTreeMap<String, OrganizationConfig>,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub bind_address: String,
    /// 监听端口
    pub port: u16,
    /// 单个响应体的最大字节数
    pub max_body_bytes: usize,
    /// 请求超时时间（秒）
    pub request_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            max_body_bytes: 64 * 1024 * 1024, // 64MB
            request_timeout: 30,
        }
    }
}

/// 令牌认证配置
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 签名密钥
    pub jwt_secret: String,
    /// 期望的签发者
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// 期望的受众
    #[serde(default = "default_audience")]
    pub audience: Vec<String>,
    /// 过期校验容差（秒）
    #[serde(default = "default_leeway")]
    pub leeway: u64,
}

fn default_issuer() -> String {
    "formula-server".to_string()
}

fn default_audience() -> Vec<String> {
    vec!["ritchie-cli".to_string()]
}

const fn default_leeway() -> u64 {
    30
}

impl AuthConfig {
    /// 使用默认签发者/受众创建认证配置
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            issuer: default_issuer(),
            audience: default_audience(),
            leeway: default_leeway(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"***")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway", &self.leeway)
            .finish()
    }
}

/// 上游仓库访问配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// 访问远端的超时时间（秒）
    pub timeout_seconds: u64,
    /// 访问远端时的 User-Agent
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: concat!("formula-server/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// 单个组织的仓库配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationConfig {
    /// 仓库列表
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

impl AppConfig {
    /// 仅包含认证配置的最小配置
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            server: ServerConfig::default(),
            auth,
            provider: ProviderConfig::default(),
            organizations: BTreeMap::new(),
        }
    }

    /// 添加组织及其仓库
    #[must_use]
    pub fn with_organization(
        mut self,
        organization: impl Into<String>,
        repositories: Vec<Repository>,
    ) -> Self {
        self.organizations
            .insert(organization.into(), OrganizationConfig { repositories });
        self
    }

    /// 获取组织的仓库列表，按优先级排序
    #[must_use]
    pub fn repositories(&self, organization: &str) -> Option<Vec<Repository>> {
        self.organizations.get(organization).map(|org| {
            let mut repos = org.repositories.clone();
            repos.sort_by_key(|repo| repo.priority);
            repos
        })
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".to_string()));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than 0".to_string(),
            ));
        }
        if self.server.request_timeout == 0 {
            return Err(ConfigError::Invalid(
                "server.request_timeout must be greater than 0".to_string(),
            ));
        }
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret cannot be empty".to_string()));
        }

        for (organization, org_config) in &self.organizations {
            let mut seen = HashSet::new();
            for repo in &org_config.repositories {
                if repo.name.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "organization '{organization}' has a repository without a name"
                    )));
                }
                if !seen.insert(repo.name.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "organization '{organization}' declares repository '{}' twice",
                        repo.name
                    )));
                }
                if let Err(e) = url::Url::parse(&repo.remote) {
                    return Err(ConfigError::Invalid(format!(
                        "repository '{}' of organization '{organization}' has an invalid remote '{}': {e}",
                        repo.name, repo.remote
                    )));
                }
            }
        }

        Ok(())
    }
}
