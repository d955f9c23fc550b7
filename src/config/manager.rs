//! # 配置管理器
//!
//! 统一的配置管理接口，支持热重载和环境变量覆盖

use async_trait::async_trait;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

use super::{AppConfig, ConfigEvent, ConfigWatcher, RepositoryConfigReader, read_config_file};
use crate::error::{ConfigError, Result, ServerError};
use crate::logging::{LogComponent, LogStage};
use crate::repository::Repository;
use crate::{ldebug, linfo, lwarn};

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "FORMULA_SERVER_CONFIG_PATH";
/// 关闭热重载的环境变量
pub const DISABLE_WATCH_ENV: &str = "FORMULA_DISABLE_CONFIG_WATCH";
/// 环境变量覆盖前缀
const OVERRIDE_PREFIX: &str = "FORMULA_";

/// 配置管理器
pub struct ConfigManager {
    /// 配置监控器
    watcher: Option<ConfigWatcher>,
    /// 当前配置
    config: Arc<RwLock<AppConfig>>,
    /// 配置文件路径（内存配置时为空）
    config_path: Option<PathBuf>,
    /// 环境变量覆盖映射
    env_overrides: HashMap<String, String>,
}

impl ConfigManager {
    /// 创建配置管理器
    pub async fn new() -> Result<Self> {
        // 优先使用环境变量指定的配置文件路径
        let config_file = if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            path
        } else {
            let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
            format!("config/config.{env}.toml")
        };

        Self::from_file(&config_file).await
    }

    /// 从指定文件创建配置管理器
    pub async fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref().to_path_buf();

        let env_overrides = Self::build_env_overrides(env::vars());

        let mut config = read_config_file(&config_path)?;
        Self::apply_env_overrides(&mut config, &env_overrides)?;
        config.validate()?;

        let config = Arc::new(RwLock::new(config));

        // 创建文件监控器（如果启用）
        let watcher = if env::var(DISABLE_WATCH_ENV).unwrap_or_default() == "true" {
            None
        } else {
            match ConfigWatcher::new(&config_path) {
                Ok(watcher) => {
                    Self::spawn_reload_listener(
                        watcher.subscribe(),
                        Arc::clone(&config),
                        env_overrides.clone(),
                    );
                    Some(watcher)
                }
                Err(e) => {
                    lwarn!(
                        "system",
                        LogStage::Configuration,
                        LogComponent::Config,
                        "watcher_unavailable",
                        &format!("无法启动配置文件监控: {e}, 将禁用热重载功能")
                    );
                    None
                }
            }
        };

        linfo!(
            "system",
            LogStage::Configuration,
            LogComponent::Config,
            "config_loaded",
            "配置管理器初始化完成",
            path = %config_path.display(),
            hot_reload = watcher.is_some(),
            env_overrides = env_overrides.len()
        );

        Ok(Self {
            watcher,
            config,
            config_path: Some(config_path),
            env_overrides,
        })
    }

    /// 直接使用内存中的配置创建管理器（不监控文件）
    pub fn from_config(config: AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            watcher: None,
            config: Arc::new(RwLock::new(config)),
            config_path: None,
            env_overrides: HashMap::new(),
        })
    }

    /// 获取当前配置
    pub async fn get_config(&self) -> AppConfig {
        (*self.config.read().await).clone()
    }

    /// 订阅配置变更事件
    pub fn subscribe_changes(&self) -> Option<broadcast::Receiver<ConfigEvent>> {
        self.watcher.as_ref().map(ConfigWatcher::subscribe)
    }

    /// 手动重载配置
    pub async fn reload(&self) -> Result<()> {
        let Some(path) = &self.config_path else {
            return Err(ServerError::config("内存配置不支持从文件重载"));
        };

        let mut new_config = read_config_file(path)?;
        Self::apply_env_overrides(&mut new_config, &self.env_overrides)?;
        new_config.validate()?;

        *self.config.write().await = new_config;
        linfo!(
            "system",
            LogStage::Configuration,
            LogComponent::Config,
            "manual_reload",
            "手动重载配置成功"
        );
        Ok(())
    }

    /// 监听文件变更事件并替换当前配置
    fn spawn_reload_listener(
        mut events: broadcast::Receiver<ConfigEvent>,
        config: Arc<RwLock<AppConfig>>,
        env_overrides: HashMap<String, String>,
    ) {
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    ConfigEvent::Reloaded(new_config) => {
                        let mut final_config = (*new_config).clone();
                        let applied = Self::apply_env_overrides(&mut final_config, &env_overrides)
                            .and_then(|()| final_config.validate().map_err(ServerError::from));
                        match applied {
                            Ok(()) => {
                                *config.write().await = final_config;
                                linfo!(
                                    "system",
                                    LogStage::Configuration,
                                    LogComponent::Config,
                                    "hot_reload",
                                    "配置热重载并应用环境变量覆盖完成"
                                );
                            }
                            Err(e) => {
                                lwarn!(
                                    "system",
                                    LogStage::Configuration,
                                    LogComponent::Config,
                                    "hot_reload_rejected",
                                    &format!("新配置无效，保留当前配置: {e}")
                                );
                            }
                        }
                    }
                    ConfigEvent::ReloadFailed(error) => {
                        lwarn!(
                            "system",
                            LogStage::Configuration,
                            LogComponent::Config,
                            "hot_reload_failed",
                            &format!("配置重载失败: {error}")
                        );
                    }
                    ConfigEvent::FileDeleted => {
                        lwarn!(
                            "system",
                            LogStage::Configuration,
                            LogComponent::Config,
                            "config_deleted",
                            "配置文件被删除，继续使用当前配置"
                        );
                    }
                }
            }
        });
    }

    /// 构建环境变量覆盖映射
    ///
    /// 例如: `FORMULA_SERVER_PORT` -> `server.port`
    fn build_env_overrides(
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> HashMap<String, String> {
        let mut overrides = HashMap::new();

        for (key, value) in vars {
            if key == CONFIG_PATH_ENV || key == DISABLE_WATCH_ENV {
                continue;
            }
            if let Some(config_key) = key.strip_prefix(OVERRIDE_PREFIX) {
                let config_path = config_key.to_lowercase().replace('_', ".");
                overrides.insert(config_path, value);
            }
        }

        overrides
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (path, value) in overrides {
            ldebug!(
                "system",
                LogStage::Configuration,
                LogComponent::Config,
                "env_override",
                &format!(
                    "应用环境变量覆盖: {} = {}",
                    path,
                    if path.contains("secret") || path.contains("token") {
                        "***"
                    } else {
                        value
                    }
                )
            );

            Self::apply_override_to_config(config, path, value)?;
        }
        Ok(())
    }

    /// 将环境变量覆盖应用到配置对象
    fn apply_override_to_config(config: &mut AppConfig, path: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();

        match parts.as_slice() {
            ["server", "bind", "address"] | ["server", "host"] => {
                config.server.bind_address = value.to_string();
            }
            ["server", "port"] => {
                config.server.port = parse_override(path, value)?;
            }
            ["server", "max", "body", "bytes"] => {
                config.server.max_body_bytes = parse_override(path, value)?;
            }
            ["server", "request", "timeout"] => {
                config.server.request_timeout = parse_override(path, value)?;
            }
            ["auth", "jwt", "secret"] => config.auth.jwt_secret = value.to_string(),
            ["auth", "issuer"] => config.auth.issuer = value.to_string(),
            ["auth", "audience"] => {
                config.auth.audience = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect();
            }
            ["auth", "leeway"] => config.auth.leeway = parse_override(path, value)?,
            ["provider", "timeout", "seconds"] => {
                config.provider.timeout_seconds = parse_override(path, value)?;
            }
            ["provider", "user", "agent"] => config.provider.user_agent = value.to_string(),
            _ => {
                lwarn!(
                    "system",
                    LogStage::Configuration,
                    LogComponent::Config,
                    "unknown_override",
                    &format!("未知的配置路径，忽略环境变量覆盖: {path}")
                );
            }
        }

        Ok(())
    }
}

fn parse_override<T>(path: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(|e| {
        ServerError::config_with_source(format!("无效的环境变量覆盖 {path}: {value}"), e)
    })
}

#[async_trait]
impl RepositoryConfigReader for ConfigManager {
    async fn read_repository_config(
        &self,
        organization: &str,
    ) -> std::result::Result<Option<Vec<Repository>>, ConfigError> {
        if organization.is_empty() {
            return Err(ConfigError::MissingOrganization);
        }
        Ok(self.config.read().await.repositories(organization))
    }
}
