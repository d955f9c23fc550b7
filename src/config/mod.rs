//! # 配置管理模块
//!
//! 处理应用配置加载、验证、热重载，以及按组织读取仓库配置

mod app_config;
mod manager;
mod reader;
mod watcher;

pub use app_config::{AppConfig, AuthConfig, OrganizationConfig, ProviderConfig, ServerConfig};
pub use manager::{CONFIG_PATH_ENV, ConfigManager, DISABLE_WATCH_ENV};
#[cfg(any(test, feature = "testing"))]
pub use reader::MockRepositoryConfigReader;
pub use reader::RepositoryConfigReader;
pub use watcher::{ConfigEvent, ConfigWatcher};

use crate::error::ConfigError;
use std::path::Path;

/// 读取并解析配置文件（不做校验）
pub(crate) fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Load(format!(
            "配置文件不存在: {}",
            path.display()
        )));
    }

    let config_content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Load(format!("读取配置文件失败: {}: {e}", path.display()))
    })?;

    Ok(toml::from_str(&config_content)?)
}
