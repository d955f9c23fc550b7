//! # 配置文件监控模块
//!
//! 监听配置文件变更，解析后通过广播通道发布

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::{AppConfig, read_config_file};
use crate::error::ConfigError;
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lerror, linfo, lwarn};

/// 配置变更事件
#[derive(Debug, Clone)]
pub enum ConfigEvent {
    /// 配置文件已重新解析（尚未应用环境变量覆盖）
    Reloaded(Arc<AppConfig>),
    /// 配置重载失败
    ReloadFailed(String),
    /// 配置文件被删除
    FileDeleted,
}

/// 配置监控器
pub struct ConfigWatcher {
    /// 配置文件路径
    config_path: PathBuf,
    /// 事件发送器
    event_sender: broadcast::Sender<ConfigEvent>,
    /// 文件监控器
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    /// 创建新的配置监控器
    pub fn new(config_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref().to_path_buf();

        let (event_sender, _) = broadcast::channel(64);

        let sender_clone = event_sender.clone();
        let path_clone = config_path.clone();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => Self::handle_file_event(&event, &sender_clone, &path_clone),
                Err(e) => {
                    lerror!(
                        "system",
                        LogStage::Configuration,
                        LogComponent::Config,
                        "watch_error",
                        &format!("文件监控错误: {e}")
                    );
                }
            }
        })
        .map_err(|e| ConfigError::Load(format!("创建文件监控器失败: {e}")))?;

        // 监控配置文件所在目录，编辑器常以替换文件的方式保存
        let config_dir = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        watcher
            .watch(config_dir, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::Load(format!("启动文件监控失败: {e}")))?;

        linfo!(
            "system",
            LogStage::Configuration,
            LogComponent::Config,
            "watcher_started",
            &format!("配置文件监控器已启动: {}", config_path.display())
        );

        Ok(Self {
            config_path,
            event_sender,
            _watcher: watcher,
        })
    }

    /// 被监控的配置文件
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 订阅配置变更事件
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigEvent> {
        self.event_sender.subscribe()
    }

    /// 处理文件变更事件
    fn handle_file_event(
        event: &Event,
        sender: &broadcast::Sender<ConfigEvent>,
        config_path: &Path,
    ) {
        // 只处理我们关心的配置文件
        let is_our_file = event
            .paths
            .iter()
            .any(|path| path.file_name() == config_path.file_name());

        if !is_our_file {
            return;
        }

        match &event.kind {
            EventKind::Modify(_) | EventKind::Create(_) => {
                ldebug!(
                    "system",
                    LogStage::Configuration,
                    LogComponent::Config,
                    "file_changed",
                    &format!("检测到配置文件变更: {:?}", event.paths)
                );

                // 等待一小段时间，确保文件写入完成
                std::thread::sleep(std::time::Duration::from_millis(100));

                match read_config_file(config_path) {
                    Ok(new_config) => {
                        let _ = sender.send(ConfigEvent::Reloaded(Arc::new(new_config)));
                    }
                    Err(e) => {
                        let error_msg = format!("配置文件重载失败: {e}");
                        lwarn!(
                            "system",
                            LogStage::Configuration,
                            LogComponent::Config,
                            "reload_failed",
                            &error_msg
                        );
                        let _ = sender.send(ConfigEvent::ReloadFailed(error_msg));
                    }
                }
            }
            EventKind::Remove(_) => {
                lwarn!(
                    "system",
                    LogStage::Configuration,
                    LogComponent::Config,
                    "file_deleted",
                    &format!("配置文件被删除: {:?}", event.paths)
                );
                let _ = sender.send(ConfigEvent::FileDeleted);
            }
            _ => {}
        }
    }
}
