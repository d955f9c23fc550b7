//! # 统一错误处理
//!
//! 启动与配置链路返回 [`ServerError`]；请求链路使用各领域错误，
//! 由配方处理器统一折叠为 404/500。

pub use types::ServerError;

/// 应用统一的 `Result` 类型
pub type Result<T> = std::result::Result<T, ServerError>;

pub use auth::AuthError;
pub use config::ConfigError;
pub use provider::ProviderError;
pub use repository::RepositoryError;

pub mod auth;
pub mod config;
pub mod provider;
pub mod repository;
pub mod types;
