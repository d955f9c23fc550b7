//! # Formula Server Library
//!
//! 按组织与仓库授权访问配方文件的 HTTP 服务核心库

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod repository;
pub mod server;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Result, ServerError};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
