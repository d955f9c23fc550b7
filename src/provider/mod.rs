//! # 仓库提供方模块
//!
//! - `context`：构造处理器所需的请求上下文
//! - `traits`：处理器与工厂接口
//! - `tree`：仓库发布的配方树及前缀匹配
//! - `http`：基于 reqwest 的远端实现

mod context;
mod http;
mod traits;
pub mod tree;

pub use context::ProviderContext;
pub use http::{HttpProvider, HttpProviderFactory};
#[cfg(any(test, feature = "testing"))]
pub use traits::{MockProviderFactory, MockProviderHandler};
pub use traits::{ProviderFactory, ProviderHandler};
pub use tree::{Command, Formula, Tree};
