//! # 测试框架模块
//!
//! 提供测试用的 fixtures 和测试辅助函数

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
