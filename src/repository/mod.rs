//! # 仓库模块
//!
//! 组织下的配方仓库记录及按名称查找

mod finder;
mod types;

pub use finder::find_repo;
pub use types::{DEFAULT_TREE_PATH, Repository};
