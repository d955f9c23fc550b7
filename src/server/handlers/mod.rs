//! # 请求处理器

pub mod formulas;
pub mod system;

pub use formulas::{FormulasHandler, ORG_HEADER, REPO_NAME_HEADER, formulas_handler};
