//! # 认证授权模块
//!
//! 授权策略句柄（`Constraints`）及其基于 JWT 的实现

pub mod constraints;
pub mod jwt;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub use constraints::MockConstraints;
pub use constraints::Constraints;
pub use jwt::JwtConstraints;
pub use types::FormulaClaims;
pub use utils::AuthUtils;
