//! # 测试辅助函数

use std::sync::{Arc, Once};

use super::fixtures::TEST_JWT_SECRET;
use crate::auth::JwtConstraints;
use crate::config::AuthConfig;

static INIT: Once = Once::new();

/// 初始化测试环境
pub fn init_test_env() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 使用测试密钥的 JWT 授权策略
#[must_use]
pub fn test_constraints() -> JwtConstraints {
    JwtConstraints::new(Arc::new(AuthConfig::new(TEST_JWT_SECRET)))
}

/// 签发 `Authorization` 头值
#[must_use]
pub fn bearer_header(constraints: &JwtConstraints, organization: Option<&str>, roles: &[&str]) -> String {
    let roles = roles.iter().map(ToString::to_string).collect();
    match constraints.issue("tester", organization, roles, 3600) {
        Ok(token) => format!("Bearer {token}"),
        Err(e) => panic!("failed to issue test token: {e}"),
    }
}
