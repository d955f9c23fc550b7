//! # 认证工具函数

/// 认证相关工具
pub struct AuthUtils;

impl AuthUtils {
    /// 从 `Authorization` 头中提取 Bearer Token
    ///
    /// 认证方案不区分大小写；方案不符或令牌为空时返回 `None`。
    #[must_use]
    pub fn extract_bearer_token(auth_header: &str) -> Option<String> {
        let (scheme, token) = auth_header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }
}
