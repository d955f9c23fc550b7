//! # 路由配置

use axum::Router;
use axum::routing::{any, get};

use super::app::AppState;
use super::handlers::{formulas_handler, system};

/// 创建服务路由
///
/// 配方路由接受任意方法，由处理器把非 GET 请求回答为 404。
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/formulas/{*path}", any(formulas_handler))
        .route("/ping", get(system::ping_handler))
        .with_state(state)
}
