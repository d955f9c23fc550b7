//! # HTTP 服务
//!
//! axum 路由、配方处理器、响应写入器与中间件

pub mod app;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

pub use app::{AppState, FormulaServer, create_app};
pub use handlers::{FormulasHandler, ORG_HEADER, REPO_NAME_HEADER};
pub use response::{BufferedResponse, ResponseWriter};
