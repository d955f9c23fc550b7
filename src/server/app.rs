//! # 配方服务器
//!
//! 装配应用状态、路由与中间件，并负责监听与优雅关闭。

use axum::Router;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::FormulasHandler;
use super::middleware::request_id_middleware;
use crate::auth::JwtConstraints;
use crate::config::{AppConfig, RepositoryConfigReader, ServerConfig};
use crate::error::{Result, ServerError};
use crate::logging::{LogComponent, LogStage};
use crate::provider::HttpProviderFactory;
use crate::linfo;

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    formulas: Arc<FormulasHandler>,
    max_body_bytes: usize,
    request_timeout: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(formulas: Arc<FormulasHandler>, server: &ServerConfig) -> Self {
        Self {
            formulas,
            max_body_bytes: server.max_body_bytes,
            request_timeout: Duration::from_secs(server.request_timeout),
        }
    }

    /// 以生产协作者装配状态：配置读取器、JWT 授权策略与 HTTP 提供方
    pub fn from_config(
        config: &AppConfig,
        config_reader: Arc<dyn RepositoryConfigReader>,
    ) -> Result<Self> {
        let constraints = Arc::new(JwtConstraints::new(Arc::new(config.auth.clone())));
        let providers = Arc::new(HttpProviderFactory::new(&config.provider)?);
        let formulas = Arc::new(FormulasHandler::new(config_reader, constraints, providers));
        Ok(Self::new(formulas, &config.server))
    }

    #[must_use]
    pub fn formulas(&self) -> &FormulasHandler {
        &self.formulas
    }

    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

/// 创建带中间件的完整路由
pub fn create_app(state: AppState) -> Router {
    super::routes::create_routes(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(axum::middleware::from_fn(request_id_middleware)),
    )
}

/// 配方服务器
pub struct FormulaServer {
    addr: SocketAddr,
    router: Router,
}

impl FormulaServer {
    /// 创建新的服务器
    pub fn new(config: &ServerConfig, state: AppState) -> Result<Self> {
        let ip = config.bind_address.parse::<IpAddr>().map_err(|e| {
            ServerError::config_with_source(
                format!("Invalid bind address '{}'", config.bind_address),
                e,
            )
        })?;

        Ok(Self {
            addr: SocketAddr::new(ip, config.port),
            router: create_app(state),
        })
    }

    /// 获取绑定地址
    #[must_use]
    pub const fn bind_address(&self) -> SocketAddr {
        self.addr
    }

    /// 启动服务器，收到 Ctrl-C 后优雅关闭
    pub async fn serve(self) -> Result<()> {
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            &format!("Starting formula server on {}", self.addr)
        );

        let listener = TcpListener::bind(&self.addr).await.map_err(|e| {
            ServerError::server_start_with_source(format!("Failed to bind {}", self.addr), e)
        })?;

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::network_with_source("Formula server error", e))?;

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "server_stopped",
            "Formula server stopped"
        );
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "shutdown_signal",
            "Received Ctrl-C, shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockRepositoryConfigReader;
    use crate::testing::test_app_config;

    #[test]
    fn test_server_bind_address() {
        let mut server = ServerConfig::default();
        server.bind_address = "127.0.0.1".to_string();
        server.port = 8088;
        let config = test_app_config(Vec::new());
        let state =
            AppState::from_config(&config, Arc::new(MockRepositoryConfigReader::new())).unwrap();

        let formula_server = FormulaServer::new(&server, state).unwrap();
        assert_eq!(
            formula_server.bind_address(),
            "127.0.0.1:8088".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_invalid_bind_address() {
        let mut server = ServerConfig::default();
        server.bind_address = "not-an-ip".to_string();
        let config = test_app_config(Vec::new());
        let state =
            AppState::from_config(&config, Arc::new(MockRepositoryConfigReader::new())).unwrap();

        assert!(FormulaServer::new(&server, state).is_err());
    }
}
