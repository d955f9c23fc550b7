//! # 配方文件处理器
//!
//! 按组织与仓库名解析仓库，再交由提供方授权并返回文件内容。
//! 配置缺失与仓库缺失对调用方一律为 404，提供方失败与写回失败一律为 500，
//! 失败时不返回正文。

use axum::Extension;
use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::auth::Constraints;
use crate::config::RepositoryConfigReader;
use crate::logging::{LogComponent, LogStage};
use crate::provider::{ProviderContext, ProviderFactory};
use crate::repository::find_repo;
use crate::server::middleware::RequestId;
use crate::server::response::{BufferedResponse, ResponseWriter, not_found};
use crate::server::app::AppState;
use crate::{ldebug, lerror, linfo};

/// 组织标识请求头
pub const ORG_HEADER: &str = "x-org";
/// 仓库名请求头
pub const REPO_NAME_HEADER: &str = "x-repo-name";

/// 配方文件处理器
pub struct FormulasHandler {
    config_reader: Arc<dyn RepositoryConfigReader>,
    constraints: Arc<dyn Constraints>,
    providers: Arc<dyn ProviderFactory>,
}

impl FormulasHandler {
    pub fn new(
        config_reader: Arc<dyn RepositoryConfigReader>,
        constraints: Arc<dyn Constraints>,
        providers: Arc<dyn ProviderFactory>,
    ) -> Self {
        Self {
            config_reader,
            constraints,
            providers,
        }
    }

    /// 处理一次请求，非 GET 一律 404
    pub async fn handle(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        writer: &mut dyn ResponseWriter,
        request_id: &str,
    ) {
        if *method != Method::GET {
            ldebug!(
                request_id,
                LogStage::RequestStart,
                LogComponent::FormulasHandler,
                "method_not_get",
                "Non-GET request answered as not found",
                method = %method,
                path = %path
            );
            if let Err(e) = not_found(writer) {
                lerror!(
                    request_id,
                    LogStage::ResponseFailure,
                    LogComponent::FormulasHandler,
                    "write_failed",
                    &format!("Failed to write not found response: {e}")
                );
            }
            return;
        }

        self.process_get(path, headers, writer, request_id).await;
    }

    async fn process_get(
        &self,
        path: &str,
        headers: &HeaderMap,
        writer: &mut dyn ResponseWriter,
        request_id: &str,
    ) {
        let organization = header_str(headers, ORG_HEADER);
        let repo_name = header_str(headers, REPO_NAME_HEADER);
        let authorization = header_str(headers, header::AUTHORIZATION.as_str());

        let repos = match self.config_reader.read_repository_config(organization).await {
            Ok(Some(repos)) if !repos.is_empty() => repos,
            Ok(_) => {
                lerror!(
                    request_id,
                    LogStage::RequestStart,
                    LogComponent::FormulasHandler,
                    "repo_config_empty",
                    "No repository configuration for organization",
                    organization = %organization
                );
                writer.write_header(StatusCode::NOT_FOUND);
                return;
            }
            Err(e) => {
                lerror!(
                    request_id,
                    LogStage::RequestStart,
                    LogComponent::FormulasHandler,
                    "repo_config_read_failed",
                    &format!("Failed to read repository configuration: {e}"),
                    organization = %organization
                );
                writer.write_header(StatusCode::NOT_FOUND);
                return;
            }
        };

        let repo = match find_repo(&repos, repo_name) {
            Ok(repo) => repo,
            Err(e) => {
                lerror!(
                    request_id,
                    LogStage::RequestStart,
                    LogComponent::Repository,
                    "repo_not_found",
                    &format!("{e}"),
                    organization = %organization,
                    repository = %repo_name
                );
                writer.write_header(StatusCode::NOT_FOUND);
                return;
            }
        };

        let context = ProviderContext::new(
            Arc::clone(&self.constraints),
            path,
            authorization,
            organization,
            repo,
        );
        let handler = self.providers.new_handler(context);

        let payload = match handler.files_formulas_allow().await {
            Ok(payload) => payload,
            Err(e) => {
                lerror!(
                    request_id,
                    LogStage::Authentication,
                    LogComponent::Provider,
                    "formula_not_allowed",
                    &format!("Formula request rejected: {e}"),
                    organization = %organization,
                    repository = %repo_name,
                    path = %path
                );
                writer.write_header(StatusCode::INTERNAL_SERVER_ERROR);
                return;
            }
        };

        writer.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        if let Err(e) = writer.write(&payload) {
            lerror!(
                request_id,
                LogStage::ResponseFailure,
                LogComponent::FormulasHandler,
                "write_failed",
                &format!("Failed to write formula payload: {e}"),
                organization = %organization,
                repository = %repo_name,
                bytes = payload.len()
            );
            writer.headers_mut().remove(header::CONTENT_TYPE);
            writer.write_header(StatusCode::INTERNAL_SERVER_ERROR);
            return;
        }

        linfo!(
            request_id,
            LogStage::Response,
            LogComponent::FormulasHandler,
            "formula_served",
            "Formula file served",
            organization = %organization,
            repository = %repo_name,
            path = %path,
            bytes = payload.len()
        );
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// axum 入口：`/formulas/{*path}`
pub async fn formulas_handler(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    request_id: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id.map_or_else(RequestId::new, |Extension(id)| id);
    let mut writer = BufferedResponse::new(state.max_body_bytes(), request_id.as_str());

    let handled = tokio::time::timeout(
        state.request_timeout(),
        state
            .formulas()
            .handle(&method, uri.path(), &headers, &mut writer, &request_id),
    )
    .await;

    if handled.is_err() {
        lerror!(
            request_id,
            LogStage::ResponseFailure,
            LogComponent::FormulasHandler,
            "request_timeout",
            "Request exceeded the configured timeout",
            path = %uri.path()
        );
        writer.write_header(StatusCode::INTERNAL_SERVER_ERROR);
    }

    writer.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockConstraints;
    use crate::config::{MockRepositoryConfigReader, ServerConfig};
    use crate::error::{ConfigError, ProviderError};
    use crate::provider::{MockProviderFactory, MockProviderHandler, ProviderHandler};
    use crate::repository::Repository;
    use crate::testing::RepositoryFixture;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io;

    const PATH: &str = "/formulas/aws/create/bucket/config.json";

    fn request_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ORG_HEADER, HeaderValue::from_static("zup"));
        headers.insert(REPO_NAME_HEADER, HeaderValue::from_static("commons"));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer caller-token"),
        );
        headers
    }

    fn repos() -> Vec<Repository> {
        vec![
            RepositoryFixture::new().build(),
            RepositoryFixture::new()
                .name("private")
                .remote("https://private.example.com")
                .priority(1)
                .token("remote-token")
                .build(),
        ]
    }

    fn reader_returning(
        result: fn() -> Result<Option<Vec<Repository>>, ConfigError>,
    ) -> MockRepositoryConfigReader {
        let mut reader = MockRepositoryConfigReader::new();
        reader
            .expect_read_repository_config()
            .times(1)
            .returning(move |_| result());
        reader
    }

    fn unused_factory() -> MockProviderFactory {
        let mut factory = MockProviderFactory::new();
        factory.expect_new_handler().never();
        factory
    }

    fn factory_returning(
        result: fn() -> Result<Bytes, ProviderError>,
    ) -> MockProviderFactory {
        let mut factory = MockProviderFactory::new();
        factory.expect_new_handler().times(1).returning(move |ctx| {
            assert_eq!(ctx.path, PATH);
            assert_eq!(ctx.bearer_token, "Bearer caller-token");
            assert_eq!(ctx.organization, "zup");
            assert_eq!(ctx.repository.name, "commons");
            let mut handler = MockProviderHandler::new();
            handler
                .expect_files_formulas_allow()
                .times(1)
                .returning(move || result());
            Box::new(handler)
        });
        factory
    }

    fn handler(
        reader: MockRepositoryConfigReader,
        factory: MockProviderFactory,
    ) -> FormulasHandler {
        FormulasHandler::new(
            Arc::new(reader),
            Arc::new(MockConstraints::new()),
            Arc::new(factory),
        )
    }

    async fn run(handler: &FormulasHandler, method: Method) -> BufferedResponse {
        let mut writer = BufferedResponse::new(1024, "test");
        handler
            .handle(&method, PATH, &request_headers(), &mut writer, "test")
            .await;
        writer
    }

    #[rstest]
    #[case(Method::POST)]
    #[case(Method::PUT)]
    #[case(Method::DELETE)]
    #[case(Method::HEAD)]
    #[tokio::test]
    async fn test_non_get_is_not_found_without_collaborators(#[case] method: Method) {
        let mut reader = MockRepositoryConfigReader::new();
        reader.expect_read_repository_config().never();

        let writer = run(&handler(reader, unused_factory()), method).await;

        assert_eq!(writer.status(), StatusCode::NOT_FOUND);
        assert_eq!(writer.body(), b"404 page not found\n");
    }

    #[tokio::test]
    async fn test_config_error_is_not_found() {
        let reader = reader_returning(|| Err(ConfigError::Load("disk gone".to_string())));
        let writer = run(&handler(reader, unused_factory()), Method::GET).await;

        assert_eq!(writer.status(), StatusCode::NOT_FOUND);
        assert!(writer.body().is_empty());
    }

    #[rstest]
    #[case::absent(|| Ok(None))]
    #[case::empty(|| Ok(Some(Vec::new())))]
    #[tokio::test]
    async fn test_missing_config_is_not_found(
        #[case] result: fn() -> Result<Option<Vec<Repository>>, ConfigError>,
    ) {
        let writer = run(&handler(reader_returning(result), unused_factory()), Method::GET).await;

        assert_eq!(writer.status(), StatusCode::NOT_FOUND);
        assert!(writer.body().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_repository_is_not_found() {
        let reader = reader_returning(|| {
            Ok(Some(vec![Repository::new("other", "https://other.example.com")]))
        });
        let writer = run(&handler(reader, unused_factory()), Method::GET).await;

        assert_eq!(writer.status(), StatusCode::NOT_FOUND);
        assert!(writer.body().is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_is_internal_error() {
        let reader = reader_returning(|| Ok(Some(repos())));
        let factory = factory_returning(|| {
            Err(ProviderError::AccessDenied {
                formula: "aws/create/bucket".to_string(),
                required: vec!["admin".to_string()],
            })
        });
        let writer = run(&handler(reader, factory), Method::GET).await;

        assert_eq!(writer.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(writer.body().is_empty());
    }

    #[tokio::test]
    async fn test_success_writes_provider_bytes_verbatim() {
        let reader = reader_returning(|| Ok(Some(repos())));
        let factory = factory_returning(|| Ok(Bytes::from_static(b"\x00\x01{\"bin\":\"main.sh\"}\xff")));
        let writer = run(&handler(reader, factory), Method::GET).await;

        assert_eq!(writer.status(), StatusCode::OK);
        assert_eq!(writer.body(), b"\x00\x01{\"bin\":\"main.sh\"}\xff");
        assert_eq!(
            writer.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
    }

    /// 写入总是失败，并记录状态设置
    #[derive(Default)]
    struct FailingWriter {
        headers: HeaderMap,
        statuses: Vec<StatusCode>,
        writes: usize,
    }

    impl ResponseWriter for FailingWriter {
        fn headers_mut(&mut self) -> &mut HeaderMap {
            &mut self.headers
        }

        fn write_header(&mut self, status: StatusCode) {
            self.statuses.push(status);
        }

        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
        }
    }

    #[tokio::test]
    async fn test_write_failure_attempts_internal_error() {
        let reader = reader_returning(|| Ok(Some(repos())));
        let factory = factory_returning(|| Ok(Bytes::from_static(b"payload")));
        let handler = handler(reader, factory);

        let mut writer = FailingWriter::default();
        handler
            .handle(&Method::GET, PATH, &request_headers(), &mut writer, "test")
            .await;

        assert_eq!(writer.writes, 1);
        assert_eq!(writer.statuses, vec![StatusCode::INTERNAL_SERVER_ERROR]);
        assert!(!writer.headers.contains_key(header::CONTENT_TYPE));
    }

    #[tokio::test]
    async fn test_oversized_payload_becomes_internal_error() {
        let reader = reader_returning(|| Ok(Some(repos())));
        let factory = factory_returning(|| Ok(Bytes::from(vec![b'x'; 2048])));
        let writer = run(&handler(reader, factory), Method::GET).await;

        assert_eq!(writer.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(writer.body().is_empty());
        assert!(!writer.headers().contains_key(header::CONTENT_TYPE));
    }

    /// 远端迟迟不返回的提供方
    struct StalledProvider;

    #[async_trait::async_trait]
    impl ProviderHandler for StalledProvider {
        async fn files_formulas_allow(&self) -> Result<Bytes, ProviderError> {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            Ok(Bytes::from_static(b"too late"))
        }
    }

    #[tokio::test]
    async fn test_request_timeout_is_internal_error() {
        let reader = reader_returning(|| Ok(Some(repos())));
        let mut factory = MockProviderFactory::new();
        factory
            .expect_new_handler()
            .times(1)
            .returning(|_| Box::new(StalledProvider));
        let server = ServerConfig {
            request_timeout: 1,
            ..ServerConfig::default()
        };
        let state = AppState::new(Arc::new(handler(reader, factory)), &server);

        let started = std::time::Instant::now();
        let response = formulas_handler(
            State(state),
            Method::GET,
            OriginalUri(PATH.parse().unwrap()),
            request_headers(),
            None,
        )
        .await;

        assert!(started.elapsed() < std::time::Duration::from_secs(10));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!response.headers().contains_key(header::CONTENT_TYPE));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }
}
