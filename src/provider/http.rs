//! # HTTP 仓库提供方
//!
//! 从仓库远端拉取配方树，按配方角色授权后返回请求的文件。

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::context::ProviderContext;
use super::traits::{ProviderFactory, ProviderHandler};
use super::tree::{FORMULAS_PREFIX, Tree, formula_file_path};
use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result, ServerError};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lwarn};

/// 共享连接池的提供方工厂
#[derive(Debug, Clone)]
pub struct HttpProviderFactory {
    client: Client,
}

impl HttpProviderFactory {
    /// 按提供方配置构建 HTTP 客户端
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ServerError::server_init_with_source("Failed to build HTTP client", e))?;
        Ok(Self { client })
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn new_handler(&self, context: ProviderContext) -> Box<dyn ProviderHandler> {
        Box::new(HttpProvider {
            client: self.client.clone(),
            context,
        })
    }
}

/// 单次请求的提供方处理器
#[derive(Debug)]
pub struct HttpProvider {
    client: Client,
    context: ProviderContext,
}

impl HttpProvider {
    /// 在 `remote` 自身的路径后逐段追加 `segments`
    ///
    /// 每段都会被重新编码，`/`、`%`、`.`、`..` 不会改变目标路径。
    fn remote_url<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> std::result::Result<Url, ProviderError> {
        let remote = &self.context.repository.remote;
        let invalid = |message: String| ProviderError::InvalidRemote {
            remote: remote.clone(),
            message,
        };
        let mut url = Url::parse(remote).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("remote cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> std::result::Result<Bytes, ProviderError> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.context.repository.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            lwarn!(
                "system",
                LogStage::UpstreamRequest,
                LogComponent::Provider,
                "upstream_status",
                "Repository remote returned a non-success status",
                url = %url,
                status = status.as_u16()
            );
            return Err(ProviderError::Upstream {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?)
    }

    async fn fetch_tree(&self) -> std::result::Result<Tree, ProviderError> {
        let tree_path = &self.context.repository.tree_path;
        let url = self.remote_url(tree_path.split('/').filter(|segment| !segment.is_empty()))?;
        let body = self.get(url).await?;
        serde_json::from_slice(&body).map_err(|e| ProviderError::TreeDecode(e.to_string()))
    }
}

#[async_trait]
impl ProviderHandler for HttpProvider {
    async fn files_formulas_allow(&self) -> std::result::Result<Bytes, ProviderError> {
        let ctx = &self.context;
        let file_path = formula_file_path(&ctx.path)
            .ok_or_else(|| ProviderError::InvalidPath(ctx.path.clone()))?;

        let tree = self.fetch_tree().await?;
        let formula =
            tree.find_formula(&file_path)
                .ok_or_else(|| ProviderError::FormulaNotFound {
                    repository: ctx.repository.name.clone(),
                    path: file_path.clone(),
                })?;

        if !formula.is_public() {
            let roles = ctx
                .constraints
                .roles(&ctx.bearer_token, &ctx.organization)
                .await?;
            if !formula.allows(&roles) {
                return Err(ProviderError::AccessDenied {
                    formula: formula.path.clone(),
                    required: formula.roles.clone(),
                });
            }
        }

        ldebug!(
            "system",
            LogStage::UpstreamRequest,
            LogComponent::Provider,
            "formula_allowed",
            "Fetching formula file",
            organization = %ctx.organization,
            repository = %ctx.repository.name,
            formula = %formula.path,
            file = %file_path
        );

        let url = self.remote_url(
            std::iter::once(FORMULAS_PREFIX.trim_matches('/')).chain(file_path.split('/')),
        )?;
        self.get(url).await
    }
}
