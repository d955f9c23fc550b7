use async_trait::async_trait;
use bytes::Bytes;

use super::context::ProviderContext;
use crate::error::ProviderError;

/// 针对单次请求的授权与取文件处理器
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ProviderHandler: Send + Sync {
    /// 判断调用方能否读取请求的配方文件，允许时返回文件内容
    async fn files_formulas_allow(&self) -> Result<Bytes, ProviderError>;
}

/// 由请求上下文构造处理器
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ProviderFactory: Send + Sync {
    fn new_handler(&self, context: ProviderContext) -> Box<dyn ProviderHandler>;
}
