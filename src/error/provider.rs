use thiserror::Error;

use super::auth::AuthError;

/// 从仓库远端授权与拉取配方文件时的错误
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Invalid formula path: {0}")]
    InvalidPath(String),

    #[error("Invalid repository remote '{remote}': {message}")]
    InvalidRemote { remote: String, message: String },

    #[error("No formula in repository '{repository}' matches path '{path}'")]
    FormulaNotFound { repository: String, path: String },

    #[error("Access to formula '{formula}' denied, requires one of {required:?}")]
    AccessDenied {
        formula: String,
        required: Vec<String>,
    },

    #[error("Upstream {url} responded with status {status}")]
    Upstream { url: String, status: u16 },

    #[error("Formula tree could not be decoded: {0}")]
    TreeDecode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authorization failed: {0}")]
    Auth(#[from] AuthError),
}
