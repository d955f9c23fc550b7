use thiserror::Error;

/// 在组织配置中查找仓库时的错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Repository not found: '{name}'")]
    NotFound { name: String },
}
