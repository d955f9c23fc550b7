use super::Repository;
use crate::error::RepositoryError;

/// 在组织的仓库集合中按名称查找仓库
///
/// 名称精确匹配（区分大小写），多个同名记录时取第一个。
pub fn find_repo(repos: &[Repository], name: &str) -> Result<Repository, RepositoryError> {
    if name.is_empty() {
        return Err(RepositoryError::NotFound {
            name: String::new(),
        });
    }

    repos
        .iter()
        .find(|repo| repo.name == name)
        .cloned()
        .ok_or_else(|| RepositoryError::NotFound {
            name: name.to_string(),
        })
}
