//! # 配方树索引
//!
//! 仓库在 `tree_path` 下发布的命令树，每个叶子命令指向一个配方目录。

use serde::{Deserialize, Serialize};

/// 配方文件的公共路径前缀
pub const FORMULAS_PREFIX: &str = "/formulas/";

/// 命令树
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    #[serde(default)]
    pub commands: Vec<Command>,
}

/// 树中的一个命令节点
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub help: String,
    /// 分组节点没有配方
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<Formula>,
}

/// 配方描述
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    /// 相对 `/formulas/` 的目录
    pub path: String,
    #[serde(default)]
    pub bin: String,
    #[serde(default)]
    pub bundle: String,
    #[serde(default)]
    pub config: String,
    /// 允许访问的角色；为空表示公开
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Formula {
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.roles.is_empty()
    }

    /// 调用方角色与配方角色是否有交集
    #[must_use]
    pub fn allows(&self, caller_roles: &[String]) -> bool {
        self.is_public() || self.roles.iter().any(|role| caller_roles.contains(role))
    }
}

impl Tree {
    /// 查找覆盖 `file_path` 的配方
    ///
    /// `file_path` 相对 `/formulas/`。按路径段对齐取最长前缀。
    #[must_use]
    pub fn find_formula(&self, file_path: &str) -> Option<&Formula> {
        self.commands
            .iter()
            .filter_map(|command| command.formula.as_ref())
            .filter(|formula| covers(formula.path.trim_matches('/'), file_path))
            .max_by_key(|formula| formula.path.trim_matches('/').len())
    }
}

fn covers(formula_path: &str, file_path: &str) -> bool {
    if formula_path.is_empty() {
        return false;
    }
    file_path
        .strip_prefix(formula_path)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// 规范化请求路径，返回相对 `/formulas/` 的已解码文件路径
///
/// 先做百分号解码再校验：拒绝前缀不符、空路径、空段、`.`、`..` 以及含反斜杠的段。
/// 授权与远端拉取都必须使用返回值，不能再用原始路径。
#[must_use]
pub fn formula_file_path(request_path: &str) -> Option<String> {
    let relative = request_path.strip_prefix(FORMULAS_PREFIX)?;
    let decoded = urlencoding::decode(relative).ok()?;
    let decoded = decoded.strip_suffix('/').unwrap_or(&decoded);
    if decoded.is_empty()
        || decoded
            .split('/')
            .any(|segment| matches!(segment, "" | "." | "..") || segment.contains('\\'))
    {
        return None;
    }
    Some(decoded.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_tree;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_tree_decoding() {
        let tree = sample_tree();
        assert_eq!(tree.commands.len(), 3);
        assert!(tree.commands[0].formula.is_none());
        let bucket = tree.commands[2].formula.as_ref().unwrap();
        assert_eq!(bucket.bundle, "bundle.zip");
        assert_eq!(bucket.roles, vec!["admin", "ops"]);
    }

    #[rstest]
    #[case("aws/create/bucket/bundle.zip", Some("aws/create/bucket"))]
    #[case("aws/create/bucket", Some("aws/create/bucket"))]
    #[case("aws/create/config.json", Some("aws/create"))]
    #[case("aws/create/bucketx/config.json", Some("aws/create"))]
    #[case("aws/delete/config.json", None)]
    #[case("gcp/create/config.json", None)]
    fn test_find_formula(#[case] file_path: &str, #[case] expected: Option<&str>) {
        let tree = sample_tree();
        assert_eq!(
            tree.find_formula(file_path).map(|f| f.path.as_str()),
            expected
        );
    }

    #[test]
    fn test_formula_roles() {
        let tree = sample_tree();
        let public = tree.find_formula("aws/create/config.json").unwrap();
        let private = tree.find_formula("aws/create/bucket/bundle.zip").unwrap();

        assert!(public.allows(&[]));
        assert!(private.allows(&["ops".to_string()]));
        assert!(!private.allows(&["dev".to_string()]));
        assert!(!private.allows(&[]));
    }

    #[rstest]
    #[case("/formulas/aws/create/config.json", Some("aws/create/config.json"))]
    #[case("/formulas/aws/create/", Some("aws/create"))]
    #[case("/formulas/", None)]
    #[case("/tree/tree.json", None)]
    #[case("/formulas/aws/../secrets", None)]
    #[case("/formulas/aws/create/%2e%2e/bucket/bundle.zip", None)]
    #[case("/formulas/aws/create/%2E%2E/bucket/bundle.zip", None)]
    #[case("/formulas/aws/%2e%2e/%2e%2e/tree/tree.json", None)]
    #[case("/formulas/aws/create/.%2e/bucket", None)]
    #[case("/formulas/aws/create/%2e/config.json", None)]
    #[case("/formulas/aws/create%2F..%2Fbucket/bundle.zip", None)]
    #[case("/formulas/aws/create/%5C..%5Cbucket", None)]
    #[case("/formulas/aws//create/config.json", None)]
    #[case("/formulas/aws/create/./config.json", None)]
    #[case("/formulas/aws/create/%FF", None)]
    #[case("/formulas/aws/create/my%20file.json", Some("aws/create/my file.json"))]
    fn test_formula_file_path(#[case] request_path: &str, #[case] expected: Option<&str>) {
        assert_eq!(formula_file_path(request_path).as_deref(), expected);
    }
}
