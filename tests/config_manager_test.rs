//! # 配置管理器集成测试
//!
//! 从 TOML 文件加载、校验，并通过文件监控热重载

use pretty_assertions::assert_eq;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

use formula_server::config::{ConfigManager, RepositoryConfigReader};
use formula_server::error::ServerError;

const CONFIG: &str = r#"
[server]
bind_address = "127.0.0.1"
port = 8088

[auth]
jwt_secret = "file-secret"
audience = ["ritchie-cli"]

[provider]
timeout_seconds = 5

[[organizations.zup.repositories]]
name = "team"
priority = 10
remote = "https://team.example.com"
token = "team-token"

[[organizations.zup.repositories]]
name = "commons"
remote = "https://commons.example.com"
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_load_from_file() {
    let file = write_config(CONFIG);
    let manager = ConfigManager::from_file(file.path()).await.unwrap();
    let config = manager.get_config().await;

    assert_eq!(config.server.port, 8088);
    assert_eq!(config.server.max_body_bytes, 64 * 1024 * 1024);
    assert_eq!(config.provider.timeout_seconds, 5);

    let repos = manager.read_repository_config("zup").await.unwrap().unwrap();
    let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["commons", "team"]);
    assert_eq!(repos[1].token.as_deref(), Some("team-token"));
    assert_eq!(repos[0].tree_path, "/tree/tree.json");
}

#[tokio::test]
async fn test_invalid_file_is_rejected() {
    let file = write_config(
        r#"
[auth]
jwt_secret = "secret"

[[organizations.zup.repositories]]
name = "commons"
remote = "https://commons.example.com"

[[organizations.zup.repositories]]
name = "commons"
remote = "https://mirror.example.com"
"#,
    );

    let err = ConfigManager::from_file(file.path()).await.err().unwrap();
    assert!(matches!(err, ServerError::Config { .. }));
}

#[tokio::test]
async fn test_missing_file_is_rejected() {
    assert!(ConfigManager::from_file("/nonexistent/formula.toml").await.is_err());
}

#[tokio::test]
async fn test_hot_reload_picks_up_new_repository() {
    let file = write_config(CONFIG);
    let manager = ConfigManager::from_file(file.path()).await.unwrap();
    let Some(mut events) = manager.subscribe_changes() else {
        // 平台不支持文件监控时跳过
        return;
    };

    std::fs::write(
        file.path(),
        format!(
            "{CONFIG}\n[[organizations.acme.repositories]]\nname = \"tools\"\nremote = \"https://tools.example.com\"\n"
        ),
    )
    .unwrap();

    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("config change event")
        .unwrap();

    let mut reloaded = None;
    for _ in 0..50 {
        if let Some(repos) = manager.read_repository_config("acme").await.unwrap() {
            reloaded = Some(repos);
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(reloaded.unwrap()[0].name, "tools");
}
