//! # Formula Server 主程序
//!
//! 读取配置，装配协作者并启动配方文件服务

use clap::Parser;
use formula_server::{
    Result,
    config::ConfigManager,
    lerror, linfo,
    logging::{self, LogComponent, LogStage},
    server::{AppState, FormulaServer},
};
use std::path::PathBuf;
use std::sync::Arc;

/// 配方文件授权服务
#[derive(Debug, Parser)]
#[command(name = "formula-server", version, about)]
struct Args {
    /// 配置文件路径，缺省时按环境变量与 `RUST_ENV` 解析
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别（被 `RUST_LOG` 覆盖）
    #[arg(short, long)]
    log_level: Option<String>,

    /// 打印日志配置说明后退出
    #[arg(long)]
    logging_help: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.logging_help {
        logging::print_logging_help();
        return Ok(());
    }

    logging::init_optimized_logging(args.log_level.as_ref());

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_starting",
        "服务启动"
    );

    if let Err(e) = run(args).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("服务启动失败: {e:?}")
        );
        std::process::exit(1);
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config_manager = match &args.config {
        Some(path) => ConfigManager::from_file(path).await?,
        None => ConfigManager::new().await?,
    };
    let config = config_manager.get_config().await;
    let config_manager = Arc::new(config_manager);

    let state = AppState::from_config(&config, config_manager)?;
    FormulaServer::new(&config.server, state)?.serve().await
}
