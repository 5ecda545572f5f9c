//! # SIPODI 主程序
//!
//! 加载配置、初始化数据库与对象存储，启动后台任务与 HTTP 服务。

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use sipodi::{
    AppError, Result,
    app::{AppContext, AppTasks},
    config, database, lerror, linfo,
    logging::{self, LogComponent, LogStage},
    management::ManagementServer,
    storage,
};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "sipodi", version, about = "GTK talent registry backend")]
struct Cli {
    /// 配置文件路径，缺省为 config/config.{RUST_ENV}.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别（被 RUST_LOG 覆盖）
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_optimized_logging(cli.log_level.as_ref());

    if let Err(e) = run(cli).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("服务启动失败: {e:#}")
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
}

async fn run(cli: Cli) -> Result<()> {
    let config = Arc::new(config::load_config(cli.config.as_deref())?);
    linfo!(
        "system",
        LogStage::Configuration,
        LogComponent::Config,
        "config_loaded",
        "配置加载完成",
        storage_backend = ?config.storage.backend
    );

    let db = database::init_database(&config.database).await?;
    database::run_migrations(&db).await?;
    database::check_database_status(&db).await?;
    database::ensure_default_admin(&db, config.bootstrap.as_ref(), config.auth.bcrypt_cost)
        .await?;

    let storage = storage::build_storage(&config.storage).await?;
    let context = Arc::new(AppContext::new(config, Arc::new(db), storage)?);

    let tasks = AppTasks::initialize(&context).await?;
    tasks.scheduler().start_all().await?;

    let server = ManagementServer::new(Arc::clone(&context));
    let served = server.serve(shutdown_signal()).await;

    tasks.scheduler().shutdown().await?;
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        lerror!(
            "system",
            LogStage::Shutdown,
            LogComponent::Main,
            "signal_error",
            &format!("监听退出信号失败: {}", AppError::from(e))
        );
        return;
    }
    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "shutdown_signal",
        "收到退出信号，开始关闭"
    );
}
