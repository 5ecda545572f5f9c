//! # 日志配置模块
//!
//! 统一的结构化日志：每条日志都带有 `request_id`、阶段、组件与操作名，
//! 便于按请求或按组件过滤。

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志所处的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    Startup,
    Shutdown,
    Configuration,
    Authentication,
    Authorization,
    RequestStart,
    Response,
    Db,
    Storage,
    Scheduling,
    BackgroundTask,
    Internal,
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Configuration => "configuration",
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::RequestStart => "request_start",
            Self::Response => "response",
            Self::Db => "db",
            Self::Storage => "storage",
            Self::Scheduling => "scheduling",
            Self::BackgroundTask => "background_task",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    Main,
    ServerSetup,
    Config,
    Database,
    Auth,
    Jwt,
    Handler,
    Users,
    Schools,
    Talents,
    Verification,
    Notifications,
    Dashboard,
    Upload,
    Storage,
    TaskScheduler,
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Main => "main",
            Self::ServerSetup => "server_setup",
            Self::Config => "config",
            Self::Database => "database",
            Self::Auth => "auth",
            Self::Jwt => "jwt",
            Self::Handler => "handler",
            Self::Users => "users",
            Self::Schools => "schools",
            Self::Talents => "talents",
            Self::Verification => "verification",
            Self::Notifications => "notifications",
            Self::Dashboard => "dashboard",
            Self::Upload => "upload",
            Self::Storage => "storage",
            Self::TaskScheduler => "task_scheduler",
        };
        f.write_str(name)
    }
}

/// 内部实现：按级别输出带统一字段的日志
#[doc(hidden)]
#[macro_export]
macro_rules! __log_event {
    ($level:ident, $rid:expr, $stage:expr, $comp:expr, $op:expr, $msg:expr $(, $($field:tt)+)?) => {
        ::tracing::$level!(
            request_id = %$rid,
            stage = %$stage,
            component = %$comp,
            operation = $op,
            $($($field)+ ,)?
            "{}",
            $msg
        )
    };
}

/// 信息级结构化日志
///
/// ```ignore
/// linfo!("system", LogStage::Startup, LogComponent::Main, "service_starting", "服务启动");
/// ```
#[macro_export]
macro_rules! linfo {
    ($($arg:tt)+) => { $crate::__log_event!(info, $($arg)+) };
}

#[macro_export]
macro_rules! lwarn {
    ($($arg:tt)+) => { $crate::__log_event!(warn, $($arg)+) };
}

#[macro_export]
macro_rules! lerror {
    ($($arg:tt)+) => { $crate::__log_event!(error, $($arg)+) };
}

#[macro_export]
macro_rules! ldebug {
    ($($arg:tt)+) => { $crate::__log_event!(debug, $($arg)+) };
}

/// 默认过滤规则：关闭数据库查询明细
fn default_filter(level: &str) -> String {
    format!("{level},sipodi=debug,sqlx::query=off,sea_orm::query=warn,sqlx=warn")
}

/// 初始化优化的日志系统
///
/// `RUST_LOG` 优先于命令行传入的级别。重复初始化（如测试中）会被忽略。
pub fn init_optimized_logging(log_level: Option<&String>) {
    let level = log_level.map_or("info", String::as_str);
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(level));

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_and_component_names() {
        assert_eq!(LogStage::BackgroundTask.to_string(), "background_task");
        assert_eq!(LogComponent::TaskScheduler.to_string(), "task_scheduler");
    }

    #[test]
    fn test_default_filter_silences_queries() {
        let filter = default_filter("warn");
        assert!(filter.starts_with("warn,"));
        assert!(filter.contains("sqlx::query=off"));
    }

    #[test]
    fn test_macros_accept_extra_fields() {
        init_optimized_logging(None);
        let user_id = uuid::Uuid::nil();
        crate::linfo!("test", LogStage::Internal, LogComponent::Main, "plain", "无附加字段");
        crate::lwarn!(
            "test",
            LogStage::Internal,
            LogComponent::Main,
            "with_fields",
            &format!("附加字段: {user_id}"),
            user_id = %user_id,
            count = 3
        );
    }
}
