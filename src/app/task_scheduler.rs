//! # 后台任务调度器
//!
//! 统一的任务注册、启动与停止，任务生命周期与进程绑定。

use crate::app::tasks::TaskType;
use crate::error::Result;
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lerror, linfo, lwarn};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::RwLock;

type TaskFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type TaskAction = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

/// 调度任务定义
#[derive(Clone)]
pub struct ScheduledTask {
    task_type: TaskType,
    start: TaskAction,
    stop: Option<TaskAction>,
}

impl ScheduledTask {
    /// 创建任务构建器，启动逻辑必填
    #[must_use]
    pub fn builder<F, Fut>(task_type: TaskType, start: F) -> ScheduledTaskBuilder
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        ScheduledTaskBuilder {
            task_type,
            start: Arc::new(move || Box::pin(start())),
            stop: None,
        }
    }

    #[must_use]
    pub const fn task_type(&self) -> TaskType {
        self.task_type
    }

    async fn start(&self) -> Result<()> {
        linfo!(
            "system",
            LogStage::BackgroundTask,
            LogComponent::TaskScheduler,
            "task_start",
            "启动后台任务",
            task = %self.task_type
        );
        (self.start)().await
    }

    async fn stop(&self) -> Result<()> {
        if let Some(action) = &self.stop {
            linfo!(
                "system",
                LogStage::Shutdown,
                LogComponent::TaskScheduler,
                "task_stop",
                "停止后台任务",
                task = %self.task_type
            );
            action().await
        } else {
            lwarn!(
                "system",
                LogStage::Shutdown,
                LogComponent::TaskScheduler,
                "task_stop_skipped",
                "后台任务未注册停止逻辑",
                task = %self.task_type
            );
            Ok(())
        }
    }
}

/// 任务构建器
pub struct ScheduledTaskBuilder {
    task_type: TaskType,
    start: TaskAction,
    stop: Option<TaskAction>,
}

impl ScheduledTaskBuilder {
    /// 注册停止逻辑
    #[must_use]
    pub fn on_stop<F, Fut>(mut self, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.stop = Some(Arc::new(move || Box::pin(action())));
        self
    }

    #[must_use]
    pub fn build(self) -> ScheduledTask {
        ScheduledTask {
            task_type: self.task_type,
            start: self.start,
            stop: self.stop,
        }
    }
}

/// 后台任务调度器
#[derive(Default)]
pub struct TaskScheduler {
    tasks: RwLock<Vec<ScheduledTask>>,
}

impl TaskScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, task: ScheduledTask) {
        ldebug!(
            "system",
            LogStage::Scheduling,
            LogComponent::TaskScheduler,
            "task_registered",
            "登记后台任务",
            task = %task.task_type
        );
        self.tasks.write().await.push(task);
    }

    /// 已注册的任务类型，按注册顺序
    pub async fn registered(&self) -> Vec<TaskType> {
        self.tasks
            .read()
            .await
            .iter()
            .map(ScheduledTask::task_type)
            .collect()
    }

    /// 启动所有任务，遇到第一个失败即返回
    pub async fn start_all(&self) -> Result<()> {
        let tasks = { self.tasks.read().await.clone() };
        for task in tasks {
            if let Err(err) = task.start().await {
                lerror!(
                    "system",
                    LogStage::BackgroundTask,
                    LogComponent::TaskScheduler,
                    "task_start_failed",
                    "后台任务启动失败",
                    task = %task.task_type,
                    error = %err
                );
                return Err(err);
            }
        }
        Ok(())
    }

    /// 停止所有任务（逆序执行）
    pub async fn shutdown(&self) -> Result<()> {
        let tasks = { self.tasks.read().await.clone() };
        for task in tasks.into_iter().rev() {
            if let Err(err) = task.stop().await {
                lerror!(
                    "system",
                    LogStage::Shutdown,
                    LogComponent::TaskScheduler,
                    "task_stop_failed",
                    "后台任务未能正常停止",
                    task = %task.task_type,
                    error = %err
                );
                return Err(err);
            }
        }
        Ok(())
    }
}
