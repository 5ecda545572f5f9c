use crate::app::context::AppContext;
use crate::app::task_scheduler::{ScheduledTask, TaskScheduler};
use crate::error::Result;
use crate::logging::{LogComponent, LogStage};
use crate::upload::UploadRegistry;
use crate::{ldebug, linfo};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// 后台任务类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// 过期上传票据清理
    UploadSweep,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UploadSweep => f.write_str("upload_sweep"),
        }
    }
}

/// 定期清理过期上传票据
#[derive(Clone)]
pub struct UploadSweepTask {
    registry: Arc<UploadRegistry>,
    interval: Duration,
    task_handle: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl UploadSweepTask {
    #[must_use]
    pub fn new(registry: Arc<UploadRegistry>, interval: Duration) -> Self {
        Self {
            registry,
            interval,
            task_handle: Arc::new(RwLock::new(None)),
        }
    }

    /// 执行一次清理，返回清理数量
    pub async fn sweep_once(&self) -> usize {
        let removed = self.registry.sweep_expired(Utc::now()).await;
        if removed > 0 {
            linfo!(
                "system",
                LogStage::BackgroundTask,
                LogComponent::Upload,
                "upload_sweep",
                "已清理过期上传票据",
                removed = removed
            );
        } else {
            ldebug!(
                "system",
                LogStage::BackgroundTask,
                LogComponent::Upload,
                "upload_sweep",
                "没有过期的上传票据"
            );
        }
        removed
    }

    pub async fn start(&self) -> Result<()> {
        let mut guard = self.task_handle.write().await;
        if guard.is_some() {
            return Ok(());
        }

        let task = self.clone();
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(task.interval);
            // 第一次 tick 立即返回
            ticker.tick().await;
            loop {
                ticker.tick().await;
                task.sweep_once().await;
            }
        }));

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Upload,
            "upload_sweep_started",
            "上传票据清理任务已启动",
            interval_secs = self.interval.as_secs()
        );
        Ok(())
    }

    pub async fn stop(&self) {
        let handle = self.task_handle.write().await.take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }
        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::Upload,
            "upload_sweep_stopped",
            "上传票据清理任务已停止"
        );
    }

    pub async fn is_running(&self) -> bool {
        self.task_handle.read().await.is_some()
    }
}

/// 后台任务集合：调度器及任务实例统一管理
pub struct AppTasks {
    scheduler: Arc<TaskScheduler>,
    upload_sweep: Arc<UploadSweepTask>,
}

impl AppTasks {
    /// 初始化调度器并注册所有后台任务
    pub async fn initialize(context: &AppContext) -> Result<Arc<Self>> {
        let scheduler = Arc::new(TaskScheduler::new());
        let upload_sweep = Arc::new(UploadSweepTask::new(
            Arc::clone(&context.uploads),
            Duration::from_secs(context.config.upload.sweep_interval_secs),
        ));

        scheduler
            .register(
                ScheduledTask::builder(TaskType::UploadSweep, {
                    let task = upload_sweep.clone();
                    move || {
                        let task = task.clone();
                        async move { task.start().await }
                    }
                })
                .on_stop({
                    let task = upload_sweep.clone();
                    move || {
                        let task = task.clone();
                        async move {
                            task.stop().await;
                            Ok(())
                        }
                    }
                })
                .build(),
            )
            .await;

        Ok(Arc::new(Self {
            scheduler,
            upload_sweep,
        }))
    }

    #[must_use]
    pub fn scheduler(&self) -> Arc<TaskScheduler> {
        Arc::clone(&self.scheduler)
    }

    #[must_use]
    pub fn upload_sweep(&self) -> Arc<UploadSweepTask> {
        Arc::clone(&self.upload_sweep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::{UploadTicket, UploadType};
    use uuid::Uuid;

    fn expired_ticket() -> UploadTicket {
        UploadTicket::new(
            Uuid::new_v4(),
            "talent_certificate/2025/01/x.pdf".to_string(),
            UploadType::TalentCertificate,
            "x.pdf".to_string(),
            "application/pdf".to_string(),
            chrono::Duration::seconds(-5),
        )
    }

    #[tokio::test]
    async fn test_sweep_once_removes_expired() {
        let registry = Arc::new(UploadRegistry::new());
        registry.insert(expired_ticket()).await;
        let task = UploadSweepTask::new(registry.clone(), Duration::from_secs(300));

        assert_eq!(task.sweep_once().await, 1);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_stop_clears_handle() {
        let registry = Arc::new(UploadRegistry::new());
        let task = UploadSweepTask::new(registry, Duration::from_secs(300));

        task.start().await.unwrap();
        task.start().await.unwrap();
        assert!(task.is_running().await);

        task.stop().await;
        assert!(!task.is_running().await);
    }

    #[tokio::test]
    async fn test_background_loop_sweeps_on_interval() {
        let registry = Arc::new(UploadRegistry::new());
        registry.insert(expired_ticket()).await;
        let task = UploadSweepTask::new(registry.clone(), Duration::from_millis(20));

        task.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(registry.is_empty().await);
        task.stop().await;
    }
}
