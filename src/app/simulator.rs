// ==========================================
// 危废桶监控系统 - 读数模拟服务
// ==========================================
// 职责: 每个 tick 为所有启用容器采样并应用读数
// 并发: 不同容器在 tokio 阻塞线程池上并行; 同一容器由容器锁串行
// 说明: 显式构造一次并注入, 不依赖全局单例
// ==========================================

use std::sync::{Arc, Mutex};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::{ApiError, ApiResult, MonitorApi};
use crate::engine::ReadingSource;

/// 单个 tick 的统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    pub containers_processed: usize,
    pub readings_created: usize,
    pub skipped: usize,
    pub new_alerts: usize,
    pub failures: usize,
    pub open_alerts: i64,
}

// ==========================================
// SimulatorService - 读数模拟服务
// ==========================================
pub struct SimulatorService {
    monitor_api: Arc<MonitorApi>,
    source: Mutex<Box<dyn ReadingSource>>,
}

impl SimulatorService {
    pub fn new(monitor_api: Arc<MonitorApi>, source: Box<dyn ReadingSource>) -> Self {
        Self {
            monitor_api,
            source: Mutex::new(source),
        }
    }

    /// 执行一次模拟 tick
    ///
    /// 单个容器失败只计数并记录日志, 不中断其它容器
    pub async fn run_tick(&self) -> ApiResult<TickSummary> {
        let containers = self
            .monitor_api
            .list_containers()?
            .into_iter()
            .filter(|c| c.is_active)
            .collect::<Vec<_>>();

        let mut summary = TickSummary {
            containers_processed: containers.len(),
            ..TickSummary::default()
        };

        // 采样按容器编号顺序进行, 固定种子时结果可复现
        let samples = {
            let mut source = self
                .source
                .lock()
                .map_err(|e| ApiError::InternalError(format!("读数源锁获取失败: {}", e)))?;
            containers
                .iter()
                .map(|c| (c.container_id.clone(), source.sample(c)))
                .collect::<Vec<_>>()
        };

        let mut tasks = Vec::new();
        for (container_id, sample) in samples {
            let Some(sample) = sample else {
                summary.skipped += 1;
                continue;
            };
            let api = Arc::clone(&self.monitor_api);
            tasks.push(tokio::task::spawn_blocking(move || {
                let result = api.apply_sample(&container_id, sample, true);
                (container_id, result)
            }));
        }

        for joined in join_all(tasks).await {
            match joined {
                Ok((_, Ok(Some(outcome)))) => {
                    summary.readings_created += 1;
                    summary.new_alerts += outcome.new_alerts.len();
                }
                // 采样后被停用
                Ok((_, Ok(None))) => summary.skipped += 1,
                Ok((container_id, Err(e))) => {
                    summary.failures += 1;
                    warn!(container_id = %container_id, error = %e, "读数应用失败");
                }
                Err(e) => {
                    summary.failures += 1;
                    warn!(error = %e, "读数任务异常退出");
                }
            }
        }

        summary.open_alerts = self.monitor_api.system_status()?.open_alerts;

        info!(
            containers = summary.containers_processed,
            readings = summary.readings_created,
            skipped = summary.skipped,
            new_alerts = summary.new_alerts,
            failures = summary.failures,
            open_alerts = summary.open_alerts,
            "模拟 tick 完成"
        );
        Ok(summary)
    }
}
