// ==========================================
// 危废桶监控系统 - 容器状态机
// ==========================================
// 红线: Engine 不拼 SQL, 状态派生必须可解释 (explain_status 输出 reason)
// ==========================================
// 职责: 应用读数 / 重新派生状态 / 维护与启停切换
// 派生规则 (纯函数, 每次变更后执行):
//   1. 停用 → inactive
//   2. 维护中 → 保持 maintenance
//   3. 占用率 ≥ critical → full; high ≤ 占用率 < critical → near_full; 否则 normal
// 不变量: 0 ≤ current_weight_kg ≤ capacity_kg
// ==========================================

use crate::config::MonitorThresholds;
use crate::domain::container::{Container, OccupancyGauge};
use crate::domain::reading::{ReadingSample, SensorReading};
use crate::domain::types::ContainerStatus;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

// ==========================================
// ContainerStateEngine - 容器状态机
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ContainerStateEngine {
    thresholds: MonitorThresholds,
}

impl ContainerStateEngine {
    pub fn new(thresholds: MonitorThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &MonitorThresholds {
        &self.thresholds
    }

    // ==========================================
    // 状态派生
    // ==========================================

    /// 由当前字段派生状态
    pub fn derive_status(&self, container: &Container) -> ContainerStatus {
        if !container.is_active {
            return ContainerStatus::Inactive;
        }
        if container.status == ContainerStatus::Maintenance {
            return ContainerStatus::Maintenance;
        }

        let occupancy = container.occupancy_pct();
        if occupancy >= self.thresholds.level_critical_pct {
            ContainerStatus::Full
        } else if occupancy >= self.thresholds.level_high_pct {
            ContainerStatus::NearFull
        } else {
            ContainerStatus::Normal
        }
    }

    /// 派生原因 (JSON)
    pub fn explain_status(&self, container: &Container) -> String {
        let status = self.derive_status(container);
        let rule = match status {
            ContainerStatus::Inactive => "INACTIVE",
            ContainerStatus::Maintenance => "MAINTENANCE_STICKY",
            ContainerStatus::Full => "OCCUPANCY_CRITICAL",
            ContainerStatus::NearFull => "OCCUPANCY_HIGH",
            ContainerStatus::Normal => "OCCUPANCY_NORMAL",
        };

        json!({
            "status": status.to_db_str(),
            "rule": rule,
            "occupancy_pct": container.occupancy_pct(),
            "level_high_pct": self.thresholds.level_high_pct,
            "level_critical_pct": self.thresholds.level_critical_pct,
        })
        .to_string()
    }

    /// 重新派生并写回状态
    ///
    /// # 返回
    /// 状态是否发生变化
    pub fn recompute(&self, container: &mut Container) -> bool {
        let next = self.derive_status(container);
        let changed = next != container.status;
        if changed {
            debug!(
                container_id = %container.container_id,
                from = %container.status,
                to = %next,
                "容器状态变更"
            );
        }
        container.status = next;
        changed
    }

    // ==========================================
    // 变更操作
    // ==========================================

    /// 应用一次读数
    ///
    /// # 参数
    /// - container: 当前容器 (原地修改)
    /// - sample: 重量增量与温度
    /// - simulated: 是否来自模拟器
    /// - now: 读数时间
    ///
    /// # 返回
    /// - Some(SensorReading): 待追加的读数记录
    /// - None: 容器已停用, 未做任何修改
    pub fn apply_sample(
        &self,
        container: &mut Container,
        sample: ReadingSample,
        simulated: bool,
        now: DateTime<Utc>,
    ) -> Option<SensorReading> {
        if !container.is_active {
            return None;
        }

        let raw = container.current_weight_kg + sample.weight_delta_kg;
        container.current_weight_kg = raw.clamp(0.0, container.capacity_kg);
        container.temperature_c = sample.temperature_c;
        container.last_reading_at = Some(now);
        container.updated_at = now;
        self.recompute(container);

        Some(SensorReading {
            reading_id: Uuid::new_v4().to_string(),
            container_id: container.container_id.clone(),
            weight_kg: container.current_weight_kg,
            temperature_c: container.temperature_c,
            read_at: now,
            simulated,
        })
    }

    /// 清空容器: 重量归零, 状态回到 normal (停用容器保持 inactive)
    pub fn empty(&self, container: &mut Container, now: DateTime<Utc>) {
        container.current_weight_kg = 0.0;
        container.status = ContainerStatus::Normal;
        container.updated_at = now;
        self.recompute(container);
    }

    /// 进入/解除维护
    ///
    /// 解除时从占用率重新派生
    pub fn set_maintenance(&self, container: &mut Container, enabled: bool, now: DateTime<Utc>) {
        container.status = if enabled {
            ContainerStatus::Maintenance
        } else {
            ContainerStatus::Normal
        };
        container.updated_at = now;
        self.recompute(container);
    }

    /// 启用/停用
    ///
    /// 停用会清除维护标记; 重新启用后从占用率派生
    pub fn set_active(&self, container: &mut Container, active: bool, now: DateTime<Utc>) {
        container.is_active = active;
        if active && container.status == ContainerStatus::Inactive {
            container.status = ContainerStatus::Normal;
        }
        container.updated_at = now;
        self.recompute(container);
    }
}
