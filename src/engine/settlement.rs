// ==========================================
// 危废桶监控系统 - 收运结算引擎
// ==========================================
// 红线: Engine 不拼 SQL; "只扣一次" 由 settlement_state 持久化保证
// ==========================================
// 职责:
//   - 登记/完成前校验收运重量
//   - 识别进入 completed 的边沿
//   - 扣减容器重量 (不足时夹到 0 并告警日志)
// ==========================================

use crate::domain::container::Container;
use crate::domain::types::CollectionStatus;
use crate::engine::container_state::ContainerStateEngine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// 收运重量校验失败
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollectViolation {
    #[error("收运重量必须大于 0: {0} kg")]
    NonPositiveWeight(f64),

    #[error("收运重量 {requested} kg 超过容器当前重量 {available} kg")]
    ExceedsContainerWeight { requested: f64, available: f64 },
}

/// 一次扣重的结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SettlementOutcome {
    pub previous_weight_kg: f64,
    pub deducted_kg: f64,
    pub shortfall_kg: f64, // 收运重量超出当前重量的部分 (被夹掉)
}

// ==========================================
// SettlementEngine - 收运结算引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SettlementEngine {
    state: ContainerStateEngine,
}

impl SettlementEngine {
    pub fn new(state: ContainerStateEngine) -> Self {
        Self { state }
    }

    /// 校验收运重量: 0 < kg ≤ 容器当前重量
    pub fn check_collectable(
        &self,
        container: &Container,
        collected_weight_kg: f64,
    ) -> Result<(), CollectViolation> {
        if !(collected_weight_kg > 0.0) || !collected_weight_kg.is_finite() {
            return Err(CollectViolation::NonPositiveWeight(collected_weight_kg));
        }
        if collected_weight_kg > container.current_weight_kg {
            return Err(CollectViolation::ExceedsContainerWeight {
                requested: collected_weight_kg,
                available: container.current_weight_kg,
            });
        }
        Ok(())
    }

    /// 是否为进入 completed 的边沿
    pub fn is_settlement_edge(previous: CollectionStatus, next: CollectionStatus) -> bool {
        next == CollectionStatus::Completed && previous != CollectionStatus::Completed
    }

    /// 扣减收运重量并重新派生状态 (温度不变)
    pub fn settle(
        &self,
        container: &mut Container,
        collected_weight_kg: f64,
        now: DateTime<Utc>,
    ) -> SettlementOutcome {
        let previous = container.current_weight_kg;
        let next = (previous - collected_weight_kg).max(0.0);
        let shortfall = (collected_weight_kg - previous).max(0.0);

        if shortfall > 0.0 {
            warn!(
                container_id = %container.container_id,
                previous_weight_kg = previous,
                collected_weight_kg,
                shortfall_kg = shortfall,
                "收运重量超过容器当前重量, 重量夹到 0"
            );
        }

        container.current_weight_kg = next;
        container.updated_at = now;
        self.state.recompute(container);

        SettlementOutcome {
            previous_weight_kg: previous,
            deducted_kg: previous - next,
            shortfall_kg: shortfall,
        }
    }

    /// 清空容器 (复位)
    pub fn reset(&self, container: &mut Container, now: DateTime<Utc>) {
        self.state.empty(container, now);
    }
}
