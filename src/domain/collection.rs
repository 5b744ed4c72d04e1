// ==========================================
// 危废桶监控系统 - 收运领域模型
// ==========================================
// 扣重副作用只在"进入 completed"的边沿触发一次
// settlement_state 持久化记录边沿是否已触发
// ==========================================

use crate::domain::types::{CollectionStatus, SettlementState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Collection - 收运记录
// ==========================================
// 对齐: collection 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub collection_id: String,
    pub container_id: String,
    pub operator_id: Option<String>,

    pub collected_at: DateTime<Utc>, // 计划/实际收运时间
    pub collected_weight_kg: f64,    // 收运重量 (> 0)

    pub destination: String,
    pub destination_company: Option<String>,
    pub manifest_number: Option<String>,
    pub notes: Option<String>,

    pub status: CollectionStatus,
    pub settlement_state: SettlementState,
    pub settled_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    /// 是否仍需结算 (已完成且边沿未触发)
    pub fn awaiting_settlement(&self) -> bool {
        self.status == CollectionStatus::Completed
            && self.settlement_state == SettlementState::Pending
    }
}

// ==========================================
// NewCollection - 收运登记请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCollection {
    pub container_id: String,
    pub operator_id: Option<String>,
    pub collected_at: DateTime<Utc>,
    pub collected_weight_kg: f64,
    pub destination: String,
    pub destination_company: Option<String>,
    pub manifest_number: Option<String>,
    pub notes: Option<String>,
    pub status: CollectionStatus,
}

impl NewCollection {
    /// 以 pending 状态登记
    pub fn pending(container_id: &str, collected_weight_kg: f64, destination: &str) -> Self {
        Self {
            container_id: container_id.to_string(),
            operator_id: None,
            collected_at: Utc::now(),
            collected_weight_kg,
            destination: destination.to_string(),
            destination_company: None,
            manifest_number: None,
            notes: None,
            status: CollectionStatus::Pending,
        }
    }
}
