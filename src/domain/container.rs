// ==========================================
// 危废桶监控系统 - 容器领域模型
// ==========================================
// 不变量: 0 ≤ current_weight_kg ≤ capacity_kg
// 该不变量只由容器状态机维护, 校验层不负责
// ==========================================

use crate::domain::types::ContainerStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Container - 危废桶
// ==========================================
// 对齐: container 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    // ===== 主键 =====
    pub container_id: String, // 容器编号 (如 "CNT-HOS-001")
    pub company_id: String,   // 所属企业

    // ===== 安装信息 =====
    pub waste_type: String,
    pub install_address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub installed_on: NaiveDate,

    // ===== 传感器状态 =====
    pub capacity_kg: f64,       // 容量 (kg, > 0)
    pub current_weight_kg: f64, // 当前重量 (kg)
    pub temperature_c: f64,     // 当前温度 (°C)
    pub status: ContainerStatus,
    pub is_active: bool,
    pub last_reading_at: Option<DateTime<Utc>>,

    // ===== 审计 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// Trait: OccupancyGauge
// ==========================================
// 用途: 占用率计算接口 (状态机与告警引擎共用)
pub trait OccupancyGauge {
    /// 占用率 (%), 保留两位小数; 容量为 0 时返回 0
    fn occupancy_pct(&self) -> f64;

    /// 剩余可装重量 (kg), 最小为 0
    fn remaining_capacity_kg(&self) -> f64;

    /// 是否需要安排收运 (占用率 ≥ 80%)
    fn needs_collection(&self) -> bool;
}

impl OccupancyGauge for Container {
    fn occupancy_pct(&self) -> f64 {
        occupancy_pct(self.current_weight_kg, self.capacity_kg)
    }

    fn remaining_capacity_kg(&self) -> f64 {
        (self.capacity_kg - self.current_weight_kg).max(0.0)
    }

    fn needs_collection(&self) -> bool {
        self.occupancy_pct() >= 80.0
    }
}

/// 占用率公式: weight / capacity * 100, 两位小数
pub fn occupancy_pct(weight_kg: f64, capacity_kg: f64) -> f64 {
    if capacity_kg <= 0.0 {
        return 0.0;
    }
    ((weight_kg / capacity_kg) * 100.0 * 100.0).round() / 100.0
}

impl Container {
    /// 创建新容器 (外部开通流程使用)
    ///
    /// 初始: weight = 0, status = normal, is_active = true
    pub fn new(
        container_id: String,
        company_id: String,
        capacity_kg: f64,
        waste_type: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            container_id,
            company_id,
            waste_type,
            install_address: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            installed_on: now.date_naive(),
            capacity_kg,
            current_weight_kg: 0.0,
            temperature_c: 25.0,
            status: ContainerStatus::Normal,
            is_active: true,
            last_reading_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 设置安装位置
    pub fn with_location(mut self, address: &str, latitude: f64, longitude: f64) -> Self {
        self.install_address = address.to_string();
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }
}
