// ==========================================
// 危废桶监控系统 - 传感器读数
// ==========================================
// 只追加 (append-only), 核心层从不修改/删除
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// SensorReading - 读数历史记录
// ==========================================
// 对齐: sensor_reading 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    pub reading_id: String,
    pub container_id: String,
    pub weight_kg: f64,     // 读数后的容器重量
    pub temperature_c: f64, // 读数温度
    pub read_at: DateTime<Utc>,
    pub simulated: bool,
}

// ==========================================
// ReadingSample - 读数源单次采样
// ==========================================
// 读数源与核心之间唯一的约定: 每个 tick 给出重量增量与温度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadingSample {
    pub weight_delta_kg: f64,
    pub temperature_c: f64,
}

impl ReadingSample {
    pub fn new(weight_delta_kg: f64, temperature_c: f64) -> Self {
        Self {
            weight_delta_kg,
            temperature_c,
        }
    }
}
