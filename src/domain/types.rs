// ==========================================
// 危废桶监控系统 - 领域类型定义
// ==========================================
// 职责: 容器状态 / 告警类型 / 告警级别 / 收运状态 / 结算状态
// 序列化格式: snake_case (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 容器状态 (Container Status)
// ==========================================
// 占用率派生: Normal → NearFull → Full
// Maintenance / Inactive 覆盖占用率派生状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    Normal,      // 正常
    NearFull,    // 将满
    Full,        // 已满
    Maintenance, // 维护中（粘滞, 只能外部解除）
    Inactive,    // 停用
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ContainerStatus {
    /// 全部状态（统计用, 顺序固定）
    pub const ALL: [ContainerStatus; 5] = [
        ContainerStatus::Normal,
        ContainerStatus::NearFull,
        ContainerStatus::Full,
        ContainerStatus::Maintenance,
        ContainerStatus::Inactive,
    ];

    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Some(ContainerStatus::Normal),
            "near_full" => Some(ContainerStatus::NearFull),
            "full" => Some(ContainerStatus::Full),
            "maintenance" => Some(ContainerStatus::Maintenance),
            "inactive" => Some(ContainerStatus::Inactive),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ContainerStatus::Normal => "normal",
            ContainerStatus::NearFull => "near_full",
            ContainerStatus::Full => "full",
            ContainerStatus::Maintenance => "maintenance",
            ContainerStatus::Inactive => "inactive",
        }
    }
}

// ==========================================
// 告警类型 (Alert Type)
// ==========================================
// 去重键: (container_id, alert_type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LevelHigh,       // 液位高
    LevelCritical,   // 液位临界
    TemperatureHigh, // 温度高
    Maintenance,     // 需要维护
    SensorFailure,   // 传感器故障
    Other,           // 其他
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AlertType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "level_high" => Some(AlertType::LevelHigh),
            "level_critical" => Some(AlertType::LevelCritical),
            "temperature_high" => Some(AlertType::TemperatureHigh),
            "maintenance" => Some(AlertType::Maintenance),
            "sensor_failure" => Some(AlertType::SensorFailure),
            "other" => Some(AlertType::Other),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AlertType::LevelHigh => "level_high",
            AlertType::LevelCritical => "level_critical",
            AlertType::TemperatureHigh => "temperature_high",
            AlertType::Maintenance => "maintenance",
            AlertType::SensorFailure => "sensor_failure",
            AlertType::Other => "other",
        }
    }
}

// ==========================================
// 告警级别 (Alert Severity)
// ==========================================
// 顺序: Low < Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,      // 低
    Medium,   // 中
    High,     // 高
    Critical, // 严重
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AlertSeverity {
    pub const ALL: [AlertSeverity; 4] = [
        AlertSeverity::Low,
        AlertSeverity::Medium,
        AlertSeverity::High,
        AlertSeverity::Critical,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(AlertSeverity::Low),
            "medium" => Some(AlertSeverity::Medium),
            "high" => Some(AlertSeverity::High),
            "critical" => Some(AlertSeverity::Critical),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

// ==========================================
// 收运状态 (Collection Status)
// ==========================================
// Completed / Cancelled 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    Pending,    // 待收运
    InProgress, // 收运中
    Completed,  // 已完成
    Cancelled,  // 已取消
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl CollectionStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(CollectionStatus::Pending),
            "in_progress" => Some(CollectionStatus::InProgress),
            "completed" => Some(CollectionStatus::Completed),
            "cancelled" => Some(CollectionStatus::Cancelled),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            CollectionStatus::Pending => "pending",
            CollectionStatus::InProgress => "in_progress",
            CollectionStatus::Completed => "completed",
            CollectionStatus::Cancelled => "cancelled",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, CollectionStatus::Completed | CollectionStatus::Cancelled)
    }
}

// ==========================================
// 结算状态 (Settlement State)
// ==========================================
// 记录"进入 completed"的扣重副作用是否已经发生
// - Pending: 尚未结算
// - Applied: 已扣减容器重量
// - Waived: 创建时即为 completed, 不扣重
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementState {
    Pending,
    Applied,
    Waived,
}

impl fmt::Display for SettlementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl SettlementState {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(SettlementState::Pending),
            "applied" => Some(SettlementState::Applied),
            "waived" => Some(SettlementState::Waived),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            SettlementState::Pending => "pending",
            SettlementState::Applied => "applied",
            SettlementState::Waived => "waived",
        }
    }
}
