// ==========================================
// 危废桶监控系统 - 告警领域模型
// ==========================================
// 不变量: 同一 (container_id, alert_type) 至多一条未解决告警
// 解决后的告警保留为历史, 再次越限会新建告警
// ==========================================

use crate::domain::types::{AlertSeverity, AlertType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Alert - 告警
// ==========================================
// 对齐: alert 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    pub container_id: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub description: String,

    // ===== 解决信息 =====
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// 创建新的未解决告警
    pub fn open(
        container_id: &str,
        alert_type: AlertType,
        severity: AlertSeverity,
        description: String,
    ) -> Self {
        Self {
            alert_id: Uuid::new_v4().to_string(),
            container_id: container_id.to_string(),
            alert_type,
            severity,
            description,
            resolved: false,
            resolved_at: None,
            resolution_notes: None,
            created_at: Utc::now(),
        }
    }

    /// 去重键
    pub fn dedup_key(&self) -> (&str, AlertType) {
        (self.container_id.as_str(), self.alert_type)
    }
}

// ==========================================
// AlertCandidate - 告警候选
// ==========================================
// 告警引擎的纯输出: 规则命中但尚未经过去重
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCandidate {
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub description: String,
    pub trigger_value: f64, // 触发值 (占用率 % 或温度 °C)
}

impl AlertCandidate {
    /// 转换为待插入的告警
    pub fn into_alert(self, container_id: &str) -> Alert {
        Alert::open(container_id, self.alert_type, self.severity, self.description)
    }
}
