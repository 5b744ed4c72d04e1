// ==========================================
// 危废桶监控系统 - 告警规则引擎
// ==========================================
// 红线: Engine 不拼 SQL; 去重由 API 层在容器独占区内完成
// ==========================================
// 规则 (相互独立, 可同时命中):
// | 条件                          | 类型             | 级别     |
// | 占用率 ≥ critical             | level_critical   | critical |
// | high ≤ 占用率 < critical      | level_high       | high     |
// | 温度 > temperature_high       | temperature_high | medium   |
// ==========================================

use crate::config::MonitorThresholds;
use crate::domain::alert::AlertCandidate;
use crate::domain::container::{Container, OccupancyGauge};
use crate::domain::types::{AlertSeverity, AlertType};
use tracing::instrument;

// ==========================================
// AlertEngine - 告警规则引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct AlertEngine {
    thresholds: MonitorThresholds,
}

impl AlertEngine {
    pub fn new(thresholds: MonitorThresholds) -> Self {
        Self { thresholds }
    }

    /// 评估容器当前状态, 返回命中的告警候选
    ///
    /// 只看容器字段, 不看已有告警
    #[instrument(skip(self, container), fields(container_id = %container.container_id))]
    pub fn evaluate(&self, container: &Container) -> Vec<AlertCandidate> {
        let mut candidates = Vec::with_capacity(2);
        let occupancy = container.occupancy_pct();

        if occupancy >= self.thresholds.level_critical_pct {
            candidates.push(AlertCandidate {
                alert_type: AlertType::LevelCritical,
                severity: AlertSeverity::Critical,
                description: format!(
                    "容器 {} 已满: 占用率 {:.2}% (阈值 {}%), 需立即收运",
                    container.container_id, occupancy, self.thresholds.level_critical_pct
                ),
                trigger_value: occupancy,
            });
        } else if occupancy >= self.thresholds.level_high_pct {
            candidates.push(AlertCandidate {
                alert_type: AlertType::LevelHigh,
                severity: AlertSeverity::High,
                description: format!(
                    "容器 {} 将满: 占用率 {:.2}% (阈值 {}%), 请安排收运",
                    container.container_id, occupancy, self.thresholds.level_high_pct
                ),
                trigger_value: occupancy,
            });
        }

        if container.temperature_c > self.thresholds.temperature_high_c {
            candidates.push(AlertCandidate {
                alert_type: AlertType::TemperatureHigh,
                severity: AlertSeverity::Medium,
                description: format!(
                    "容器 {} 温度过高: {:.1}°C (阈值 {}°C)",
                    container.container_id,
                    container.temperature_c,
                    self.thresholds.temperature_high_c
                ),
                trigger_value: container.temperature_c,
            });
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(weight: f64, temperature: f64) -> Container {
        let mut c = Container::new("CNT-HOS-001".into(), "EMP-1".into(), 200.0, "hospitalar".into());
        c.current_weight_kg = weight;
        c.temperature_c = temperature;
        c
    }

    fn types(candidates: &[AlertCandidate]) -> Vec<AlertType> {
        candidates.iter().map(|c| c.alert_type).collect()
    }

    #[test]
    fn test_no_alerts_below_thresholds() {
        let engine = AlertEngine::default();
        assert!(engine.evaluate(&container(100.0, 40.0)).is_empty());
    }

    #[test]
    fn test_level_high_and_temperature() {
        let engine = AlertEngine::default();
        let out = engine.evaluate(&container(160.0, 42.0));

        assert_eq!(types(&out), vec![AlertType::LevelHigh, AlertType::TemperatureHigh]);
        assert_eq!(out[0].severity, AlertSeverity::High);
        assert_eq!(out[0].trigger_value, 80.0);
        assert!(out[0].description.contains("CNT-HOS-001"));
        assert!(out[0].description.contains("80.00"));
        assert_eq!(out[1].severity, AlertSeverity::Medium);
        assert!(out[1].description.contains("42.0"));
    }

    #[test]
    fn test_level_critical_excludes_level_high() {
        let engine = AlertEngine::default();
        let out = engine.evaluate(&container(190.0, 25.0));

        assert_eq!(types(&out), vec![AlertType::LevelCritical]);
        assert_eq!(out[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_custom_thresholds() {
        let engine = AlertEngine::new(MonitorThresholds {
            level_high_pct: 50.0,
            level_critical_pct: 70.0,
            temperature_high_c: 30.0,
        });
        let out = engine.evaluate(&container(110.0, 31.0));
        assert_eq!(types(&out), vec![AlertType::LevelHigh, AlertType::TemperatureHigh]);
    }
}
