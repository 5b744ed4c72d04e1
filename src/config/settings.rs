// ==========================================
// 危废桶监控系统 - 配置值对象
// ==========================================

use serde::{Deserialize, Serialize};
use tracing::warn;

// ==========================================
// MonitorThresholds - 状态/告警阈值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorThresholds {
    pub level_high_pct: f64,     // 将满 / level_high 下限 (默认 80)
    pub level_critical_pct: f64, // 已满 / level_critical 下限 (默认 95)
    pub temperature_high_c: f64, // 高温告警 (严格大于, 默认 40)
}

impl Default for MonitorThresholds {
    fn default() -> Self {
        Self {
            level_high_pct: 80.0,
            level_critical_pct: 95.0,
            temperature_high_c: 40.0,
        }
    }
}

impl MonitorThresholds {
    /// 阈值自洽: 全部有限, 且 0 < high < critical ≤ 100
    pub fn is_consistent(&self) -> bool {
        self.level_high_pct.is_finite()
            && self.level_critical_pct.is_finite()
            && self.temperature_high_c.is_finite()
            && self.level_high_pct > 0.0
            && self.level_high_pct < self.level_critical_pct
            && self.level_critical_pct <= 100.0
    }
}

// ==========================================
// SimulatorSettings - 读数模拟器参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorSettings {
    pub temperature_base_c: f64,
    pub temperature_variation_c: f64,
    pub weight_increment_min_kg: f64,
    pub weight_increment_max_kg: f64,
    pub skip_probability: f64, // 每个 tick 跳过某容器的概率
    pub tick_interval_secs: u64,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            temperature_base_c: 25.0,
            temperature_variation_c: 5.0,
            weight_increment_min_kg: 0.5,
            weight_increment_max_kg: 3.0,
            skip_probability: 0.2,
            tick_interval_secs: 300,
        }
    }
}

impl SimulatorSettings {
    /// 修正越界参数 (非有限值回退默认, 概率夹到 [0,1], 区间端点排序, 负值归零)
    pub fn normalized(mut self) -> Self {
        let d = Self::default();
        self.temperature_base_c =
            finite_or("temperature_base_c", self.temperature_base_c, d.temperature_base_c);
        self.temperature_variation_c = finite_or(
            "temperature_variation_c",
            self.temperature_variation_c,
            d.temperature_variation_c,
        );
        self.weight_increment_min_kg = finite_or(
            "weight_increment_min_kg",
            self.weight_increment_min_kg,
            d.weight_increment_min_kg,
        );
        self.weight_increment_max_kg = finite_or(
            "weight_increment_max_kg",
            self.weight_increment_max_kg,
            d.weight_increment_max_kg,
        );
        self.skip_probability =
            finite_or("skip_probability", self.skip_probability, d.skip_probability);

        self.skip_probability = self.skip_probability.clamp(0.0, 1.0);
        self.temperature_variation_c = self.temperature_variation_c.abs();
        self.weight_increment_min_kg = self.weight_increment_min_kg.max(0.0);
        self.weight_increment_max_kg = self.weight_increment_max_kg.max(0.0);
        if self.weight_increment_min_kg > self.weight_increment_max_kg {
            std::mem::swap(
                &mut self.weight_increment_min_kg,
                &mut self.weight_increment_max_kg,
            );
        }
        if self.tick_interval_secs == 0 {
            self.tick_interval_secs = 1;
        }
        self
    }
}

fn finite_or(field: &str, value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        warn!(field, value = %value, default, "模拟器参数非有限值, 使用默认值");
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_consistent() {
        assert!(MonitorThresholds::default().is_consistent());
        let bad = MonitorThresholds {
            level_high_pct: 95.0,
            level_critical_pct: 80.0,
            temperature_high_c: 40.0,
        };
        assert!(!bad.is_consistent());

        let nan_temp = MonitorThresholds {
            temperature_high_c: f64::NAN,
            ..MonitorThresholds::default()
        };
        assert!(!nan_temp.is_consistent());
        let inf_temp = MonitorThresholds {
            temperature_high_c: f64::INFINITY,
            ..MonitorThresholds::default()
        };
        assert!(!inf_temp.is_consistent());
    }

    #[test]
    fn test_simulator_settings_normalized() {
        let s = SimulatorSettings {
            temperature_base_c: 25.0,
            temperature_variation_c: -5.0,
            weight_increment_min_kg: 3.0,
            weight_increment_max_kg: 0.5,
            skip_probability: 1.5,
            tick_interval_secs: 0,
        }
        .normalized();

        assert_eq!(s.temperature_variation_c, 5.0);
        assert_eq!(s.weight_increment_min_kg, 0.5);
        assert_eq!(s.weight_increment_max_kg, 3.0);
        assert_eq!(s.skip_probability, 1.0);
        assert_eq!(s.tick_interval_secs, 1);
    }

    #[test]
    fn test_non_finite_settings_fall_back_to_defaults() {
        let s = SimulatorSettings {
            temperature_base_c: f64::INFINITY,
            temperature_variation_c: f64::NAN,
            weight_increment_min_kg: f64::NEG_INFINITY,
            weight_increment_max_kg: f64::NAN,
            skip_probability: f64::NAN,
            tick_interval_secs: 60,
        }
        .normalized();

        let d = SimulatorSettings::default();
        assert_eq!(
            s,
            SimulatorSettings {
                tick_interval_secs: 60,
                ..d
            }
        );
    }
}
