// ==========================================
// 危废桶监控系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// 规则: 缺失或格式错误的配置回退默认值, 并记录 warn
// ==========================================

use crate::config::settings::{MonitorThresholds, SimulatorSettings};
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取并解析配置; 缺失或无法解析时返回默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + Copy,
    {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 读取浮点配置; "NaN" / "inf" 等非有限值视同格式错误
    fn get_finite_or_default(&self, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
        let value = self.get_parsed_or_default(key, default)?;
        if value.is_finite() {
            return Ok(value);
        }

        tracing::warn!(config_key = key, raw_value = %value, "配置值非有限数，使用默认值");
        Ok(default)
    }

    // ===== 状态/告警阈值 =====

    /// 加载状态与告警阈值
    ///
    /// 阈值不自洽（high ≥ critical 等）时整体回退默认值
    pub fn load_thresholds(&self) -> Result<MonitorThresholds, Box<dyn Error>> {
        let defaults = MonitorThresholds::default();
        let thresholds = MonitorThresholds {
            level_high_pct: self
                .get_finite_or_default(config_keys::LEVEL_HIGH_PCT, defaults.level_high_pct)?,
            level_critical_pct: self.get_finite_or_default(
                config_keys::LEVEL_CRITICAL_PCT,
                defaults.level_critical_pct,
            )?,
            temperature_high_c: self.get_finite_or_default(
                config_keys::TEMPERATURE_HIGH_C,
                defaults.temperature_high_c,
            )?,
        };

        if !thresholds.is_consistent() {
            tracing::warn!(?thresholds, "阈值配置不自洽，使用默认阈值");
            return Ok(defaults);
        }

        Ok(thresholds)
    }

    // ===== 模拟器参数 =====

    /// 加载读数模拟器参数
    pub fn load_simulator_settings(&self) -> Result<SimulatorSettings, Box<dyn Error>> {
        let d = SimulatorSettings::default();
        let settings = SimulatorSettings {
            temperature_base_c: self
                .get_finite_or_default(config_keys::SIM_TEMPERATURE_BASE_C, d.temperature_base_c)?,
            temperature_variation_c: self.get_finite_or_default(
                config_keys::SIM_TEMPERATURE_VARIATION_C,
                d.temperature_variation_c,
            )?,
            weight_increment_min_kg: self.get_finite_or_default(
                config_keys::SIM_WEIGHT_INCREMENT_MIN_KG,
                d.weight_increment_min_kg,
            )?,
            weight_increment_max_kg: self.get_finite_or_default(
                config_keys::SIM_WEIGHT_INCREMENT_MAX_KG,
                d.weight_increment_max_kg,
            )?,
            skip_probability: self
                .get_finite_or_default(config_keys::SIM_SKIP_PROBABILITY, d.skip_probability)?,
            tick_interval_secs: self
                .get_parsed_or_default(config_keys::SIM_TICK_INTERVAL_SECS, d.tick_interval_secs)?,
        };

        Ok(settings.normalized())
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 阈值
    pub const LEVEL_HIGH_PCT: &str = "level_high_pct";
    pub const LEVEL_CRITICAL_PCT: &str = "level_critical_pct";
    pub const TEMPERATURE_HIGH_C: &str = "temperature_high_c";

    // 模拟器
    pub const SIM_TEMPERATURE_BASE_C: &str = "sim_temperature_base_c";
    pub const SIM_TEMPERATURE_VARIATION_C: &str = "sim_temperature_variation_c";
    pub const SIM_WEIGHT_INCREMENT_MIN_KG: &str = "sim_weight_increment_min_kg";
    pub const SIM_WEIGHT_INCREMENT_MAX_KG: &str = "sim_weight_increment_max_kg";
    pub const SIM_SKIP_PROBABILITY: &str = "sim_skip_probability";
    pub const SIM_TICK_INTERVAL_SECS: &str = "sim_tick_interval_secs";
}
