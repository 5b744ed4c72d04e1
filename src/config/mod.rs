// ==========================================
// 危废桶监控系统 - 配置层
// ==========================================
// 职责: 阈值与模拟器参数管理
// 存储: config_kv 表 (scope_id = 'global')
// ==========================================

pub mod config_manager;
pub mod settings;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use settings::{MonitorThresholds, SimulatorSettings};
