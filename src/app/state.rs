// ==========================================
// 危废桶监控系统 - 应用状态
// ==========================================
// 职责: 管理共享连接、配置与 API 实例
// 说明: 所有 API 共用一个连接与一个容器锁表
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{CollectionApi, MonitorApi};
use crate::config::{ConfigManager, MonitorThresholds, SimulatorSettings};
use crate::container_lock::ContainerLockManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{ContainerStateEngine, SettlementEngine};

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 共享连接
    pub conn: Arc<Mutex<Connection>>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 启动时加载的阈值
    pub thresholds: MonitorThresholds,

    /// 容器监控 API
    pub monitor_api: Arc<MonitorApi>,

    /// 收运 API
    pub collection_api: Arc<CollectionApi>,
}

impl AppState {
    /// 创建新的 AppState 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径 (不存在时自动创建并建表)
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        Self::from_connection(db_path, conn)
    }

    /// 从已建表的共享连接创建
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let thresholds = config_manager
            .load_thresholds()
            .map_err(|e| format!("阈值配置加载失败: {}", e))?;

        let locks = Arc::new(ContainerLockManager::new());
        let monitor_api = Arc::new(MonitorApi::new(conn.clone(), locks.clone(), thresholds));
        let collection_api = Arc::new(CollectionApi::new(
            conn.clone(),
            locks,
            SettlementEngine::new(ContainerStateEngine::new(thresholds)),
        ));

        tracing::info!(?thresholds, "AppState初始化完成");

        Ok(Self {
            db_path,
            conn,
            config_manager,
            thresholds,
            monitor_api,
            collection_api,
        })
    }

    /// 读取模拟器参数
    pub fn simulator_settings(&self) -> Result<SimulatorSettings, String> {
        self.config_manager
            .load_simulator_settings()
            .map_err(|e| format!("模拟器配置加载失败: {}", e))
    }
}

/// 获取默认数据库路径
///
/// 优先级: BOMBONA_MONITOR_DB_PATH → 用户数据目录 → ./bombona_monitor.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("BOMBONA_MONITOR_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./bombona_monitor.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("bombona-monitor");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("bombona_monitor.db");
        }
    }

    path.to_string_lossy().to_string()
}
