// ==========================================
// 危废桶监控系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + tokio
// 系统定位: 容器状态与告警引擎 (读数 → 状态 → 告警, 收运 → 扣重)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 状态/告警/结算规则
pub mod engine;

// 配置层 - 阈值与模拟器参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 容器级互斥
pub mod container_lock;

// API 层 - 具名操作
pub mod api;

// 应用层 - 共享状态与模拟器
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AlertSeverity, AlertType, CollectionStatus, ContainerStatus, SettlementState,
};

// 领域实体
pub use domain::{
    Alert, AlertCandidate, Collection, Company, Container, NewCollection, OccupancyGauge,
    ReadingSample, SensorReading,
};

// 引擎
pub use engine::{
    AlertEngine, ContainerStateEngine, RandomReadingSource, ReadingSource, SettlementEngine,
};

// API
pub use api::{ApiError, ApiResult, CollectionApi, MonitorApi, SystemStatus};

// 应用
pub use app::{AppState, SimulatorService, TickSummary};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "危废桶监控系统";
