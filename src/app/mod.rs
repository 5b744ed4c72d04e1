// ==========================================
// 危废桶监控系统 - 应用层
// ==========================================
// 职责: 组装共享状态, 驱动读数模拟
// ==========================================

pub mod simulator;
pub mod state;

// 重导出
pub use simulator::{SimulatorService, TickSummary};
pub use state::{get_default_db_path, AppState};
