// ==========================================
// 危废桶监控系统 - API 层
// ==========================================
// 职责: 对外暴露的具名操作; 编排 引擎 + 仓储 + 容器锁 + 事务
// 红线: 副作用只发生在具名操作内, 不挂在通用保存钩子上
// ==========================================

pub mod collection_api;
pub mod error;
pub mod monitor_api;

// 重导出核心类型
pub use collection_api::CollectionApi;
pub use error::{ApiError, ApiResult};
pub use monitor_api::{MonitorApi, ReadingOutcome, SystemStatus, MAINTENANCE_DONE_NOTE, RESET_NOTE};
