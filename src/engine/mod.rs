// ==========================================
// 危废桶监控系统 - 引擎层
// ==========================================
// 职责: 实现状态派生 / 告警规则 / 收运结算, 不拼 SQL
// 红线: Engine 不访问数据库, 只对内存中的领域对象求值
// ==========================================

pub mod alert_rules;
pub mod container_state;
pub mod reading_source;
pub mod settlement;

// 重导出核心引擎
pub use alert_rules::AlertEngine;
pub use container_state::ContainerStateEngine;
pub use reading_source::{RandomReadingSource, ReadingSource};
pub use settlement::{CollectViolation, SettlementEngine, SettlementOutcome};
