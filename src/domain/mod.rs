// ==========================================
// 危废桶监控系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod alert;
pub mod collection;
pub mod company;
pub mod container;
pub mod reading;
pub mod types;

// 重导出核心类型
pub use alert::{Alert, AlertCandidate};
pub use collection::{Collection, NewCollection};
pub use company::Company;
pub use container::{occupancy_pct, Container, OccupancyGauge};
pub use reading::{ReadingSample, SensorReading};
pub use types::{AlertSeverity, AlertType, CollectionStatus, ContainerStatus, SettlementState};
