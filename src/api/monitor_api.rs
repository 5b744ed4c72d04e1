// ==========================================
// 危废桶监控系统 - 容器监控 API
// ==========================================
// 职责: 读数应用 → 状态派生 → 告警去重插入; 告警解决; 复位; 手动状态
// 并发: 同一容器的操作在 ContainerLockManager 独占区内串行
// 原子性: 每个操作一个 SQLite 事务, 失败整体回滚
// ==========================================

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::MonitorThresholds;
use crate::container_lock::ContainerLockManager;
use crate::domain::alert::Alert;
use crate::domain::company::Company;
use crate::domain::container::{Container, OccupancyGauge};
use crate::domain::reading::{ReadingSample, SensorReading};
use crate::domain::types::{AlertSeverity, AlertType, ContainerStatus};
use crate::engine::{AlertEngine, ContainerStateEngine, SettlementEngine};
use crate::repository::{
    run_in_transaction, AlertRepository, CompanyRepository, ContainerRepository,
    ReadingRepository, RepositoryResult,
};

/// 复位时写入的告警解决说明
pub const RESET_NOTE: &str = "容器已清空 - 复位";
/// 解除维护时写入的告警解决说明
pub const MAINTENANCE_DONE_NOTE: &str = "维护结束";

/// 一次读数的处理结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingOutcome {
    pub reading: SensorReading,
    pub status: ContainerStatus,
    pub new_alerts: Vec<Alert>,
}

/// 系统状态快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    pub total_containers: i64,
    pub containers_by_status: BTreeMap<String, i64>,
    pub open_alerts: i64,
    pub open_alerts_by_severity: BTreeMap<String, i64>,
    pub readings_last_24h: i64,
    pub generated_at: DateTime<Utc>,
}

// ==========================================
// MonitorApi - 容器监控 API
// ==========================================
pub struct MonitorApi {
    conn: Arc<Mutex<Connection>>,
    locks: Arc<ContainerLockManager>,
    state_engine: ContainerStateEngine,
    alert_engine: AlertEngine,
    settlement_engine: SettlementEngine,
    container_repo: ContainerRepository,
    alert_repo: AlertRepository,
    reading_repo: ReadingRepository,
    company_repo: CompanyRepository,
}

impl MonitorApi {
    /// 创建监控 API
    ///
    /// # 参数
    /// - conn: 共享数据库连接
    /// - locks: 容器级互斥表 (与 CollectionApi 共用同一实例)
    /// - thresholds: 状态/告警阈值
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        locks: Arc<ContainerLockManager>,
        thresholds: MonitorThresholds,
    ) -> Self {
        let state_engine = ContainerStateEngine::new(thresholds);
        Self {
            container_repo: ContainerRepository::from_connection(conn.clone()),
            alert_repo: AlertRepository::from_connection(conn.clone()),
            reading_repo: ReadingRepository::from_connection(conn.clone()),
            company_repo: CompanyRepository::from_connection(conn.clone()),
            settlement_engine: SettlementEngine::new(state_engine.clone()),
            alert_engine: AlertEngine::new(thresholds),
            state_engine,
            locks,
            conn,
        }
    }

    // ==========================================
    // 读数
    // ==========================================

    /// 应用一条人工/外部读数
    ///
    /// # 返回
    /// - Ok(Some(reading)): 已记录的读数
    /// - Ok(None): 容器已停用, 未做任何修改
    pub fn apply_reading(
        &self,
        container_id: &str,
        weight_delta_kg: f64,
        temperature_c: f64,
    ) -> ApiResult<Option<SensorReading>> {
        let outcome = self.apply_sample(
            container_id,
            ReadingSample::new(weight_delta_kg, temperature_c),
            false,
        )?;
        Ok(outcome.map(|o| o.reading))
    }

    /// 应用一次采样: 更新容器 → 追加读数 → 评估告警, 同一事务内完成
    #[instrument(skip(self, sample), fields(container_id = %container_id))]
    pub fn apply_sample(
        &self,
        container_id: &str,
        sample: ReadingSample,
        simulated: bool,
    ) -> ApiResult<Option<ReadingOutcome>> {
        if !sample.weight_delta_kg.is_finite() || !sample.temperature_c.is_finite() {
            return Err(ApiError::InvalidInput(format!(
                "读数必须为有限数值: delta={}, temperature={}",
                sample.weight_delta_kg, sample.temperature_c
            )));
        }

        self.locks.with_container(container_id, || {
            run_in_transaction(&self.conn, |conn| {
                let mut container = ContainerRepository::get_in(conn, container_id)?;
                let now = Utc::now();

                let reading =
                    match self
                        .state_engine
                        .apply_sample(&mut container, sample, simulated, now)
                    {
                        Some(r) => r,
                        None => {
                            debug!("容器已停用, 忽略读数");
                            return Ok(None);
                        }
                    };

                ContainerRepository::update_state_in(conn, &container)?;
                ReadingRepository::insert_in(conn, &reading)?;
                let new_alerts = self.open_alerts_in(conn, &container)?;

                debug!(
                    weight_kg = container.current_weight_kg,
                    temperature_c = container.temperature_c,
                    status = %container.status,
                    new_alerts = new_alerts.len(),
                    "读数已应用"
                );

                Ok(Some(ReadingOutcome {
                    reading,
                    status: container.status,
                    new_alerts,
                }))
            })
        })
    }

    // ==========================================
    // 告警
    // ==========================================

    /// 对容器当前状态执行告警评估
    ///
    /// # 返回
    /// 本次新建的告警 (已存在同类型未解决告警的规则不产生新告警)
    pub fn evaluate_alerts(&self, container_id: &str) -> ApiResult<Vec<Alert>> {
        self.locks.with_container(container_id, || {
            run_in_transaction(&self.conn, |conn| {
                let container = ContainerRepository::get_in(conn, container_id)?;
                Ok(self.open_alerts_in(conn, &container)?)
            })
        })
    }

    /// 规则命中 → 去重 → 插入 (调用方持有容器锁与事务)
    fn open_alerts_in(&self, conn: &Connection, container: &Container) -> RepositoryResult<Vec<Alert>> {
        let mut created = Vec::new();
        for candidate in self.alert_engine.evaluate(container) {
            if AlertRepository::exists_open_in(conn, &container.container_id, candidate.alert_type)? {
                continue;
            }

            let alert = candidate.into_alert(&container.container_id);
            if AlertRepository::insert_if_absent_in(conn, &alert)? {
                info!(
                    container_id = %container.container_id,
                    alert_type = %alert.alert_type,
                    severity = %alert.severity,
                    "新建告警"
                );
                created.push(alert);
            }
        }
        Ok(created)
    }

    /// 解决单条告警
    ///
    /// # 错误
    /// - NotFound: 告警不存在
    /// - InvalidTransition: 告警已解决
    pub fn resolve_alert(&self, alert_id: &str, notes: &str) -> ApiResult<Alert> {
        let alert = self
            .alert_repo
            .find_by_id(alert_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Alert(id={})不存在", alert_id)))?;

        self.locks.with_container(&alert.container_id, || {
            run_in_transaction(&self.conn, |conn| {
                if !AlertRepository::resolve_in(conn, alert_id, Utc::now(), notes)? {
                    return Err(ApiError::invalid_transition("resolved", "resolved"));
                }
                info!(alert_id, container_id = %alert.container_id, "告警已解决");

                AlertRepository::find_in(conn, alert_id)?
                    .ok_or_else(|| ApiError::NotFound(format!("Alert(id={})不存在", alert_id)))
            })
        })
    }

    /// 批量解决容器的全部未解决告警
    ///
    /// # 返回
    /// 解决的数量
    pub fn resolve_all_open(&self, container_id: &str, notes: &str) -> ApiResult<usize> {
        self.locks.with_container(container_id, || {
            run_in_transaction(&self.conn, |conn| {
                ContainerRepository::get_in(conn, container_id)?;
                let count =
                    AlertRepository::resolve_all_open_in(conn, container_id, Utc::now(), notes)?;
                info!(container_id, count, "批量解决告警");
                Ok(count)
            })
        })
    }

    // ==========================================
    // 复位
    // ==========================================

    /// 复位容器: 重量归零, 状态 normal, 解决全部未解决告警
    pub fn reset_container(&self, container_id: &str) -> ApiResult<Container> {
        self.locks.with_container(container_id, || {
            run_in_transaction(&self.conn, |conn| {
                let mut container = ContainerRepository::get_in(conn, container_id)?;
                self.reset_in(conn, &mut container)?;
                Ok(container)
            })
        })
    }

    fn reset_in(&self, conn: &Connection, container: &mut Container) -> RepositoryResult<usize> {
        let now = Utc::now();
        let previous_weight = container.current_weight_kg;
        self.settlement_engine.reset(container, now);
        ContainerRepository::update_state_in(conn, container)?;
        let resolved =
            AlertRepository::resolve_all_open_in(conn, &container.container_id, now, RESET_NOTE)?;

        info!(
            container_id = %container.container_id,
            previous_weight_kg = previous_weight,
            resolved_alerts = resolved,
            "容器已复位"
        );
        Ok(resolved)
    }

    /// 复位所有已满容器 (自动恢复任务)
    ///
    /// # 返回
    /// 被复位的容器数量
    pub fn reset_full_containers(&self) -> ApiResult<usize> {
        let full = self.container_repo.list_by_status(ContainerStatus::Full)?;
        let mut count = 0;

        for candidate in full {
            let id = candidate.container_id;
            let reset = self.locks.with_container(&id, || {
                run_in_transaction(&self.conn, |conn| {
                    // 取锁期间状态可能已变化
                    let mut container = ContainerRepository::get_in(conn, &id)?;
                    if container.status != ContainerStatus::Full {
                        return Ok::<bool, ApiError>(false);
                    }
                    self.reset_in(conn, &mut container)?;
                    Ok(true)
                })
            })?;
            if reset {
                count += 1;
            }
        }

        if count > 0 {
            info!(count, "已满容器自动复位完成");
        }
        Ok(count)
    }

    // ==========================================
    // 手动状态
    // ==========================================

    /// 进入/解除维护
    ///
    /// 进入时新建 maintenance 告警; 解除时解决该告警并从占用率重新派生状态
    pub fn set_maintenance(&self, container_id: &str, enabled: bool) -> ApiResult<Container> {
        self.locks.with_container(container_id, || {
            run_in_transaction(&self.conn, |conn| {
                let mut container = ContainerRepository::get_in(conn, container_id)?;
                if !container.is_active {
                    return Err(ApiError::invalid_transition(
                        container.status,
                        if enabled { "maintenance" } else { "normal" },
                    ));
                }

                let now = Utc::now();
                self.state_engine.set_maintenance(&mut container, enabled, now);
                ContainerRepository::update_state_in(conn, &container)?;

                if enabled {
                    let alert = Alert::open(
                        container_id,
                        AlertType::Maintenance,
                        AlertSeverity::Low,
                        format!("容器 {} 进入维护", container_id),
                    );
                    AlertRepository::insert_if_absent_in(conn, &alert)?;
                } else {
                    AlertRepository::resolve_open_of_type_in(
                        conn,
                        container_id,
                        AlertType::Maintenance,
                        now,
                        MAINTENANCE_DONE_NOTE,
                    )?;
                }

                info!(container_id, enabled, status = %container.status, "维护状态切换");
                Ok(container)
            })
        })
    }

    /// 启用/停用容器
    pub fn set_active(&self, container_id: &str, active: bool) -> ApiResult<Container> {
        self.locks.with_container(container_id, || {
            run_in_transaction(&self.conn, |conn| {
                let mut container = ContainerRepository::get_in(conn, container_id)?;
                self.state_engine.set_active(&mut container, active, Utc::now());
                ContainerRepository::update_state_in(conn, &container)?;
                info!(container_id, active, status = %container.status, "启停状态切换");
                Ok(container)
            })
        })
    }

    // ==========================================
    // 开通 (外部流程)
    // ==========================================

    /// 登记企业
    pub fn register_company(&self, company: &Company) -> ApiResult<()> {
        if company.name.trim().is_empty() || company.cnpj.trim().is_empty() {
            return Err(ApiError::InvalidInput("企业名称与税号不能为空".to_string()));
        }
        self.company_repo.create(company)?;
        Ok(())
    }

    /// 登记容器
    ///
    /// 新容器一律以 重量 0 / 状态 normal 入库
    pub fn register_container(&self, container: Container) -> ApiResult<Container> {
        if container.container_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("容器编号不能为空".to_string()));
        }
        if !(container.capacity_kg > 0.0) || !container.capacity_kg.is_finite() {
            return Err(ApiError::InvariantViolation(format!(
                "容器容量必须为正数: {}",
                container.capacity_kg
            )));
        }
        if self.company_repo.find_by_id(&container.company_id)?.is_none() {
            return Err(ApiError::NotFound(format!(
                "Company(id={})不存在",
                container.company_id
            )));
        }

        let mut container = container;
        container.current_weight_kg = 0.0;
        container.status = ContainerStatus::Normal;
        container.last_reading_at = None;
        self.state_engine.recompute(&mut container);

        self.container_repo.create(&container)?;
        info!(container_id = %container.container_id, capacity_kg = container.capacity_kg, "容器已登记");
        Ok(container)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_container(&self, container_id: &str) -> ApiResult<Container> {
        self.container_repo
            .find_by_id(container_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Container(id={})不存在", container_id)))
    }

    pub fn list_containers(&self) -> ApiResult<Vec<Container>> {
        Ok(self.container_repo.list_all()?)
    }

    /// 需要安排收运的容器 (占用率 ≥ 80%)
    pub fn list_needing_collection(&self) -> ApiResult<Vec<Container>> {
        Ok(self
            .container_repo
            .list_active()?
            .into_iter()
            .filter(|c| c.needs_collection())
            .collect())
    }

    pub fn list_readings(&self, container_id: &str, limit: i64) -> ApiResult<Vec<SensorReading>> {
        if limit <= 0 {
            return Err(ApiError::InvalidInput(format!("limit 必须为正数: {}", limit)));
        }
        Ok(self.reading_repo.list_recent(container_id, limit)?)
    }

    pub fn list_alerts(&self, container_id: &str) -> ApiResult<Vec<Alert>> {
        Ok(self.alert_repo.list_by_container(container_id)?)
    }

    pub fn list_open_alerts(&self, container_id: &str) -> ApiResult<Vec<Alert>> {
        Ok(self.alert_repo.list_open_by_container(container_id)?)
    }

    /// 系统状态快照
    pub fn system_status(&self) -> ApiResult<SystemStatus> {
        let mut containers_by_status: BTreeMap<String, i64> = ContainerStatus::ALL
            .iter()
            .map(|s| (s.to_db_str().to_string(), 0))
            .collect();
        for (status, count) in self.container_repo.count_by_status()? {
            containers_by_status.insert(status.to_db_str().to_string(), count);
        }

        let mut open_alerts_by_severity: BTreeMap<String, i64> = AlertSeverity::ALL
            .iter()
            .map(|s| (s.to_db_str().to_string(), 0))
            .collect();
        for (severity, count) in self.alert_repo.count_open_by_severity()? {
            open_alerts_by_severity.insert(severity.to_db_str().to_string(), count);
        }

        let now = Utc::now();
        Ok(SystemStatus {
            total_containers: containers_by_status.values().sum(),
            containers_by_status,
            open_alerts: self.alert_repo.count_open()?,
            open_alerts_by_severity,
            readings_last_24h: self
                .reading_repo
                .count_since(now - Duration::hours(24), false)?,
            generated_at: now,
        })
    }
}
