// ==========================================
// 危废桶监控系统 - 收运 API
// ==========================================
// 职责: 收运登记 / 状态流转 / 结算扣重
// 规则:
//   - 扣重只在进入 completed 的边沿触发一次 (settlement_state 记录)
//   - 以 completed 直接登记的收运记为 waived, 永不扣重
//   - completed / cancelled 为终态, 不允许迁出
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::container_lock::ContainerLockManager;
use crate::domain::collection::{Collection, NewCollection};
use crate::domain::container::Container;
use crate::domain::types::{CollectionStatus, SettlementState};
use crate::engine::SettlementEngine;
use crate::repository::{run_in_transaction, CollectionRepository, ContainerRepository};

// ==========================================
// CollectionApi - 收运 API
// ==========================================
pub struct CollectionApi {
    conn: Arc<Mutex<Connection>>,
    locks: Arc<ContainerLockManager>,
    settlement_engine: SettlementEngine,
    collection_repo: CollectionRepository,
}

impl CollectionApi {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        locks: Arc<ContainerLockManager>,
        settlement_engine: SettlementEngine,
    ) -> Self {
        Self {
            collection_repo: CollectionRepository::from_connection(conn.clone()),
            settlement_engine,
            locks,
            conn,
        }
    }

    /// 登记收运
    ///
    /// # 错误
    /// - NotFound: 容器不存在
    /// - InvariantViolation: 收运重量 ≤ 0 或超过容器当前重量
    #[instrument(skip(self, request), fields(container_id = %request.container_id))]
    pub fn create_collection(&self, request: NewCollection) -> ApiResult<Collection> {
        if request.destination.trim().is_empty() {
            return Err(ApiError::InvalidInput("收运去向不能为空".to_string()));
        }

        let container_id = request.container_id.clone();
        self.locks.with_container(&container_id, || {
            run_in_transaction(&self.conn, |conn| {
                let container = ContainerRepository::get_in(conn, &container_id)?;
                self.settlement_engine
                    .check_collectable(&container, request.collected_weight_kg)?;

                let now = Utc::now();
                let settlement_state = if request.status == CollectionStatus::Completed {
                    SettlementState::Waived
                } else {
                    SettlementState::Pending
                };

                let collection = Collection {
                    collection_id: Uuid::new_v4().to_string(),
                    container_id: request.container_id,
                    operator_id: request.operator_id,
                    collected_at: request.collected_at,
                    collected_weight_kg: request.collected_weight_kg,
                    destination: request.destination,
                    destination_company: request.destination_company,
                    manifest_number: request.manifest_number,
                    notes: request.notes,
                    status: request.status,
                    settlement_state,
                    settled_at: None,
                    created_at: now,
                    updated_at: now,
                };
                CollectionRepository::insert_in(conn, &collection)?;

                info!(
                    collection_id = %collection.collection_id,
                    collected_weight_kg = collection.collected_weight_kg,
                    status = %collection.status,
                    settlement_state = %collection.settlement_state,
                    "收运已登记"
                );
                Ok(collection)
            })
        })
    }

    /// 收运状态流转
    ///
    /// 进入 completed 时在容器独占区内重新校验重量并结算, 与状态更新同一事务
    ///
    /// # 错误
    /// - NotFound: 收运记录不存在
    /// - InvalidTransition: 从 completed / cancelled 迁出
    /// - InvariantViolation: 完成时收运重量超过容器当前重量
    pub fn transition_collection(
        &self,
        collection_id: &str,
        next: CollectionStatus,
    ) -> ApiResult<Collection> {
        let container_id = self.container_of(collection_id)?;

        self.locks.with_container(&container_id, || {
            run_in_transaction(&self.conn, |conn| {
                let collection = CollectionRepository::get_in(conn, collection_id)?;
                let previous = collection.status;

                if previous == next {
                    return Ok(collection);
                }
                if previous.is_terminal() {
                    return Err(ApiError::invalid_transition(previous, next));
                }

                let now = Utc::now();
                if SettlementEngine::is_settlement_edge(previous, next) {
                    let container = ContainerRepository::get_in(conn, &container_id)?;
                    self.settlement_engine
                        .check_collectable(&container, collection.collected_weight_kg)?;

                    CollectionRepository::update_status_in(conn, collection_id, next, now)?;
                    let completed = CollectionRepository::get_in(conn, collection_id)?;
                    self.settle_in(conn, &completed)?;
                } else {
                    CollectionRepository::update_status_in(conn, collection_id, next, now)?;
                }

                info!(collection_id, from = %previous, to = %next, "收运状态流转");
                Ok(CollectionRepository::get_in(conn, collection_id)?)
            })
        })
    }

    /// 结算已完成的收运
    ///
    /// 已结算 (applied / waived) 时不再扣重, 直接返回容器当前状态
    ///
    /// # 错误
    /// - NotFound: 收运记录或容器不存在
    /// - InvalidTransition: 收运未处于 completed
    pub fn settle_collection(&self, collection_id: &str) -> ApiResult<Container> {
        let container_id = self.container_of(collection_id)?;

        self.locks.with_container(&container_id, || {
            run_in_transaction(&self.conn, |conn| {
                let collection = CollectionRepository::get_in(conn, collection_id)?;
                if collection.status != CollectionStatus::Completed {
                    return Err(ApiError::invalid_transition(collection.status, "settled"));
                }
                self.settle_in(conn, &collection)
            })
        })
    }

    /// 扣重并标记结算 (调用方持有容器锁与事务)
    fn settle_in(&self, conn: &Connection, collection: &Collection) -> ApiResult<Container> {
        let mut container = ContainerRepository::get_in(conn, &collection.container_id)?;
        if collection.settlement_state != SettlementState::Pending {
            return Ok(container);
        }

        let now = Utc::now();
        let outcome =
            self.settlement_engine
                .settle(&mut container, collection.collected_weight_kg, now);
        ContainerRepository::update_state_in(conn, &container)?;

        if !CollectionRepository::mark_settlement_in(
            conn,
            &collection.collection_id,
            SettlementState::Applied,
            now,
        )? {
            // 读到 pending 后被并发标记: 回滚本次扣重
            return Err(ApiError::invalid_transition(
                collection.settlement_state,
                SettlementState::Applied,
            ));
        }

        info!(
            collection_id = %collection.collection_id,
            container_id = %container.container_id,
            deducted_kg = outcome.deducted_kg,
            weight_kg = container.current_weight_kg,
            status = %container.status,
            "收运结算完成"
        );
        Ok(container)
    }

    fn container_of(&self, collection_id: &str) -> ApiResult<String> {
        self.collection_repo
            .find_by_id(collection_id)?
            .map(|c| c.container_id)
            .ok_or_else(|| ApiError::NotFound(format!("Collection(id={})不存在", collection_id)))
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_collection(&self, collection_id: &str) -> ApiResult<Collection> {
        self.collection_repo
            .find_by_id(collection_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Collection(id={})不存在", collection_id)))
    }

    pub fn list_collections(&self, container_id: &str) -> ApiResult<Vec<Collection>> {
        Ok(self.collection_repo.list_by_container(container_id)?)
    }
}
