// ==========================================
// 危废桶监控系统 - 收运仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 状态边沿检测与扣重由 API 层在事务内编排
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::collection::Collection;
use crate::domain::types::{CollectionStatus, SettlementState};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_enum_column, parse_ts};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    collection_id, container_id, operator_id, collected_at, collected_weight_kg,
    destination, destination_company, manifest_number, notes,
    status, settlement_state, settled_at, created_at, updated_at
"#;

// ==========================================
// CollectionRepository - 收运仓储
// ==========================================
pub struct CollectionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CollectionRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按收运ID查询
    pub fn find_by_id(&self, collection_id: &str) -> RepositoryResult<Option<Collection>> {
        let conn = self.get_conn()?;
        Self::find_in(&conn, collection_id)
    }

    /// 容器的收运记录（按收运时间倒序）
    pub fn list_by_container(&self, container_id: &str) -> RepositoryResult<Vec<Collection>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM collection WHERE container_id = ?1 ORDER BY collected_at DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let collections = stmt
            .query_map(params![container_id], map_collection_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(collections)
    }

    // ==========================================
    // 事务内操作
    // ==========================================

    pub fn insert_in(conn: &Connection, collection: &Collection) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO collection (
                collection_id, container_id, operator_id, collected_at, collected_weight_kg,
                destination, destination_company, manifest_number, notes,
                status, settlement_state, settled_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                collection.collection_id,
                collection.container_id,
                collection.operator_id,
                fmt_ts(&collection.collected_at),
                collection.collected_weight_kg,
                collection.destination,
                collection.destination_company,
                collection.manifest_number,
                collection.notes,
                collection.status.to_db_str(),
                collection.settlement_state.to_db_str(),
                collection.settled_at.as_ref().map(fmt_ts),
                fmt_ts(&collection.created_at),
                fmt_ts(&collection.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_in(conn: &Connection, collection_id: &str) -> RepositoryResult<Option<Collection>> {
        let sql = format!(
            "SELECT {} FROM collection WHERE collection_id = ?1",
            SELECT_COLUMNS
        );
        let collection = conn
            .query_row(&sql, params![collection_id], map_collection_row)
            .optional()?;
        Ok(collection)
    }

    pub fn get_in(conn: &Connection, collection_id: &str) -> RepositoryResult<Collection> {
        Self::find_in(conn, collection_id)?
            .ok_or_else(|| RepositoryError::not_found("Collection", collection_id))
    }

    /// 更新收运状态
    pub fn update_status_in(
        conn: &Connection,
        collection_id: &str,
        status: CollectionStatus,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let affected = conn.execute(
            "UPDATE collection SET status = ?2, updated_at = ?3 WHERE collection_id = ?1",
            params![collection_id, status.to_db_str(), fmt_ts(&updated_at)],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Collection", collection_id));
        }
        Ok(())
    }

    /// 记录结算结果（仅从 pending 迁出, 防止重复扣重）
    ///
    /// # 返回
    /// - Ok(true): 本次完成标记
    /// - Ok(false): 已经结算过
    pub fn mark_settlement_in(
        conn: &Connection,
        collection_id: &str,
        state: SettlementState,
        settled_at: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let affected = conn.execute(
            r#"
            UPDATE collection
            SET settlement_state = ?2, settled_at = ?3, updated_at = ?3
            WHERE collection_id = ?1 AND settlement_state = 'pending'
            "#,
            params![collection_id, state.to_db_str(), fmt_ts(&settled_at)],
        )?;
        Ok(affected == 1)
    }
}

fn map_collection_row(row: &Row<'_>) -> SqliteResult<Collection> {
    let collected_at: String = row.get(3)?;
    let status: String = row.get(9)?;
    let settlement_state: String = row.get(10)?;
    let settled_at: Option<String> = row.get(11)?;
    let created_at: String = row.get(12)?;
    let updated_at: String = row.get(13)?;

    Ok(Collection {
        collection_id: row.get(0)?,
        container_id: row.get(1)?,
        operator_id: row.get(2)?,
        collected_at: parse_ts(&collected_at),
        collected_weight_kg: row.get(4)?,
        destination: row.get(5)?,
        destination_company: row.get(6)?,
        manifest_number: row.get(7)?,
        notes: row.get(8)?,
        status: parse_enum_column(9, &status, CollectionStatus::from_str)?,
        settlement_state: parse_enum_column(10, &settlement_state, SettlementState::from_str)?,
        settled_at: settled_at.as_deref().map(parse_ts),
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}
