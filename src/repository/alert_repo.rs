// ==========================================
// 危废桶监控系统 - 告警仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 兜底: uq_alert_open 部分唯一索引保证同一 (container_id, alert_type)
//       至多一条未解决告警; insert_if_absent_in 依赖它实现幂等插入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::alert::Alert;
use crate::domain::types::{AlertSeverity, AlertType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_enum_column, parse_ts};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    alert_id, container_id, alert_type, severity, description,
    resolved, resolved_at, resolution_notes, created_at
"#;

// ==========================================
// AlertRepository - 告警仓储
// ==========================================
pub struct AlertRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AlertRepository {
    /// 创建新的 AlertRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按告警ID查询
    pub fn find_by_id(&self, alert_id: &str) -> RepositoryResult<Option<Alert>> {
        let conn = self.get_conn()?;
        Self::find_in(&conn, alert_id)
    }

    /// 容器的全部告警（含已解决, 按创建时间倒序）
    pub fn list_by_container(&self, container_id: &str) -> RepositoryResult<Vec<Alert>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM alert WHERE container_id = ?1 ORDER BY created_at DESC, rowid DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let alerts = stmt
            .query_map(params![container_id], map_alert_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(alerts)
    }

    /// 容器的未解决告警
    pub fn list_open_by_container(&self, container_id: &str) -> RepositoryResult<Vec<Alert>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM alert WHERE container_id = ?1 AND resolved = 0 ORDER BY created_at ASC, rowid ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let alerts = stmt
            .query_map(params![container_id], map_alert_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(alerts)
    }

    /// 全部未解决告警数量
    pub fn count_open(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM alert WHERE resolved = 0", [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    /// 未解决告警按级别计数
    pub fn count_open_by_severity(&self) -> RepositoryResult<Vec<(AlertSeverity, i64)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT severity, COUNT(*) FROM alert WHERE resolved = 0 GROUP BY severity",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let raw: String = row.get(0)?;
                Ok((
                    parse_enum_column(0, &raw, AlertSeverity::from_str)?,
                    row.get::<_, i64>(1)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    // ==========================================
    // 事务内操作
    // ==========================================

    /// 事务内按告警ID查询
    pub fn find_in(conn: &Connection, alert_id: &str) -> RepositoryResult<Option<Alert>> {
        let sql = format!("SELECT {} FROM alert WHERE alert_id = ?1", SELECT_COLUMNS);
        let alert = conn
            .query_row(&sql, params![alert_id], map_alert_row)
            .optional()?;
        Ok(alert)
    }

    /// 是否存在同类型未解决告警（去重检查）
    pub fn exists_open_in(
        conn: &Connection,
        container_id: &str,
        alert_type: AlertType,
    ) -> RepositoryResult<bool> {
        let exists = conn
            .query_row(
                "SELECT 1 FROM alert WHERE container_id = ?1 AND alert_type = ?2 AND resolved = 0 LIMIT 1",
                params![container_id, alert_type.to_db_str()],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(exists)
    }

    /// 插入告警; 若同类型未解决告警已存在则忽略
    ///
    /// # 返回
    /// - Ok(true): 新建成功
    /// - Ok(false): 被 uq_alert_open 拦截（已有未解决告警）
    pub fn insert_if_absent_in(conn: &Connection, alert: &Alert) -> RepositoryResult<bool> {
        let affected = conn.execute(
            r#"
            INSERT OR IGNORE INTO alert (
                alert_id, container_id, alert_type, severity, description,
                resolved, resolved_at, resolution_notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                alert.alert_id,
                alert.container_id,
                alert.alert_type.to_db_str(),
                alert.severity.to_db_str(),
                alert.description,
                alert.resolved,
                alert.resolved_at.as_ref().map(fmt_ts),
                alert.resolution_notes,
                fmt_ts(&alert.created_at),
            ],
        )?;
        Ok(affected == 1)
    }

    /// 解决单条告警（仅当未解决）
    ///
    /// # 返回
    /// - Ok(true): 本次完成解决
    /// - Ok(false): 告警已被解决
    pub fn resolve_in(
        conn: &Connection,
        alert_id: &str,
        resolved_at: DateTime<Utc>,
        notes: &str,
    ) -> RepositoryResult<bool> {
        let affected = conn.execute(
            r#"
            UPDATE alert
            SET resolved = 1, resolved_at = ?2, resolution_notes = ?3
            WHERE alert_id = ?1 AND resolved = 0
            "#,
            params![alert_id, fmt_ts(&resolved_at), notes],
        )?;
        Ok(affected == 1)
    }

    /// 解决容器某一类型的未解决告警
    pub fn resolve_open_of_type_in(
        conn: &Connection,
        container_id: &str,
        alert_type: AlertType,
        resolved_at: DateTime<Utc>,
        notes: &str,
    ) -> RepositoryResult<usize> {
        let affected = conn.execute(
            r#"
            UPDATE alert
            SET resolved = 1, resolved_at = ?3, resolution_notes = ?4
            WHERE container_id = ?1 AND alert_type = ?2 AND resolved = 0
            "#,
            params![
                container_id,
                alert_type.to_db_str(),
                fmt_ts(&resolved_at),
                notes
            ],
        )?;
        Ok(affected)
    }

    /// 批量解决容器的全部未解决告警
    ///
    /// # 返回
    /// 解决的告警数量
    ///
    /// # 说明
    /// 单条 UPDATE 语句; 调用方负责包裹事务
    pub fn resolve_all_open_in(
        conn: &Connection,
        container_id: &str,
        resolved_at: DateTime<Utc>,
        notes: &str,
    ) -> RepositoryResult<usize> {
        let affected = conn.execute(
            r#"
            UPDATE alert
            SET resolved = 1, resolved_at = ?2, resolution_notes = ?3
            WHERE container_id = ?1 AND resolved = 0
            "#,
            params![container_id, fmt_ts(&resolved_at), notes],
        )?;
        Ok(affected)
    }
}

fn map_alert_row(row: &Row<'_>) -> SqliteResult<Alert> {
    let alert_type: String = row.get(2)?;
    let severity: String = row.get(3)?;
    let resolved_at: Option<String> = row.get(6)?;
    let created_at: String = row.get(8)?;

    Ok(Alert {
        alert_id: row.get(0)?,
        container_id: row.get(1)?,
        alert_type: parse_enum_column(2, &alert_type, AlertType::from_str)?,
        severity: parse_enum_column(3, &severity, AlertSeverity::from_str)?,
        description: row.get(4)?,
        resolved: row.get(5)?,
        resolved_at: resolved_at.as_deref().map(parse_ts),
        resolution_notes: row.get(7)?,
        created_at: parse_ts(&created_at),
    })
}
