// ==========================================
// 危废桶监控系统 - 传感器读数仓储
// ==========================================
// 红线: 只追加, 不提供 update / delete
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::reading::SensorReading;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_ts};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ReadingRepository - 读数仓储
// ==========================================
pub struct ReadingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReadingRepository {
    /// 创建新的 ReadingRepository 实例
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

    /// 追加读数（事务内）
    pub fn insert_in(conn: &Connection, reading: &SensorReading) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO sensor_reading (
                reading_id, container_id, weight_kg, temperature_c, read_at, simulated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                reading.reading_id,
                reading.container_id,
                reading.weight_kg,
                reading.temperature_c,
                fmt_ts(&reading.read_at),
                reading.simulated,
            ],
        )?;
        Ok(())
    }

    /// 查询容器最近的读数（按时间倒序）
    ///
    /// # 参数
    /// - container_id: 容器编号
    /// - limit: 返回数量上限
    pub fn list_recent(
        &self,
        container_id: &str,
        limit: i64,
    ) -> RepositoryResult<Vec<SensorReading>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT reading_id, container_id, weight_kg, temperature_c, read_at, simulated
            FROM sensor_reading
            WHERE container_id = ?1
            ORDER BY read_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )?;

        let readings = stmt
            .query_map(params![container_id, limit], map_reading_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(readings)
    }

    /// 容器读数总数
    pub fn count_by_container(&self, container_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM sensor_reading WHERE container_id = ?1",
            params![container_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 指定时间之后的读数数量
    ///
    /// # 参数
    /// - since: 起始时间（含）
    /// - simulated_only: 只统计模拟读数
    pub fn count_since(&self, since: DateTime<Utc>, simulated_only: bool) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            r#"
            SELECT COUNT(*) FROM sensor_reading
            WHERE read_at >= ?1 AND (?2 = 0 OR simulated = 1)
            "#,
            params![fmt_ts(&since), simulated_only],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn map_reading_row(row: &Row<'_>) -> SqliteResult<SensorReading> {
    let read_at: String = row.get(4)?;
    Ok(SensorReading {
        reading_id: row.get(0)?,
        container_id: row.get(1)?,
        weight_kg: row.get(2)?,
        temperature_c: row.get(3)?,
        read_at: parse_ts(&read_at),
        simulated: row.get(5)?,
    })
}
