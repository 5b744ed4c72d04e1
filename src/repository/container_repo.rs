// ==========================================
// 危废桶监控系统 - 容器数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 重量/状态的计算由容器状态机完成, 这里只负责持久化
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::container::Container;
use crate::domain::types::ContainerStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_enum_column, parse_ts};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    container_id, company_id, waste_type, install_address, latitude, longitude,
    installed_on, capacity_kg, current_weight_kg, temperature_c, status, is_active,
    last_reading_at, created_at, updated_at
"#;

// ==========================================
// ContainerRepository - 容器仓储
// ==========================================
/// 容器仓储
/// 职责: 管理 container 表的 CRUD 操作
pub struct ContainerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ContainerRepository {
    /// 创建新的 ContainerRepository 实例
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 连接级操作
    // ==========================================

    /// 新建容器（外部开通流程）
    pub fn create(&self, container: &Container) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_in(&conn, container)
    }

    /// 按容器编号查询
    ///
    /// # 返回
    /// - Ok(Some(Container)): 找到容器
    /// - Ok(None): 未找到
    /// - Err: 数据库错误
    pub fn find_by_id(&self, container_id: &str) -> RepositoryResult<Option<Container>> {
        let conn = self.get_conn()?;
        Self::find_in(&conn, container_id)
    }

    /// 查询全部容器
    pub fn list_all(&self) -> RepositoryResult<Vec<Container>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM container ORDER BY container_id ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let containers = stmt
            .query_map([], map_container_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(containers)
    }

    /// 查询启用中的容器（模拟器每个 tick 的处理对象）
    pub fn list_active(&self) -> RepositoryResult<Vec<Container>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM container WHERE is_active = 1 ORDER BY container_id ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let containers = stmt
            .query_map([], map_container_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(containers)
    }

    /// 按状态查询容器
    pub fn list_by_status(&self, status: ContainerStatus) -> RepositoryResult<Vec<Container>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM container WHERE status = ?1 ORDER BY container_id ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let containers = stmt
            .query_map(params![status.to_db_str()], map_container_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(containers)
    }

    /// 按企业查询容器
    pub fn list_by_company(&self, company_id: &str) -> RepositoryResult<Vec<Container>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM container WHERE company_id = ?1 ORDER BY container_id ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let containers = stmt
            .query_map(params![company_id], map_container_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(containers)
    }

    /// 各状态容器数量
    pub fn count_by_status(&self) -> RepositoryResult<Vec<(ContainerStatus, i64)>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM container GROUP BY status ORDER BY status")?;
        let rows = stmt
            .query_map([], |row| {
                let raw: String = row.get(0)?;
                Ok((
                    parse_enum_column(0, &raw, ContainerStatus::from_str)?,
                    row.get::<_, i64>(1)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    // ==========================================
    // 事务内操作
    // ==========================================

    /// 插入容器
    pub fn insert_in(conn: &Connection, container: &Container) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO container (
                container_id, company_id, waste_type, install_address, latitude, longitude,
                installed_on, capacity_kg, current_weight_kg, temperature_c, status, is_active,
                last_reading_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                container.container_id,
                container.company_id,
                container.waste_type,
                container.install_address,
                container.latitude,
                container.longitude,
                container.installed_on.format("%Y-%m-%d").to_string(),
                container.capacity_kg,
                container.current_weight_kg,
                container.temperature_c,
                container.status.to_db_str(),
                container.is_active,
                container.last_reading_at.as_ref().map(fmt_ts),
                fmt_ts(&container.created_at),
                fmt_ts(&container.updated_at),
            ],
        )?;
        Ok(())
    }

    /// 事务内按编号查询
    pub fn find_in(conn: &Connection, container_id: &str) -> RepositoryResult<Option<Container>> {
        let sql = format!("SELECT {} FROM container WHERE container_id = ?1", SELECT_COLUMNS);
        let container = conn
            .query_row(&sql, params![container_id], map_container_row)
            .optional()?;
        Ok(container)
    }

    /// 事务内按编号查询, 不存在时返回 NotFound
    pub fn get_in(conn: &Connection, container_id: &str) -> RepositoryResult<Container> {
        Self::find_in(conn, container_id)?
            .ok_or_else(|| RepositoryError::not_found("Container", container_id))
    }

    /// 写回状态机管理的字段（重量/温度/状态/启用/最近读数时间）
    pub fn update_state_in(conn: &Connection, container: &Container) -> RepositoryResult<()> {
        let affected = conn.execute(
            r#"
            UPDATE container
            SET current_weight_kg = ?2,
                temperature_c = ?3,
                status = ?4,
                is_active = ?5,
                last_reading_at = ?6,
                updated_at = ?7
            WHERE container_id = ?1
            "#,
            params![
                container.container_id,
                container.current_weight_kg,
                container.temperature_c,
                container.status.to_db_str(),
                container.is_active,
                container.last_reading_at.as_ref().map(fmt_ts),
                fmt_ts(&container.updated_at),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("Container", &container.container_id));
        }
        Ok(())
    }
}

/// 行映射
fn map_container_row(row: &Row<'_>) -> SqliteResult<Container> {
    let installed_on: String = row.get(6)?;
    let status: String = row.get(10)?;
    let last_reading_at: Option<String> = row.get(12)?;
    let created_at: String = row.get(13)?;
    let updated_at: String = row.get(14)?;

    Ok(Container {
        container_id: row.get(0)?,
        company_id: row.get(1)?,
        waste_type: row.get(2)?,
        install_address: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
        installed_on: NaiveDate::parse_from_str(&installed_on, "%Y-%m-%d").unwrap_or_default(),
        capacity_kg: row.get(7)?,
        current_weight_kg: row.get(8)?,
        temperature_c: row.get(9)?,
        status: parse_enum_column(10, &status, ContainerStatus::from_str)?,
        is_active: row.get(11)?,
        last_reading_at: last_reading_at.as_deref().map(parse_ts),
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}
