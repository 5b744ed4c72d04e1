// ==========================================
// 危废桶监控系统 - 产废企业仓储
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::company::Company;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_ts};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// 产废企业仓储
pub struct CompanyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CompanyRepository {
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

    /// 新建企业
    pub fn create(&self, company: &Company) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO company (company_id, name, cnpj, city, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                company.company_id,
                company.name,
                company.cnpj,
                company.city,
                company.is_active,
                fmt_ts(&company.created_at),
            ],
        )?;
        Ok(())
    }

    /// 按税号查询（种子数据幂等用）
    pub fn find_by_cnpj(&self, cnpj: &str) -> RepositoryResult<Option<Company>> {
        let conn = self.get_conn()?;
        let company = conn
            .query_row(
                "SELECT company_id, name, cnpj, city, is_active, created_at FROM company WHERE cnpj = ?1",
                params![cnpj],
                map_company_row,
            )
            .optional()?;
        Ok(company)
    }

    pub fn find_by_id(&self, company_id: &str) -> RepositoryResult<Option<Company>> {
        let conn = self.get_conn()?;
        let company = conn
            .query_row(
                "SELECT company_id, name, cnpj, city, is_active, created_at FROM company WHERE company_id = ?1",
                params![company_id],
                map_company_row,
            )
            .optional()?;
        Ok(company)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Company>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT company_id, name, cnpj, city, is_active, created_at FROM company ORDER BY name",
        )?;
        let companies = stmt
            .query_map([], map_company_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(companies)
    }
}

fn map_company_row(row: &Row<'_>) -> SqliteResult<Company> {
    let created_at: String = row.get(5)?;
    Ok(Company {
        company_id: row.get(0)?,
        name: row.get(1)?,
        cnpj: row.get(2)?,
        city: row.get(3)?,
        is_active: row.get(4)?,
        created_at: parse_ts(&created_at),
    })
}
