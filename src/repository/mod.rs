// ==========================================
// 危废桶监控系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: `*_in(conn, ..)` 关联函数可在调用方事务内组合使用
// ==========================================

pub mod alert_repo;
pub mod collection_repo;
pub mod company_repo;
pub mod container_repo;
pub mod error;
pub mod reading_repo;

// 重导出核心仓储
pub use alert_repo::AlertRepository;
pub use collection_repo::CollectionRepository;
pub use company_repo::CompanyRepository;
pub use container_repo::ContainerRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use reading_repo::ReadingRepository;

use crate::db::TIMESTAMP_FORMAT;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// 在单个事务内执行 `f`
///
/// - 成功: 提交
/// - 失败: 事务随 drop 回滚, 调用方看不到部分写入
pub fn run_in_transaction<T, E, F>(conn: &Arc<Mutex<Connection>>, f: F) -> Result<T, E>
where
    E: From<RepositoryError>,
    F: FnOnce(&Connection) -> Result<T, E>,
{
    let guard = conn
        .lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))?;
    let tx = guard
        .unchecked_transaction()
        .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

    let out = f(&*tx)?;

    tx.commit()
        .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
    Ok(out)
}

/// 时间戳 → 存储字符串
pub(crate) fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// 存储字符串 → 时间戳（无法解析时回退到 UNIX 纪元）
pub(crate) fn parse_ts(raw: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

/// 解析枚举列; 未知取值视为数据损坏
pub(crate) fn parse_enum_column<T>(
    idx: usize,
    raw: &str,
    parser: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parser(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("未知枚举值: {}", raw).into(),
        )
    })
}
