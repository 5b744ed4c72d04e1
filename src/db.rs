// ==========================================
// 危废桶监控系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为 (外键 + busy_timeout)
// - 统一建库脚本, 幂等执行
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式 (UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 建库脚本
///
/// 说明：
/// - uq_alert_open 为告警去重的存储层兜底: 同一 (container_id, alert_type)
///   只允许一条 resolved = 0 的记录
/// - sensor_reading / alert 随容器级联删除
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_scope (
    scope_id TEXT PRIMARY KEY,
    scope_type TEXT NOT NULL,
    scope_key TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(scope_type, scope_key)
);

INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
VALUES ('global', 'GLOBAL', 'global');

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS company (
    company_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    cnpj TEXT NOT NULL UNIQUE,
    city TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS container (
    container_id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES company(company_id) ON DELETE CASCADE,
    waste_type TEXT NOT NULL,
    install_address TEXT NOT NULL DEFAULT '',
    latitude REAL NOT NULL DEFAULT 0,
    longitude REAL NOT NULL DEFAULT 0,
    installed_on TEXT NOT NULL,
    capacity_kg REAL NOT NULL CHECK (capacity_kg > 0),
    current_weight_kg REAL NOT NULL DEFAULT 0,
    temperature_c REAL NOT NULL DEFAULT 25,
    status TEXT NOT NULL DEFAULT 'normal',
    is_active INTEGER NOT NULL DEFAULT 1,
    last_reading_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_container_company ON container(company_id);
CREATE INDEX IF NOT EXISTS idx_container_status ON container(status);

CREATE TABLE IF NOT EXISTS sensor_reading (
    reading_id TEXT PRIMARY KEY,
    container_id TEXT NOT NULL REFERENCES container(container_id) ON DELETE CASCADE,
    weight_kg REAL NOT NULL,
    temperature_c REAL NOT NULL,
    read_at TEXT NOT NULL,
    simulated INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_reading_container_time
    ON sensor_reading(container_id, read_at DESC);

CREATE TABLE IF NOT EXISTS alert (
    alert_id TEXT PRIMARY KEY,
    container_id TEXT NOT NULL REFERENCES container(container_id) ON DELETE CASCADE,
    alert_type TEXT NOT NULL,
    severity TEXT NOT NULL,
    description TEXT NOT NULL,
    resolved INTEGER NOT NULL DEFAULT 0,
    resolved_at TEXT,
    resolution_notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_alert_container ON alert(container_id);
CREATE INDEX IF NOT EXISTS idx_alert_resolved ON alert(resolved);
CREATE UNIQUE INDEX IF NOT EXISTS uq_alert_open
    ON alert(container_id, alert_type) WHERE resolved = 0;

CREATE TABLE IF NOT EXISTS collection (
    collection_id TEXT PRIMARY KEY,
    container_id TEXT NOT NULL REFERENCES container(container_id) ON DELETE CASCADE,
    operator_id TEXT,
    collected_at TEXT NOT NULL,
    collected_weight_kg REAL NOT NULL CHECK (collected_weight_kg > 0),
    destination TEXT NOT NULL,
    destination_company TEXT,
    manifest_number TEXT,
    notes TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    settlement_state TEXT NOT NULL DEFAULT 'pending',
    settled_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_collection_container ON collection(container_id);
CREATE INDEX IF NOT EXISTS idx_collection_status ON collection(status);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）并登记 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
