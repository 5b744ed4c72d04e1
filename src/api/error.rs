// ==========================================
// 危废桶监控系统 - API层错误类型
// ==========================================
// 职责: 定义调用方可见的错误分类, 转换 Repository 错误
// 分类: NotFound / InvalidTransition / InvariantViolation + 数据访问错误
// 约定: 内部不重试, 所有操作可安全重复调用
// ==========================================

use crate::engine::settlement::CollectViolation;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 容器/告警/收运记录不存在
    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 结算未完成的收运、重复解决告警、离开终态等
    #[error("无效的状态转换: from={from} to={to}")]
    InvalidTransition { from: String, to: String },

    /// 收运重量 > 容器重量、非正重量/容量等
    #[error("不变量违反: {0}")]
    InvariantViolation(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        ApiError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<CollectViolation> for ApiError {
    fn from(err: CollectViolation) -> Self {
        ApiError::InvariantViolation(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
