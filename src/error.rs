//! 统一错误模型
//! 定义所有错误类型与降级策略

use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Resource not found")]
    NotFound,

    /// 用户发起的变更缺少变更事由
    #[error("A change reason is required")]
    ReasonRequired,

    /// 领域校验失败，携带全部违规项而不仅是第一条
    #[error("Invalid input: {}", .0.join("; "))]
    InvalidInput(Vec<String>),

    /// 审计值无法序列化。只中止对应字段的记录，不回滚主变更
    #[error("Failed to encode audit value: {0}")]
    Encode(String),

    /// 审计存储写入失败。与 Encode 相同的非致命处理
    #[error("Audit store unavailable: {0}")]
    AuditUnavailable(String),
}

impl AppError {
    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "Database error occurred".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            AppError::NotFound => "Resource not found".to_string(),
            AppError::ReasonRequired => "A change reason is required".to_string(),
            AppError::InvalidInput(violations) => violations.join("\n"),
            AppError::Encode(_) => "Failed to record change history".to_string(),
            AppError::AuditUnavailable(_) => "Failed to record change history".to_string(),
        }
    }

    /// 是否属于记录审计阶段可降级为警告的错误
    pub fn is_audit_warning(&self) -> bool {
        matches!(self, AppError::Encode(_) | AppError::AuditUnavailable(_))
    }
}

/// 从 String 转换为 AppError::Config
impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Config(s)
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}
