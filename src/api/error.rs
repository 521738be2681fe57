// ==========================================
// BC 2.0 报关单查询系统 - API层错误类型
// ==========================================
// 职责: 区分客户端校验错误与系统错误，提供稳定错误码与本地化文案
// 约定: 系统错误对外只给通用文案，完整信息写日志
// ==========================================

use crate::engine::error::{MalformedReason, RuleError};
use crate::exporter::error::ExportError;
use crate::i18n::{t, t_with_args};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 规则校验错误（客户端）
    // ==========================================
    #[error("未知字段: {field}")]
    UnknownField { field: String },

    #[error("字段 {field} ({value_type}) 不支持运算符 {operator}")]
    InvalidOperator {
        field: String,
        operator: String,
        value_type: String,
    },

    #[error("规则树格式错误 ({path}): {reason}")]
    MalformedRuleTree {
        path: String,
        reason: MalformedReason,
    },

    #[error("空查询被拒绝")]
    EmptyQueryRejected,

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 访问控制
    // ==========================================
    #[error("未认证")]
    Unauthorized,

    #[error("无权访问: {0}")]
    Forbidden(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 系统错误
    // ==========================================
    #[error("数据访问失败: {0}")]
    DataAccessError(String),

    #[error("导出失败: {0}")]
    ExportFailed(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 稳定错误码（前端按错误码分支处理）
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::UnknownField { .. } => "UNKNOWN_FIELD",
            ApiError::InvalidOperator { .. } => "INVALID_OPERATOR",
            ApiError::MalformedRuleTree { .. } => "MALFORMED_RULE_TREE",
            ApiError::EmptyQueryRejected => "EMPTY_QUERY_REJECTED",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::DataAccessError(_) => "DATA_ACCESS_ERROR",
            ApiError::ExportFailed(_) => "EXPORT_FAILED",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否为客户端输入校验错误（HTTP 422）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ApiError::UnknownField { .. }
                | ApiError::InvalidOperator { .. }
                | ApiError::MalformedRuleTree { .. }
                | ApiError::EmptyQueryRejected
                | ApiError::InvalidInput(_)
        )
    }

    /// 是否为系统错误（对外隐藏细节）
    pub fn is_system_error(&self) -> bool {
        matches!(
            self,
            ApiError::DataAccessError(_)
                | ApiError::ExportFailed(_)
                | ApiError::InternalError(_)
        )
    }

    /// 当前语言下的用户可见文案
    pub fn localized_message(&self) -> String {
        match self {
            ApiError::UnknownField { field } => {
                t_with_args("query.unknown_field", &[("field", field)])
            }
            ApiError::InvalidOperator {
                field, operator, ..
            } => t_with_args(
                "query.invalid_operator",
                &[("field", field), ("operator", operator)],
            ),
            ApiError::MalformedRuleTree { path, reason } => {
                let args = reason.i18n_args();
                let borrowed: Vec<(&str, &str)> =
                    args.iter().map(|(k, v)| (*k, v.as_str())).collect();
                let reason_text = t_with_args(reason.i18n_key(), &borrowed);
                t_with_args(
                    "query.malformed",
                    &[("path", path), ("reason", &reason_text)],
                )
            }
            ApiError::EmptyQueryRejected => t("query.empty_query"),
            ApiError::InvalidInput(reason) => {
                t_with_args("common.invalid_input", &[("reason", reason)])
            }
            ApiError::Unauthorized => t("common.unauthorized"),
            ApiError::Forbidden(reason) => t_with_args("common.forbidden", &[("reason", reason)]),
            ApiError::NotFound(what) => t_with_args("common.not_found", &[("what", what)]),
            ApiError::ExportFailed(_) => t("common.export_failed"),
            ApiError::DataAccessError(_) | ApiError::InternalError(_) => {
                t("common.internal_error")
            }
        }
    }
}

// ==========================================
// 从 RuleError 转换
// ==========================================
impl From<RuleError> for ApiError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::UnknownField { field } => ApiError::UnknownField { field },
            RuleError::InvalidOperator {
                field,
                operator,
                value_type,
            } => ApiError::InvalidOperator {
                field,
                operator,
                value_type,
            },
            RuleError::MalformedRuleTree { path, reason } => {
                ApiError::MalformedRuleTree { path, reason }
            }
            RuleError::EmptyQueryRejected => ApiError::EmptyQueryRejected,
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
                ApiError::NotFound(format!("{}(id={})", entity, id))
            }
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::InvalidInput(msg),
            RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::ForeignKeyViolation(msg) => ApiError::DataAccessError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DataAccessError(format!("数据库锁获取失败: {}", msg))
            }
        }
    }
}

// ==========================================
// 从 ExportError 转换
// ==========================================
impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Repository(e) => ApiError::from(e),
            ExportError::UnsupportedFormat(ext) => {
                ApiError::InvalidInput(format!("输出格式不支持: {}", ext))
            }
            other => ApiError::ExportFailed(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{set_locale, tests::LOCALE_TEST_LOCK};

    #[test]
    fn test_rule_error_conversion_is_client_error() {
        let err: ApiError = RuleError::UnknownField {
            field: "foo".to_string(),
        }
        .into();
        assert!(err.is_client_error());
        assert_eq!(err.error_code(), "UNKNOWN_FIELD");

        let err: ApiError = RuleError::EmptyQueryRejected.into();
        assert_eq!(err.error_code(), "EMPTY_QUERY_REJECTED");
    }

    #[test]
    fn test_repository_error_is_system_error() {
        let err: ApiError = RepositoryError::DatabaseQueryError("no such table".into()).into();
        assert!(err.is_system_error());
        assert!(!err.is_client_error());
        assert_eq!(err.error_code(), "DATA_ACCESS_ERROR");

        let err: ApiError = ExportError::Repository(RepositoryError::LockError("x".into())).into();
        assert_eq!(err.error_code(), "DATA_ACCESS_ERROR");
    }

    #[test]
    fn test_repository_error_mapping() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "RuleSet".into(),
            id: "abc".into(),
        }
        .into();
        assert_eq!(err.error_code(), "NOT_FOUND");

        let err: ApiError =
            RepositoryError::UniqueConstraintViolation("rule_sets.name".into()).into();
        assert!(err.is_client_error());
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let err: ApiError = RepositoryError::ForeignKeyViolation("bc20_barang".into()).into();
        assert_eq!(err.error_code(), "DATA_ACCESS_ERROR");

        let err: ApiError =
            ExportError::Repository(RepositoryError::DatabaseQueryError("x".into())).into();
        assert!(err.is_system_error());
    }

    #[test]
    fn test_localized_messages_hide_system_detail() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");

        let err = ApiError::DataAccessError("SELECT * FROM secret".into());
        assert!(!err.localized_message().contains("secret"));

        let err: ApiError = RuleError::malformed(
            "rules[0]",
            MalformedReason::InvalidDate {
                value: "2024-13-01".into(),
            },
        )
        .into();
        let msg = err.localized_message();
        assert!(msg.contains("rules[0]"));
        assert!(msg.contains("2024-13-01"));

        set_locale("id");
    }
}
