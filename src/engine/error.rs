// ==========================================
// BC 2.0 报关单查询系统 - 规则引擎错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: 全部为客户端输入校验错误，在任何 SQL 执行之前返回
// ==========================================

use thiserror::Error;

/// 规则树校验/编译错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
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

    #[error("空查询被拒绝: 至少需要一个条件")]
    EmptyQueryRejected,
}

impl RuleError {
    pub fn malformed(path: impl Into<String>, reason: MalformedReason) -> Self {
        RuleError::MalformedRuleTree {
            path: path.into(),
            reason,
        }
    }
}

/// 规则树格式错误原因
///
/// 每个原因对应 locales 中 `rule.*` 下的一条文案。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedReason {
    #[error("必须是对象")]
    NotObject,

    #[error("缺少键 '{key}'")]
    MissingKey { key: String },

    #[error("键 '{key}' 必须是字符串")]
    NotString { key: String },

    #[error("'rules' 必须是数组")]
    RulesNotArray,

    #[error("无效的组合方式 '{value}'（仅支持 and/or）")]
    InvalidCombinator { value: String },

    #[error("'not' 必须是布尔值")]
    InvalidNotFlag,

    #[error("缺少条件值")]
    MissingValue,

    #[error("'{value}' 不是数字")]
    InvalidNumber { value: String },

    #[error("'{value}' 不是日期 (YYYY-MM-DD)")]
    InvalidDate { value: String },

    #[error("'{value}' 不在可选值 {allowed} 中")]
    EnumNotAllowed { value: String, allowed: String },

    #[error("值列表不能为空")]
    EmptyList,

    #[error("between 需要恰好 2 个值，实际 {count} 个")]
    BetweenArity { count: usize },

    #[error("不支持的值类型: {value}")]
    UnsupportedValue { value: String },

    #[error("JSON 解析失败: {detail}")]
    InvalidJson { detail: String },

    #[error("分组嵌套超过上限 {max}")]
    TooDeep { max: usize },
}

impl MalformedReason {
    /// 本地化文案 key
    pub fn i18n_key(&self) -> &'static str {
        match self {
            MalformedReason::NotObject => "rule.not_object",
            MalformedReason::MissingKey { .. } => "rule.missing_key",
            MalformedReason::NotString { .. } => "rule.not_string",
            MalformedReason::RulesNotArray => "rule.rules_not_array",
            MalformedReason::InvalidCombinator { .. } => "rule.invalid_combinator",
            MalformedReason::InvalidNotFlag => "rule.invalid_not_flag",
            MalformedReason::MissingValue => "rule.missing_value",
            MalformedReason::InvalidNumber { .. } => "rule.invalid_number",
            MalformedReason::InvalidDate { .. } => "rule.invalid_date",
            MalformedReason::EnumNotAllowed { .. } => "rule.enum_not_allowed",
            MalformedReason::EmptyList => "rule.empty_list",
            MalformedReason::BetweenArity { .. } => "rule.between_arity",
            MalformedReason::UnsupportedValue { .. } => "rule.unsupported_value",
            MalformedReason::InvalidJson { .. } => "rule.invalid_json",
            MalformedReason::TooDeep { .. } => "rule.too_deep",
        }
    }

    /// 本地化文案占位符参数
    pub fn i18n_args(&self) -> Vec<(&'static str, String)> {
        match self {
            MalformedReason::MissingKey { key } | MalformedReason::NotString { key } => {
                vec![("key", key.clone())]
            }
            MalformedReason::InvalidCombinator { value }
            | MalformedReason::InvalidNumber { value }
            | MalformedReason::InvalidDate { value }
            | MalformedReason::UnsupportedValue { value } => vec![("value", value.clone())],
            MalformedReason::EnumNotAllowed { value, allowed } => {
                vec![("value", value.clone()), ("allowed", allowed.clone())]
            }
            MalformedReason::BetweenArity { count } => vec![("count", count.to_string())],
            MalformedReason::InvalidJson { detail } => vec![("detail", detail.clone())],
            MalformedReason::TooDeep { max } => vec![("max", max.to_string())],
            MalformedReason::NotObject
            | MalformedReason::RulesNotArray
            | MalformedReason::InvalidNotFlag
            | MalformedReason::MissingValue
            | MalformedReason::EmptyList => Vec::new(),
        }
    }
}

/// Result 类型别名
pub type RuleResult<T> = Result<T, RuleError>;
