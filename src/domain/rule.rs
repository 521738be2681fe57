// ==========================================
// BC 2.0 报关单查询系统 - 规则树
// ==========================================
// 输入格式: react-querybuilder 风格 JSON
//   { "combinator": "and", "not": false, "rules": [ {field, operator, value} | group ] }
// 约定: 节点含 `rules` 键即为分组，否则为条件；多余键（id/valueSource 等）忽略
// ==========================================

use crate::engine::error::{MalformedReason, RuleError, RuleResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 分组最大嵌套深度
pub const MAX_DEPTH: usize = 32;

// ==========================================
// Combinator - 组合方式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn parse(s: &str) -> Option<Combinator> {
        match s.trim().to_lowercase().as_str() {
            "and" => Some(Combinator::And),
            "or" => Some(Combinator::Or),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

// ==========================================
// Operator - 条件运算符
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Gt,
    Lte,
    Gte,
    Contains,
    BeginsWith,
    EndsWith,
    DoesNotContain,
    DoesNotBeginWith,
    DoesNotEndWith,
    In,
    NotIn,
    Between,
    NotBetween,
    Null,
    NotNull,
}

impl Operator {
    pub const ALL: [Operator; 18] = [
        Operator::Eq,
        Operator::NotEq,
        Operator::Lt,
        Operator::Gt,
        Operator::Lte,
        Operator::Gte,
        Operator::Contains,
        Operator::BeginsWith,
        Operator::EndsWith,
        Operator::DoesNotContain,
        Operator::DoesNotBeginWith,
        Operator::DoesNotEndWith,
        Operator::In,
        Operator::NotIn,
        Operator::Between,
        Operator::NotBetween,
        Operator::Null,
        Operator::NotNull,
    ];

    /// 解析运算符（符号原样匹配，单词不区分大小写）
    pub fn parse(s: &str) -> Option<Operator> {
        let s = s.trim();
        match s {
            "=" | "==" => return Some(Operator::Eq),
            "!=" | "<>" => return Some(Operator::NotEq),
            "<" => return Some(Operator::Lt),
            ">" => return Some(Operator::Gt),
            "<=" => return Some(Operator::Lte),
            ">=" => return Some(Operator::Gte),
            _ => {}
        }
        match s.to_lowercase().as_str() {
            "contains" => Some(Operator::Contains),
            "beginswith" => Some(Operator::BeginsWith),
            "endswith" => Some(Operator::EndsWith),
            "doesnotcontain" => Some(Operator::DoesNotContain),
            "doesnotbeginwith" => Some(Operator::DoesNotBeginWith),
            "doesnotendwith" => Some(Operator::DoesNotEndWith),
            "in" => Some(Operator::In),
            "notin" => Some(Operator::NotIn),
            "between" => Some(Operator::Between),
            "notbetween" => Some(Operator::NotBetween),
            "null" => Some(Operator::Null),
            "notnull" => Some(Operator::NotNull),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Gte => ">=",
            Operator::Contains => "contains",
            Operator::BeginsWith => "beginsWith",
            Operator::EndsWith => "endsWith",
            Operator::DoesNotContain => "doesNotContain",
            Operator::DoesNotBeginWith => "doesNotBeginWith",
            Operator::DoesNotEndWith => "doesNotEndWith",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Between => "between",
            Operator::NotBetween => "notBetween",
            Operator::Null => "null",
            Operator::NotNull => "notNull",
        }
    }

    /// 是否无需条件值
    pub fn is_unary(&self) -> bool {
        matches!(self, Operator::Null | Operator::NotNull)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 规则树节点
// ==========================================

/// 条件节点
///
/// 运算符保留原始字符串，由编译器结合字段类型校验。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

/// 规则树节点：分组或条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleNode {
    Group(RuleGroup),
    Condition(Condition),
}

/// 规则分组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleGroup {
    pub combinator: Combinator,
    #[serde(default)]
    pub not: bool,
    pub rules: Vec<RuleNode>,
}

impl RuleGroup {
    /// 空 AND 分组
    pub fn empty() -> Self {
        Self {
            combinator: Combinator::And,
            not: false,
            rules: Vec::new(),
        }
    }

    /// 从客户端 JSON 解析规则树
    ///
    /// # 错误
    /// - MalformedRuleTree: 路径形如 `rules[1].rules[0].field`，根节点路径为 `$`
    pub fn from_json(value: &Value) -> RuleResult<RuleGroup> {
        parse_group(value, "$", 0)
    }

    /// 从 JSON 文本解析（规则集持久化读取）
    pub fn from_json_str(raw: &str) -> RuleResult<RuleGroup> {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            RuleError::malformed(
                "$",
                MalformedReason::InvalidJson {
                    detail: e.to_string(),
                },
            )
        })?;
        Self::from_json(&value)
    }

    /// 序列化回客户端 JSON 形状
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// 任意深度均无条件节点时为空
    pub fn is_empty(&self) -> bool {
        self.condition_count() == 0
    }

    /// 条件节点总数（递归）
    pub fn condition_count(&self) -> usize {
        self.rules
            .iter()
            .map(|node| match node {
                RuleNode::Group(g) => g.condition_count(),
                RuleNode::Condition(_) => 1,
            })
            .sum()
    }
}

// ==========================================
// JSON 解析（带路径的错误定位）
// ==========================================

fn child_path(parent: &str, segment: &str) -> String {
    if parent == "$" {
        segment.to_string()
    } else {
        format!("{}.{}", parent, segment)
    }
}

fn as_object<'a>(value: &'a Value, path: &str) -> RuleResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| RuleError::malformed(path, MalformedReason::NotObject))
}

fn parse_group(value: &Value, path: &str, depth: usize) -> RuleResult<RuleGroup> {
    if depth >= MAX_DEPTH {
        return Err(RuleError::malformed(
            path,
            MalformedReason::TooDeep { max: MAX_DEPTH },
        ));
    }

    let obj = as_object(value, path)?;

    // combinator 缺省为 and
    let combinator = match obj.get("combinator") {
        None | Some(Value::Null) => Combinator::And,
        Some(Value::String(s)) => Combinator::parse(s).ok_or_else(|| {
            RuleError::malformed(
                child_path(path, "combinator"),
                MalformedReason::InvalidCombinator { value: s.clone() },
            )
        })?,
        Some(other) => {
            return Err(RuleError::malformed(
                child_path(path, "combinator"),
                MalformedReason::InvalidCombinator {
                    value: other.to_string(),
                },
            ))
        }
    };

    let not = match obj.get("not") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            return Err(RuleError::malformed(
                child_path(path, "not"),
                MalformedReason::InvalidNotFlag,
            ))
        }
    };

    let rules_path = child_path(path, "rules");
    let raw_rules = match obj.get("rules") {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(RuleError::malformed(
                rules_path,
                MalformedReason::RulesNotArray,
            ))
        }
        None => {
            return Err(RuleError::malformed(
                path,
                MalformedReason::MissingKey {
                    key: "rules".to_string(),
                },
            ))
        }
    };

    let mut rules = Vec::with_capacity(raw_rules.len());
    for (i, item) in raw_rules.iter().enumerate() {
        let item_path = format!("{}[{}]", rules_path, i);
        let item_obj = as_object(item, &item_path)?;
        if item_obj.contains_key("rules") {
            rules.push(RuleNode::Group(parse_group(item, &item_path, depth + 1)?));
        } else {
            rules.push(RuleNode::Condition(parse_condition(item_obj, &item_path)?));
        }
    }

    Ok(RuleGroup {
        combinator,
        not,
        rules,
    })
}

fn required_string(obj: &Map<String, Value>, key: &str, path: &str) -> RuleResult<String> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        None | Some(Value::Null) => Err(RuleError::malformed(
            path,
            MalformedReason::MissingKey {
                key: key.to_string(),
            },
        )),
        Some(_) => Err(RuleError::malformed(
            child_path(path, key),
            MalformedReason::NotString {
                key: key.to_string(),
            },
        )),
    }
}

fn parse_condition(obj: &Map<String, Value>, path: &str) -> RuleResult<Condition> {
    let field = required_string(obj, "field", path)?;
    let operator = required_string(obj, "operator", path)?;
    let value = obj.get("value").cloned().unwrap_or(Value::Null);

    // 仅 null/notNull 允许缺省 value；运算符本身的合法性由编译器判定
    let unary = Operator::parse(&operator)
        .map(|op| op.is_unary())
        .unwrap_or(false);
    if !unary && !obj.contains_key("value") {
        return Err(RuleError::malformed(path, MalformedReason::MissingValue));
    }

    Ok(Condition {
        field,
        operator,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nested_tree_ignores_extra_keys() {
        let raw = json!({
            "id": "root",
            "combinator": "OR",
            "rules": [
                {"id": "r1", "field": "kodejalur", "operator": "=", "value": "M", "valueSource": "value"},
                {"combinator": "and", "not": true, "rules": [
                    {"field": "kodehs", "operator": "beginsWith", "value": "8471"}
                ]}
            ]
        });

        let tree = RuleGroup::from_json(&raw).unwrap();
        assert_eq!(tree.combinator, Combinator::Or);
        assert!(!tree.not);
        assert_eq!(tree.condition_count(), 2);
        match &tree.rules[1] {
            RuleNode::Group(g) => assert!(g.not),
            other => panic!("期望分组节点: {:?}", other),
        }
    }

    #[test]
    fn test_empty_detection_is_recursive() {
        let raw = json!({"combinator": "and", "rules": [
            {"combinator": "or", "rules": []},
            {"combinator": "and", "rules": [{"combinator": "and", "rules": []}]}
        ]});
        let tree = RuleGroup::from_json(&raw).unwrap();
        assert!(tree.is_empty());
        assert!(RuleGroup::empty().is_empty());
    }

    #[test]
    fn test_malformed_paths() {
        let raw = json!({"combinator": "and", "rules": [
            {"field": "kodejalur", "operator": "=", "value": "H"},
            {"combinator": "and", "rules": [{"operator": "=", "value": 1}]}
        ]});
        let err = RuleGroup::from_json(&raw).unwrap_err();
        assert_eq!(
            err,
            RuleError::malformed(
                "rules[1].rules[0]",
                MalformedReason::MissingKey {
                    key: "field".to_string()
                }
            )
        );

        let err = RuleGroup::from_json(&json!({"combinator": "xor", "rules": []})).unwrap_err();
        assert!(matches!(
            err,
            RuleError::MalformedRuleTree { ref path, reason: MalformedReason::InvalidCombinator { .. } } if path == "combinator"
        ));

        let err = RuleGroup::from_json(&json!({"rules": "nope"})).unwrap_err();
        assert!(matches!(
            err,
            RuleError::MalformedRuleTree { reason: MalformedReason::RulesNotArray, .. }
        ));

        let err = RuleGroup::from_json(&json!([1, 2])).unwrap_err();
        assert!(matches!(
            err,
            RuleError::MalformedRuleTree { reason: MalformedReason::NotObject, .. }
        ));
    }

    #[test]
    fn test_value_required_except_null_checks() {
        let ok = json!({"rules": [{"field": "nomordaftar", "operator": "notNull"}]});
        assert!(RuleGroup::from_json(&ok).is_ok());

        let missing = json!({"rules": [{"field": "nomordaftar", "operator": "="}]});
        let err = RuleGroup::from_json(&missing).unwrap_err();
        assert!(matches!(
            err,
            RuleError::MalformedRuleTree { reason: MalformedReason::MissingValue, .. }
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut node = json!({"rules": [{"field": "kodejalur", "operator": "=", "value": "H"}]});
        for _ in 0..MAX_DEPTH {
            node = json!({"rules": [node]});
        }
        let err = RuleGroup::from_json(&node).unwrap_err();
        assert!(matches!(
            err,
            RuleError::MalformedRuleTree { reason: MalformedReason::TooDeep { .. }, .. }
        ));
    }

    #[test]
    fn test_json_round_trip_shape() {
        let raw = json!({"combinator": "and", "not": false, "rules": [
            {"field": "namaimportir", "operator": "contains", "value": "MAJU"}
        ]});
        let tree = RuleGroup::from_json(&raw).unwrap();
        assert_eq!(tree.to_json(), raw);
        assert_eq!(RuleGroup::from_json_str(&raw.to_string()).unwrap(), tree);
    }

    #[test]
    fn test_operator_parse() {
        assert_eq!(Operator::parse("BEGINSWITH"), Some(Operator::BeginsWith));
        assert_eq!(Operator::parse("notIn"), Some(Operator::NotIn));
        assert_eq!(Operator::parse("<>"), Some(Operator::NotEq));
        assert_eq!(Operator::parse("like"), None);
        for op in Operator::ALL {
            assert_eq!(Operator::parse(op.as_str()), Some(op));
        }
    }
}
