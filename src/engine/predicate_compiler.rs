// ==========================================
// BC 2.0 报关单查询系统 - 谓词编译器
// ==========================================
// 职责: 规则树 → 参数化 SQL WHERE 片段（表头别名 h）
// 规则:
// - 校验顺序: 字段 (UnknownField) → 运算符 (InvalidOperator) → 值 (MalformedRuleTree)
// - 按表基数决定: 表头字段直接比较；一对一 / 一对多子表字段编译为 EXISTS 子查询，表头行不会被放大
// - 所有值均以 `?` 参数绑定，SQL 文本中只出现注册表里的标识符
// ==========================================

use crate::domain::rule::{Combinator, Condition, Operator, RuleGroup, RuleNode};
use crate::engine::error::{MalformedReason, RuleError, RuleResult};
use crate::engine::field_registry::{Cardinality, FieldDescriptor, FieldRegistry, ValueType};
use chrono::NaiveDate;
use serde_json::Value;

/// SQL 绑定参数
pub type SqlValue = rusqlite::types::Value;

/// 编译结果
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl CompiledPredicate {
    /// 恒真谓词（空分组）
    pub fn always_true() -> Self {
        Self {
            sql: "1 = 1".to_string(),
            params: Vec::new(),
        }
    }

    pub fn is_always_true(&self) -> bool {
        self.sql == "1 = 1" && self.params.is_empty()
    }
}

/// 谓词编译器
pub struct PredicateCompiler {
    registry: &'static FieldRegistry,
}

impl Default for PredicateCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl PredicateCompiler {
    /// 使用全局字段注册表
    pub fn new() -> Self {
        Self {
            registry: FieldRegistry::global(),
        }
    }

    pub fn with_registry(registry: &'static FieldRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'static FieldRegistry {
        self.registry
    }

    /// 编译规则树（空树编译为 `1 = 1`）
    pub fn compile(&self, tree: &RuleGroup) -> RuleResult<CompiledPredicate> {
        let mut params = Vec::new();
        let sql = self.compile_group(tree, "$", &mut params)?;
        Ok(CompiledPredicate { sql, params })
    }

    /// 编译用于执行的规则树
    ///
    /// 空树（任意深度无条件）返回 EmptyQueryRejected，禁止无条件全表查询。
    pub fn compile_for_execution(&self, tree: &RuleGroup) -> RuleResult<CompiledPredicate> {
        if tree.is_empty() {
            return Err(RuleError::EmptyQueryRejected);
        }
        self.compile(tree)
    }

    // ==========================================
    // 分组
    // ==========================================

    fn compile_group(
        &self,
        group: &RuleGroup,
        path: &str,
        params: &mut Vec<SqlValue>,
    ) -> RuleResult<String> {
        let rules_path = child_path(path, "rules");
        let mut parts = Vec::with_capacity(group.rules.len());

        for (i, node) in group.rules.iter().enumerate() {
            let node_path = format!("{}[{}]", rules_path, i);
            let sql = match node {
                // 无条件的子分组不参与组合（OR 中的 1 = 1 会匹配全部记录）
                RuleNode::Group(g) if g.is_empty() => continue,
                RuleNode::Group(g) => self.compile_group(g, &node_path, params)?,
                RuleNode::Condition(c) => self.compile_condition(c, &node_path, params)?,
            };
            parts.push(sql);
        }

        // 空分组恒真，忽略 not（NOT (1 = 1) 会排除全部记录）
        if parts.is_empty() {
            return Ok("1 = 1".to_string());
        }

        let body = match parts.len() {
            1 => parts.remove(0),
            _ => {
                let joiner = match group.combinator {
                    Combinator::And => " AND ",
                    Combinator::Or => " OR ",
                };
                format!("({})", parts.join(joiner))
            }
        };

        if group.not {
            Ok(format!("NOT ({})", body))
        } else {
            Ok(body)
        }
    }

    // ==========================================
    // 条件
    // ==========================================

    fn compile_condition(
        &self,
        cond: &Condition,
        path: &str,
        params: &mut Vec<SqlValue>,
    ) -> RuleResult<String> {
        // 1. 字段
        let desc = self.registry.resolve(&cond.field)?;

        // 2. 运算符
        let op = Operator::parse(&cond.operator)
            .filter(|op| desc.value_type.allows(*op))
            .ok_or_else(|| RuleError::InvalidOperator {
                field: cond.field.clone(),
                operator: cond.operator.clone(),
                value_type: desc.value_type.name().to_string(),
            })?;

        // 3. 值（先完成转换，再写入参数，保证失败时不残留参数）
        let value_path = child_path(path, "value");
        let operand = coerce_operand(desc, op, &cond.value, &value_path)?;

        match desc.table.cardinality() {
            Cardinality::Root => {
                let column = format!("h.{}", desc.column);
                Ok(leaf_sql(desc, op, &column, operand, params))
            }
            Cardinality::OneToOne | Cardinality::OneToMany => {
                let mut sql = format!(
                    "EXISTS (SELECT 1 FROM {} c WHERE c.header_id = h.id",
                    desc.table.table_name()
                );
                if let Some(scope) = desc.scope {
                    sql.push_str(&format!(" AND c.{} = ?", scope.column));
                    params.push(SqlValue::Text(scope.value.to_string()));
                }
                let column = format!("c.{}", desc.column);
                sql.push_str(" AND ");
                sql.push_str(&leaf_sql(desc, op, &column, operand, params));
                sql.push(')');
                Ok(sql)
            }
        }
    }
}

// ==========================================
// 叶子谓词
// ==========================================

/// 已转换的操作数
#[derive(Debug)]
enum Operand {
    None,
    Single(SqlValue),
    List(Vec<SqlValue>),
    Pair(SqlValue, SqlValue),
}

fn leaf_sql(
    desc: &FieldDescriptor,
    op: Operator,
    column: &str,
    operand: Operand,
    params: &mut Vec<SqlValue>,
) -> String {
    // 日期列可能带时间部分，比较时只取日期
    let compared = match desc.value_type {
        ValueType::Date => format!("substr({}, 1, 10)", column),
        _ => column.to_string(),
    };

    match (op, operand) {
        (Operator::Null, _) => format!("{} IS NULL", column),
        (Operator::NotNull, _) => format!("{} IS NOT NULL", column),
        (Operator::In | Operator::NotIn, Operand::List(values)) => {
            let placeholders = vec!["?"; values.len()].join(", ");
            params.extend(values);
            let keyword = if op == Operator::In { "IN" } else { "NOT IN" };
            format!("{} {} ({})", compared, keyword, placeholders)
        }
        (Operator::Between | Operator::NotBetween, Operand::Pair(low, high)) => {
            params.push(low);
            params.push(high);
            let keyword = if op == Operator::Between {
                "BETWEEN"
            } else {
                "NOT BETWEEN"
            };
            format!("{} {} ? AND ?", compared, keyword)
        }
        (_, Operand::Single(value)) => {
            let (template, value) = match op {
                Operator::Contains => ("LIKE", like_pattern(value, true, true)),
                Operator::BeginsWith => ("LIKE", like_pattern(value, false, true)),
                Operator::EndsWith => ("LIKE", like_pattern(value, true, false)),
                Operator::DoesNotContain => ("NOT LIKE", like_pattern(value, true, true)),
                Operator::DoesNotBeginWith => ("NOT LIKE", like_pattern(value, false, true)),
                Operator::DoesNotEndWith => ("NOT LIKE", like_pattern(value, true, false)),
                _ => ("", value),
            };
            params.push(value);
            if template.is_empty() {
                format!("{} {} ?", compared, comparison_sql(op))
            } else {
                format!("{} {} ? ESCAPE '\\'", compared, template)
            }
        }
        // 操作数形状由 coerce_operand 按运算符决定，不会走到这里
        (_, _) => "1 = 0".to_string(),
    }
}

fn comparison_sql(op: Operator) -> &'static str {
    match op {
        Operator::NotEq => "!=",
        Operator::Lt => "<",
        Operator::Gt => ">",
        Operator::Lte => "<=",
        Operator::Gte => ">=",
        _ => "=",
    }
}

/// LIKE 模式转义: `\` `%` `_`
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn like_pattern(value: SqlValue, leading: bool, trailing: bool) -> SqlValue {
    let text = match value {
        SqlValue::Text(s) => s,
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => f.to_string(),
        _ => String::new(),
    };
    let mut pattern = String::new();
    if leading {
        pattern.push('%');
    }
    pattern.push_str(&escape_like(&text));
    if trailing {
        pattern.push('%');
    }
    SqlValue::Text(pattern)
}

// ==========================================
// 值转换
// ==========================================

fn coerce_operand(
    desc: &FieldDescriptor,
    op: Operator,
    raw: &Value,
    path: &str,
) -> RuleResult<Operand> {
    match op {
        Operator::Null | Operator::NotNull => Ok(Operand::None),
        Operator::In | Operator::NotIn => {
            let items = split_list(raw, path)?;
            if items.is_empty() {
                return Err(RuleError::malformed(path, MalformedReason::EmptyList));
            }
            let values = items
                .iter()
                .map(|v| coerce_scalar(desc.value_type, v, path))
                .collect::<RuleResult<Vec<_>>>()?;
            Ok(Operand::List(values))
        }
        Operator::Between | Operator::NotBetween => {
            let items = split_list(raw, path)?;
            if items.len() != 2 {
                return Err(RuleError::malformed(
                    path,
                    MalformedReason::BetweenArity { count: items.len() },
                ));
            }
            let low = coerce_scalar(desc.value_type, &items[0], path)?;
            let high = coerce_scalar(desc.value_type, &items[1], path)?;
            Ok(Operand::Pair(low, high))
        }
        _ => Ok(Operand::Single(coerce_scalar(desc.value_type, raw, path)?)),
    }
}

/// 列表值: JSON 数组，或逗号分隔字符串
fn split_list(raw: &Value, path: &str) -> RuleResult<Vec<Value>> {
    match raw {
        Value::Array(items) => Ok(items.clone()),
        Value::String(s) => Ok(s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| Value::String(p.to_string()))
            .collect()),
        Value::Null => Err(RuleError::malformed(path, MalformedReason::MissingValue)),
        Value::Number(_) | Value::Bool(_) => Ok(vec![raw.clone()]),
        Value::Object(_) => Err(RuleError::malformed(
            path,
            MalformedReason::UnsupportedValue {
                value: raw.to_string(),
            },
        )),
    }
}

fn coerce_scalar(value_type: ValueType, raw: &Value, path: &str) -> RuleResult<SqlValue> {
    let unsupported = || {
        RuleError::malformed(
            path,
            MalformedReason::UnsupportedValue {
                value: raw.to_string(),
            },
        )
    };

    let text = match raw {
        Value::Null => return Err(RuleError::malformed(path, MalformedReason::MissingValue)),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => {
            if value_type == ValueType::Number {
                return n.as_f64().map(SqlValue::Real).ok_or_else(unsupported);
            }
            n.to_string()
        }
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => return Err(unsupported()),
    };

    match value_type {
        ValueType::String => Ok(SqlValue::Text(text)),
        ValueType::Number => text
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(SqlValue::Real)
            .ok_or_else(|| {
                RuleError::malformed(path, MalformedReason::InvalidNumber { value: text.clone() })
            }),
        ValueType::Date => {
            let date_part = text.get(..10).unwrap_or(&text);
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                .map(|d| SqlValue::Text(d.format("%Y-%m-%d").to_string()))
                .map_err(|_| {
                    RuleError::malformed(path, MalformedReason::InvalidDate { value: text.clone() })
                })
        }
        ValueType::Enum(allowed) => allowed
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(&text))
            .map(|candidate| SqlValue::Text(candidate.to_string()))
            .ok_or_else(|| {
                RuleError::malformed(
                    path,
                    MalformedReason::EnumNotAllowed {
                        value: text.clone(),
                        allowed: allowed.join(", "),
                    },
                )
            }),
    }
}

fn child_path(parent: &str, segment: &str) -> String {
    if parent == "$" {
        segment.to_string()
    } else {
        format!("{}.{}", parent, segment)
    }
}
