// ==========================================
// BC 2.0 报关单查询系统 - SQL 构建工具
// ==========================================
// 职责: 拼装 SELECT 语句骨架（WHERE / GROUP BY / ORDER BY / LIMIT / OFFSET）
//       并按出现顺序收集 `?` 绑定参数
// 约束: 条件片段只来自编译器或仓储内的常量；值一律走参数
// ==========================================

use crate::engine::predicate_compiler::{CompiledPredicate, SqlValue};

/// 生成 `?, ?, ?` 占位符列表
///
/// # 示例
/// ```
/// use bc20_query::repository::sql_builder::placeholders;
/// assert_eq!(placeholders(3), "?, ?, ?");
/// assert_eq!(placeholders(0), "");
/// ```
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// SQL 查询构建器（流式 API）
///
/// # 示例
/// ```
/// use bc20_query::repository::sql_builder::SqlQueryBuilder;
///
/// let (sql, params) = SqlQueryBuilder::new("SELECT h.id FROM bc20_header h")
///     .where_clause("h.kode_jalur IS NOT NULL")
///     .order_by("h.nomor_daftar ASC, h.id ASC")
///     .limit(10)
///     .offset(20)
///     .into_parts();
///
/// assert!(sql.contains("WHERE h.kode_jalur IS NOT NULL"));
/// assert!(sql.ends_with("LIMIT 10 OFFSET 20"));
/// assert!(params.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct SqlQueryBuilder {
    select_clause: String,
    where_clauses: Vec<String>,
    params: Vec<SqlValue>,
    group_by_clause: Option<String>,
    order_by_clause: Option<String>,
    limit_clause: Option<usize>,
    offset_clause: Option<usize>,
}

impl SqlQueryBuilder {
    /// 创建新的 SQL 查询构建器
    pub fn new(select: &str) -> Self {
        Self {
            select_clause: select.to_string(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            group_by_clause: None,
            order_by_clause: None,
            limit_clause: None,
            offset_clause: None,
        }
    }

    /// 添加无参数 WHERE 条件
    pub fn where_clause(mut self, condition: &str) -> Self {
        self.where_clauses.push(condition.to_string());
        self
    }

    /// 添加带一个参数的 WHERE 条件
    pub fn where_param(mut self, condition: &str, value: SqlValue) -> Self {
        self.where_clauses.push(condition.to_string());
        self.params.push(value);
        self
    }

    /// 参数存在时才添加条件
    pub fn and_param_if(self, condition: &str, value: Option<SqlValue>) -> Self {
        match value {
            Some(v) => self.where_param(condition, v),
            None => self,
        }
    }

    /// 添加编译后的规则谓词
    pub fn where_predicate(mut self, predicate: &CompiledPredicate) -> Self {
        self.where_clauses.push(format!("({})", predicate.sql));
        self.params.extend(predicate.params.iter().cloned());
        self
    }

    /// 添加 GROUP BY 子句
    pub fn group_by(mut self, group: &str) -> Self {
        self.group_by_clause = Some(group.to_string());
        self
    }

    /// 添加 ORDER BY 子句
    pub fn order_by(mut self, order: &str) -> Self {
        self.order_by_clause = Some(order.to_string());
        self
    }

    /// 添加 LIMIT 子句
    pub fn limit(mut self, n: usize) -> Self {
        self.limit_clause = Some(n);
        self
    }

    /// 添加 OFFSET 子句（仅在设置 LIMIT 时生效）
    pub fn offset(mut self, n: usize) -> Self {
        self.offset_clause = Some(n);
        self
    }

    /// 构建最终的 SQL 语句
    pub fn build(&self) -> String {
        let mut sql = self.select_clause.clone();

        if !self.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(group) = &self.group_by_clause {
            sql.push_str(" GROUP BY ");
            sql.push_str(group);
        }

        if let Some(order) = &self.order_by_clause {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        if let Some(limit) = self.limit_clause {
            sql.push_str(&format!(" LIMIT {}", limit));
            if let Some(offset) = self.offset_clause {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
        }

        sql
    }

    /// 当前收集的绑定参数
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// 构建 SQL 并取出参数
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        let sql = self.build();
        (sql, self.params)
    }
}
