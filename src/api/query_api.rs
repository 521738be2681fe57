// ==========================================
// BC 2.0 报关单查询系统 - 查询 API
// ==========================================
// 流程: 解析分区 → 解析规则树 → 编译谓词 → 计数 → 取当页 id →
//       按需加载子表 → 平铺展开
// 约束: 所有校验在任何 SQL 执行之前完成
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::rule_set_api::load_visible;
use crate::config::QuerySettings;
use crate::domain::rule::RuleGroup;
use crate::domain::types::{Actor, Section, SortOrder};
use crate::engine::field_registry::FieldRegistry;
use crate::engine::predicate_compiler::{CompiledPredicate, PredicateCompiler};
use crate::engine::row_projection::{Column, FlatLayout, RowProjector};
use crate::repository::declaration_reader::{DeclarationReader, HydrationNeeds};
use crate::repository::declaration_repo::describe_params;
use crate::repository::rule_set_repo::RuleSetRepository;

// ==========================================
// 请求 / 响应
// ==========================================

/// 查询请求
///
/// `sections` 为逗号分隔的分区名，缺省为 `general`。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub rules: Value,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub per_page: Option<i64>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_direction: Option<String>,
    #[serde(default)]
    pub sections: Option<String>,
}

/// 分页查询结果
#[derive(Debug, Clone, Serialize)]
pub struct QueryPage {
    pub data: Vec<Value>,
    pub columns: Vec<Column>,
    pub current_page: usize,
    pub last_page: usize,
    pub per_page: usize,
    pub total: usize,
    /// 当页第一张报关单的序号（从 1 开始），空页为 null
    pub from: Option<usize>,
    pub to: Option<usize>,
    pub sort_by: String,
    pub sort_direction: String,
    pub sections: Vec<Section>,
}

/// 字段目录项（前端规则构建器）
#[derive(Debug, Clone, Serialize)]
pub struct FieldInfo {
    pub name: &'static str,
    pub label: &'static str,
    pub table: &'static str,
    pub value_type: &'static str,
    pub operators: Vec<&'static str>,
    pub values: Option<Vec<&'static str>>,
}

// ==========================================
// QueryApi - 查询 API
// ==========================================
pub struct QueryApi {
    reader: Arc<dyn DeclarationReader>,
    rule_set_repo: Arc<RuleSetRepository>,
    compiler: PredicateCompiler,
    projector: RowProjector,
    settings: QuerySettings,
}

impl QueryApi {
    pub fn new(
        reader: Arc<dyn DeclarationReader>,
        rule_set_repo: Arc<RuleSetRepository>,
        settings: QuerySettings,
    ) -> Self {
        let settings = settings.normalized();
        Self {
            reader,
            rule_set_repo,
            compiler: PredicateCompiler::new(),
            projector: RowProjector::new(settings.unit_price_decimals),
            settings,
        }
    }

    /// 执行规则查询
    ///
    /// # 返回
    /// - Ok(QueryPage): 当前页数据（平铺展开）
    /// - Err(ApiError): 校验失败（UnknownField / InvalidOperator / MalformedRuleTree /
    ///   EmptyQueryRejected / InvalidInput）或数据访问失败
    pub fn execute(&self, request: &QueryRequest) -> ApiResult<QueryPage> {
        let sections = parse_sections(request.sections.as_deref())?;
        let tree = RuleGroup::from_json(&request.rules)?;
        let predicate = self.compiler.compile_for_execution(&tree)?;
        self.run(&predicate, request, sections)
    }

    /// 执行已保存的规则集（request.rules 被忽略）
    pub fn execute_rule_set(
        &self,
        actor: &Actor,
        rule_set_id: &str,
        request: &QueryRequest,
    ) -> ApiResult<QueryPage> {
        let sections = parse_sections(request.sections.as_deref())?;
        let rule_set = load_visible(&self.rule_set_repo, actor, rule_set_id)?;
        let predicate = self.compiler.compile_for_execution(&rule_set.rules)?;
        info!(rule_set_id = %rule_set.id, actor = %actor.user_id, "执行规则集查询");
        self.run(&predicate, request, sections)
    }

    /// 可查询字段目录
    pub fn list_fields(&self) -> Vec<FieldInfo> {
        FieldRegistry::global()
            .fields()
            .iter()
            .map(|f| FieldInfo {
                name: f.name,
                label: f.label,
                table: f.table.table_name(),
                value_type: f.value_type.name(),
                operators: f
                    .value_type
                    .allowed_operators()
                    .iter()
                    .map(|op| op.as_str())
                    .collect(),
                values: f.value_type.enum_values().map(|v| v.to_vec()),
            })
            .collect()
    }

    fn run(
        &self,
        predicate: &CompiledPredicate,
        request: &QueryRequest,
        sections: Vec<Section>,
    ) -> ApiResult<QueryPage> {
        let (order, fell_back) =
            SortOrder::resolve(request.sort_by.as_deref(), request.sort_direction.as_deref());
        if fell_back {
            warn!(
                sort_by = ?request.sort_by,
                "排序字段不在白名单内，使用默认排序 {}",
                order.column.as_str()
            );
        }

        let per_page = self.clamp_per_page(request.per_page);
        let page = request.page.unwrap_or(1).max(1) as usize;

        debug!(
            sql = %predicate.sql,
            params = %describe_params(&predicate.params),
            "执行报关单查询"
        );

        let total = self.reader.count_matching(predicate)?.max(0) as usize;
        let last_page = total.div_ceil(per_page).max(1);
        let offset = (page - 1).saturating_mul(per_page);

        let ids = if offset < total {
            self.reader
                .find_matching_ids(predicate, &order, per_page, offset)?
        } else {
            Vec::new()
        };

        let layout = FlatLayout::for_sections(&sections);
        let needs = HydrationNeeds::for_sections(&layout.sections());
        let declarations = self.reader.load_declarations(&ids, &needs)?;

        let columns = layout.columns();
        let data: Vec<Value> = declarations
            .iter()
            .flat_map(|decl| self.projector.flat_rows(decl, &layout))
            .map(|row| row.to_json(&columns))
            .collect();

        let (from, to) = if ids.is_empty() {
            (None, None)
        } else {
            (Some(offset + 1), Some(offset + ids.len()))
        };

        Ok(QueryPage {
            data,
            columns,
            current_page: page,
            last_page,
            per_page,
            total,
            from,
            to,
            sort_by: order.column.as_str().to_string(),
            sort_direction: order.direction.as_str().to_string(),
            sections,
        })
    }

    // 缺省用配置默认值；限制在 [1, max_per_page]
    fn clamp_per_page(&self, requested: Option<i64>) -> usize {
        match requested {
            None => self.settings.default_per_page,
            Some(n) if n < 1 => 1,
            Some(n) => (n as usize).min(self.settings.max_per_page),
        }
    }
}

/// 解析分区参数，未知分区返回 InvalidInput
pub(crate) fn parse_sections(raw: Option<&str>) -> ApiResult<Vec<Section>> {
    Section::parse_list(raw).map_err(|bad| ApiError::InvalidInput(format!("未知分区: {}", bad)))
}
