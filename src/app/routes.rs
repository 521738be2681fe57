// ==========================================
// BC 2.0 报关单查询系统 - HTTP 路由
// ==========================================
// 约定:
// - JSON 请求/响应；导出返回 xlsx 附件
// - 操作人由上游认证网关通过 x-user-id / x-user-role 注入
// - 数据库操作在 spawn_blocking 中执行
// ==========================================

mod common;
mod dashboard;
mod declaration;
mod rule_set;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::app::state::AppState;

pub use common::{
    ApiJson, ApiQuery, CurrentActor, ErrorResponse, HttpError, USER_ID_HEADER, USER_ROLE_HEADER,
};

/// 创建 HTTP 路由
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(declaration::health_check))
        // 字段目录
        .route("/api/fields", get(declaration::list_fields))
        // 报关单查询 / 导出
        .route("/api/declarations/query", post(declaration::query_declarations))
        .route("/api/declarations/export", post(declaration::export_declarations))
        // 看板
        .route("/api/dashboard/summary", get(dashboard::summary))
        // 规则集
        .route(
            "/api/rule-sets",
            get(rule_set::list_rule_sets).post(rule_set::create_rule_set),
        )
        .route(
            "/api/rule-sets/{id}",
            get(rule_set::get_rule_set)
                .put(rule_set::update_rule_set)
                .delete(rule_set::delete_rule_set),
        )
        .route("/api/rule-sets/{id}/query", post(rule_set::query_rule_set))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
