// ==========================================
// BC 2.0 报关单查询系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 HTTP 路由与命令行工具调用
// ==========================================

pub mod dashboard_api;
pub mod error;
pub mod export_api;
pub mod query_api;
pub mod rule_set_api;

// 重导出核心类型
pub use dashboard_api::{DashboardApi, DashboardFilter, DashboardSummary};
pub use error::{ApiError, ApiResult};
pub use export_api::{ExportApi, ExportRequest};
pub use query_api::{FieldInfo, QueryApi, QueryPage, QueryRequest};
pub use rule_set_api::RuleSetApi;
