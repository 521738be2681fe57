// ==========================================
// BC 2.0 报关单查询系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + axum
// 系统定位: 报关数据查询/导出后台（只读客户数据，数据由外部导入流程维护）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 字段注册表 / 谓词编译 / 行展开
pub mod engine;

// 数据仓储层 - 数据访问
pub mod repository;

// 导出层 - 分批导出与表格写出
pub mod exporter;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计（SQL 计数 / 慢查询）
pub mod perf;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Actor, Section, SortColumn, SortDirection, SortOrder, UserRole};

// 领域实体
pub use domain::{
    Combinator, Condition, Declaration, DeclarationHeader, Operator, RuleGroup, RuleNode,
    RuleSet,
};

// 引擎
pub use engine::{
    CompiledPredicate, FieldDescriptor, FieldRegistry, PredicateCompiler, RowProjector,
    RuleError,
};

// API
pub use api::{ApiError, ApiResult, DashboardApi, ExportApi, QueryApi, RuleSetApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "BC 2.0 报关单查询系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
