// ==========================================
// BC 2.0 报关单查询系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod dashboard_repo;
pub mod declaration_reader;
pub mod declaration_repo;
pub mod error;
pub mod rule_set_repo;
pub mod sql_builder;

// 重导出核心仓储
pub use dashboard_repo::{CountBucket, DashboardRepository, DateRange, Totals};
pub use declaration_reader::{DeclarationReader, HydrationNeeds};
pub use declaration_repo::DeclarationRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use rule_set_repo::RuleSetRepository;
pub use sql_builder::SqlQueryBuilder;
