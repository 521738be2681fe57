// ==========================================
// BC 2.0 报关单查询系统 - 应用层
// ==========================================
// 职责: HTTP 集成（axum 路由 + 共享状态）
// ==========================================

pub mod routes;
pub mod state;

// 重导出
pub use routes::{create_router, USER_ID_HEADER, USER_ROLE_HEADER};
pub use state::{get_default_db_path, AppState};
