// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用辅助函数
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tempfile::NamedTempFile;

use bc20_query::api::{DashboardApi, ExportApi, QueryApi, RuleSetApi};
use bc20_query::config::QuerySettings;
use bc20_query::repository::{
    DashboardRepository, DeclarationReader, DeclarationRepository, RuleSetRepository,
};

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 所有API共享同一个连接；测试数据通过 `conn` 直接写入。
pub struct ApiTestEnv {
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,
    pub query_api: Arc<QueryApi>,
    pub export_api: Arc<ExportApi>,
    pub rule_set_api: Arc<RuleSetApi>,
    pub dashboard_api: Arc<DashboardApi>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 默认配置的测试环境
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_settings(QuerySettings::default())
    }

    pub fn with_settings(settings: QuerySettings) -> Result<Self, Box<dyn std::error::Error>> {
        let (temp_file, db_path) = test_helpers::create_test_db()?;
        let conn = Arc::new(Mutex::new(test_helpers::open_test_connection(&db_path)?));

        let reader: Arc<dyn DeclarationReader> = Arc::new(DeclarationRepository::new(conn.clone()));
        let rule_set_repo = Arc::new(RuleSetRepository::new(conn.clone()));
        let dashboard_repo = Arc::new(DashboardRepository::new(conn.clone()));

        Ok(Self {
            db_path,
            query_api: Arc::new(QueryApi::new(
                reader.clone(),
                rule_set_repo.clone(),
                settings.clone(),
            )),
            export_api: Arc::new(ExportApi::new(reader, settings)),
            rule_set_api: Arc::new(RuleSetApi::new(rule_set_repo)),
            dashboard_api: Arc::new(DashboardApi::new(dashboard_repo)),
            conn,
            _temp_file: temp_file,
        })
    }

    /// 在共享连接上执行数据准备
    pub fn seed<F>(&self, f: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<()>,
    {
        let conn = self.conn.lock().map_err(|e| e.to_string())?;
        f(&conn)?;
        Ok(())
    }
}
