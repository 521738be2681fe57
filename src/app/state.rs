// ==========================================
// BC 2.0 报关单查询系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{DashboardApi, ExportApi, QueryApi, RuleSetApi};
use crate::config::{ConfigManager, QueryConfigReader, QuerySettings};
use crate::db::{open_sqlite_connection, warn_on_schema_mismatch};
use crate::i18n;
use crate::perf::install_sqlite_tracing;
use crate::repository::{DashboardRepository, DeclarationReader, DeclarationRepository, RuleSetRepository};

/// 应用状态
///
/// 所有 API 共享同一个 SQLite 连接；在 axum 中以 `Arc<AppState>` 作为路由状态。
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 启动时加载的查询配置
    pub settings: QuerySettings,

    /// 规则查询API
    pub query_api: Arc<QueryApi>,

    /// 导出API
    pub export_api: Arc<ExportApi>,

    /// 规则集API
    pub rule_set_api: Arc<RuleSetApi>,

    /// 看板API
    pub dashboard_api: Arc<DashboardApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 1. 打开连接并安装 SQL 统计
    /// 2. 校验 schema_version（只告警）
    /// 3. 从 config_kv 加载查询配置并设置语言
    /// 4. 创建所有API实例
    pub async fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let mut conn =
            open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        install_sqlite_tracing(&mut conn);
        warn_on_schema_mismatch(&conn);

        Self::from_connection(db_path, Arc::new(Mutex::new(conn))).await
    }

    /// 从已有连接创建（测试使用内存库）
    pub async fn from_connection(
        db_path: String,
        conn: Arc<Mutex<Connection>>,
    ) -> Result<Self, String> {
        let config_manager = ConfigManager::from_connection(conn.clone())
            .map_err(|e| format!("无法创建ConfigManager: {}", e))?;
        let settings = config_manager
            .load_query_settings()
            .await
            .map_err(|e| format!("无法加载查询配置: {}", e))?;
        i18n::set_locale(&settings.locale);
        tracing::info!(
            default_per_page = settings.default_per_page,
            max_per_page = settings.max_per_page,
            export_batch_size = settings.export_batch_size,
            locale = %settings.locale,
            "查询配置已加载"
        );

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let declaration_reader: Arc<dyn DeclarationReader> =
            Arc::new(DeclarationRepository::new(conn.clone()));
        let rule_set_repo = Arc::new(RuleSetRepository::new(conn.clone()));
        let dashboard_repo = Arc::new(DashboardRepository::new(conn));

        // ==========================================
        // 初始化API层
        // ==========================================
        let query_api = Arc::new(QueryApi::new(
            declaration_reader.clone(),
            rule_set_repo.clone(),
            settings.clone(),
        ));
        let export_api = Arc::new(ExportApi::new(declaration_reader, settings.clone()));
        let rule_set_api = Arc::new(RuleSetApi::new(rule_set_repo));
        let dashboard_api = Arc::new(DashboardApi::new(dashboard_repo));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            settings,
            query_api,
            export_api,
            rule_set_api,
            dashboard_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: BC20_DB_PATH 环境变量 > 用户数据目录 > ./bc20_query.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("BC20_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./bc20_query.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("bc20-query");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("bc20_query.db");
        }
    }

    path.to_string_lossy().to_string()
}
