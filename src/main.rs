// ==========================================
// BC 2.0 报关单查询系统 - HTTP 服务入口
// ==========================================
// 环境变量:
// - BC20_DB_PATH: 数据库路径（默认用户数据目录）
// - BC20_BIND_ADDR: 监听地址（默认 127.0.0.1:8080）
// - RUST_LOG / BC20_LOG_JSON: 日志配置
// ==========================================

use std::sync::Arc;

use bc20_query::app::{create_router, get_default_db_path, AppState};
use bc20_query::logging;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", bc20_query::APP_NAME);
    tracing::info!("系统版本: {}", bc20_query::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).await?;
    let app = create_router(Arc::new(state));

    let bind_addr = std::env::var("BC20_BIND_ADDR")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("HTTP 服务已启动: http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP 服务已退出");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("监听退出信号失败: {}", e);
    }
}
