// ==========================================
// BC 2.0 报关单查询系统 - 配置层
// ==========================================
// 职责: 系统配置管理（分页、导出批大小、单价精度、语言）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod query_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use query_config_trait::{ConfigError, QueryConfigReader, QuerySettings};
