// ==========================================
// BC 2.0 报关单查询系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (scope_id + key + value)，与报关数据同库
// ==========================================

use crate::config::query_config_trait::{
    ConfigError, QueryConfigReader, DEFAULT_EXPORT_BATCH_SIZE, DEFAULT_LOCALE,
    DEFAULT_MAX_PER_PAGE, DEFAULT_PER_PAGE, DEFAULT_UNIT_PRICE_DECIMALS,
};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager（config_kv 不存在时创建）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, ConfigError> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            conn_guard.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS config_kv (
                  scope_id TEXT NOT NULL DEFAULT 'global',
                  key TEXT NOT NULL,
                  value TEXT NOT NULL,
                  updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
                  PRIMARY KEY (scope_id, key)
                );
                "#,
            )?;
        }

        Ok(Self { conn })
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2,
                 updated_at = datetime('now', 'localtime')",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取正整数配置，格式错误时告警并使用默认值
    fn get_usize_or_default(&self, key: &str, default: usize) -> Result<usize, ConfigError> {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        match raw.trim().parse::<usize>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    "配置值格式错误，使用默认值 {}",
                    default
                );
                Ok(default)
            }
        }
    }
}

// ==========================================
// QueryConfigReader Trait 实现
// ==========================================
#[async_trait]
impl QueryConfigReader for ConfigManager {
    async fn get_default_per_page(&self) -> Result<usize, ConfigError> {
        self.get_usize_or_default(config_keys::QUERY_DEFAULT_PER_PAGE, DEFAULT_PER_PAGE)
    }

    async fn get_max_per_page(&self) -> Result<usize, ConfigError> {
        self.get_usize_or_default(config_keys::QUERY_MAX_PER_PAGE, DEFAULT_MAX_PER_PAGE)
    }

    async fn get_export_batch_size(&self) -> Result<usize, ConfigError> {
        self.get_usize_or_default(config_keys::EXPORT_BATCH_SIZE, DEFAULT_EXPORT_BATCH_SIZE)
    }

    async fn get_unit_price_decimals(&self) -> Result<usize, ConfigError> {
        self.get_usize_or_default(config_keys::UNIT_PRICE_DECIMALS, DEFAULT_UNIT_PRICE_DECIMALS)
    }

    async fn get_locale(&self) -> Result<String, ConfigError> {
        let value = self.get_config_or_default(config_keys::LOCALE, DEFAULT_LOCALE)?;
        let value = value.trim();
        if value.is_empty() {
            Ok(DEFAULT_LOCALE.to_string())
        } else {
            Ok(value.to_string())
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 分页
    pub const QUERY_DEFAULT_PER_PAGE: &str = "query_default_per_page";
    pub const QUERY_MAX_PER_PAGE: &str = "query_max_per_page";

    // 导出
    pub const EXPORT_BATCH_SIZE: &str = "export_batch_size";
    pub const UNIT_PRICE_DECIMALS: &str = "unit_price_decimals";

    // 语言
    pub const LOCALE: &str = "locale";
}
