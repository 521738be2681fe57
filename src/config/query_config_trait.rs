// ==========================================
// BC 2.0 报关单查询系统 - 查询配置读取 Trait
// ==========================================
// 职责: 定义查询/导出所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

/// 配置读取错误
pub type ConfigError = Box<dyn Error + Send + Sync>;

// ==========================================
// 默认值与上下限
// ==========================================
pub const DEFAULT_PER_PAGE: usize = 10;
pub const DEFAULT_MAX_PER_PAGE: usize = 100;
pub const DEFAULT_EXPORT_BATCH_SIZE: usize = 500;
pub const MAX_EXPORT_BATCH_SIZE: usize = 5_000;
pub const DEFAULT_UNIT_PRICE_DECIMALS: usize = 4;
pub const MAX_UNIT_PRICE_DECIMALS: usize = 10;
pub const DEFAULT_LOCALE: &str = "id";

// ==========================================
// QuerySettings - 启动时加载的不可变配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySettings {
    pub default_per_page: usize,
    pub max_per_page: usize,
    pub export_batch_size: usize,
    pub unit_price_decimals: usize,
    pub locale: String,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: DEFAULT_MAX_PER_PAGE,
            export_batch_size: DEFAULT_EXPORT_BATCH_SIZE,
            unit_price_decimals: DEFAULT_UNIT_PRICE_DECIMALS,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl QuerySettings {
    /// 修正相互约束: max_per_page >= 1，default_per_page 落在 [1, max_per_page]
    pub fn normalized(mut self) -> Self {
        self.max_per_page = self.max_per_page.max(1);
        self.default_per_page = self.default_per_page.clamp(1, self.max_per_page);
        self.export_batch_size = self.export_batch_size.clamp(1, MAX_EXPORT_BATCH_SIZE);
        self.unit_price_decimals = self.unit_price_decimals.min(MAX_UNIT_PRICE_DECIMALS);
        self
    }
}

// ==========================================
// QueryConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait QueryConfigReader: Send + Sync {
    /// 分页默认每页条数
    ///
    /// # 默认值
    /// - 10
    async fn get_default_per_page(&self) -> Result<usize, ConfigError>;

    /// 每页条数上限
    ///
    /// # 默认值
    /// - 100
    async fn get_max_per_page(&self) -> Result<usize, ConfigError>;

    /// 导出批大小（每批读取的报关单数）
    ///
    /// # 默认值
    /// - 500（上限 5000）
    async fn get_export_batch_size(&self) -> Result<usize, ConfigError>;

    /// 单价小数位数
    ///
    /// # 默认值
    /// - 4
    async fn get_unit_price_decimals(&self) -> Result<usize, ConfigError>;

    /// 界面/错误提示语言
    ///
    /// # 默认值
    /// - id
    async fn get_locale(&self) -> Result<String, ConfigError>;

    /// 一次性读取全部查询配置
    async fn load_query_settings(&self) -> Result<QuerySettings, ConfigError> {
        Ok(QuerySettings {
            default_per_page: self.get_default_per_page().await?,
            max_per_page: self.get_max_per_page().await?,
            export_batch_size: self.get_export_batch_size().await?,
            unit_price_decimals: self.get_unit_price_decimals().await?,
            locale: self.get_locale().await?,
        }
        .normalized())
    }
}
