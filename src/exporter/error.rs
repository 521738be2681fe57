// ==========================================
// BC 2.0 报关单查询系统 - 导出模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导出模块错误类型
#[derive(Error, Debug)]
pub enum ExportError {
    // ===== 输出目标错误 =====
    #[error("输出格式不支持: {0}（仅支持 .xlsx / .csv / 目录）")]
    UnsupportedFormat(String),

    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel 写入失败: {0}")]
    XlsxWriteError(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV 写入失败: {0}")]
    CsvWriteError(#[from] csv::Error),

    #[error("工作表不存在: handle={0}")]
    UnknownSheet(usize),

    // ===== 数据错误 =====
    #[error("数据读取失败: {0}")]
    Repository(#[from] RepositoryError),

    #[error("导出行数超出工作表上限: sheet={sheet}, rows={rows}")]
    SheetTooLarge { sheet: String, rows: u64 },
}

/// Result 类型别名
pub type ExportResult<T> = Result<T, ExportError>;
