// ==========================================
// BC 2.0 报关单查询系统 - 表格写出 Trait
// ==========================================
// 职责: 定义导出目标的写出接口（不包含数据读取逻辑）
// 实现者: XlsxSheetWriter / CsvSheetWriter / UniversalSheetWriter
// ==========================================

use crate::engine::row_projection::Cell;
use crate::exporter::error::ExportResult;
use std::path::PathBuf;

/// 工作表句柄（add_sheet 返回的顺序号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SheetHandle(pub usize);

/// 写出结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportArtifact {
    /// 单个文件
    File(PathBuf),
    /// 多个文件（CSV 每个工作表一个文件）
    Files(Vec<PathBuf>),
}

// ==========================================
// SheetWriter Trait
// ==========================================
pub trait SheetWriter {
    /// 新建工作表并写入表头行
    fn add_sheet(&mut self, name: &str, headers: &[&str]) -> ExportResult<SheetHandle>;

    /// 追加一行数据
    fn write_row(&mut self, sheet: SheetHandle, cells: &[Cell]) -> ExportResult<()>;

    /// 完成写出（刷新缓冲并落盘）
    fn finish(&mut self) -> ExportResult<ExportArtifact>;
}
