// ==========================================
// BC 2.0 报关单查询系统 - 导出层
// ==========================================
// 职责: 按查询谓词分批导出报关单
// 支持: Excel (.xlsx), CSV
// ==========================================

pub mod batch;
pub mod declaration_exporter;
pub mod error;
pub mod file_writer;
pub mod sheet_writer_trait;

// 重导出核心类型
pub use batch::{BatchIter, BatchPlan};
pub use declaration_exporter::{
    DeclarationExporter, ExportLayout, ExportOptions, ExportSummary, FLAT_SHEET_TITLE,
};
pub use error::{ExportError, ExportResult};
pub use file_writer::{CsvSheetWriter, UniversalSheetWriter, XlsxSheetWriter};
pub use sheet_writer_trait::{ExportArtifact, SheetHandle, SheetWriter};
