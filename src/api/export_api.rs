// ==========================================
// BC 2.0 报关单查询系统 - 导出 API
// ==========================================
// 职责: 校验导出请求，按批次导出为 xlsx 工作簿或 CSV 文件
// 约束: 与查询视图使用相同的规则树校验、排序与分区解析
// ==========================================

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::query_api::parse_sections;
use crate::config::QuerySettings;
use crate::domain::rule::RuleGroup;
use crate::domain::types::SortOrder;
use crate::engine::predicate_compiler::{CompiledPredicate, PredicateCompiler};
use crate::engine::row_projection::RowProjector;
use crate::exporter::{
    DeclarationExporter, ExportArtifact, ExportLayout, ExportOptions, ExportSummary,
    SheetWriter, UniversalSheetWriter, XlsxSheetWriter,
};
use crate::repository::declaration_reader::DeclarationReader;

/// 导出请求
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub rules: Value,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_direction: Option<String>,
    #[serde(default)]
    pub sections: Option<String>,
    /// `multi_sheet`（默认）或 `flat`
    #[serde(default)]
    pub layout: Option<String>,
}

// ==========================================
// ExportApi - 导出 API
// ==========================================
pub struct ExportApi {
    exporter: DeclarationExporter,
    compiler: PredicateCompiler,
    settings: QuerySettings,
}

impl ExportApi {
    pub fn new(reader: Arc<dyn DeclarationReader>, settings: QuerySettings) -> Self {
        let settings = settings.normalized();
        Self {
            exporter: DeclarationExporter::new(
                reader,
                RowProjector::new(settings.unit_price_decimals),
            ),
            compiler: PredicateCompiler::new(),
            settings,
        }
    }

    /// 导出到任意写出器（不调用 finish）
    pub fn export_to_writer(
        &self,
        request: &ExportRequest,
        writer: &mut dyn SheetWriter,
    ) -> ApiResult<ExportSummary> {
        let (predicate, options) = self.prepare(request)?;
        self.exporter
            .export(&predicate, &options, writer)
            .map_err(|e| {
                error!(error = %e, "导出失败");
                ApiError::from(e)
            })
    }

    /// 导出为临时 xlsx 文件（HTTP 下载），句柄释放时文件随之删除
    pub fn export_xlsx(&self, request: &ExportRequest) -> ApiResult<(NamedTempFile, ExportSummary)> {
        self.prepare(request)?;

        let temp = tempfile::Builder::new()
            .prefix("bc20-export-")
            .suffix(".xlsx")
            .tempfile()
            .map_err(|e| ApiError::ExportFailed(format!("无法创建临时文件: {}", e)))?;

        let mut writer = XlsxSheetWriter::to_path(temp.path());
        let summary = self.export_to_writer(request, &mut writer)?;
        writer.finish()?;
        Ok((temp, summary))
    }

    /// 导出到文件（按扩展名选择 xlsx / csv）
    pub fn export_to_path(
        &self,
        request: &ExportRequest,
        output: &Path,
    ) -> ApiResult<(ExportArtifact, ExportSummary)> {
        // 先校验请求，避免校验失败时留下空文件
        self.prepare(request)?;

        let mut writer = UniversalSheetWriter.for_output(output)?;
        let summary = self.export_to_writer(request, writer.as_mut())?;
        let artifact = writer.finish()?;
        info!(output = %output.display(), headers = summary.headers, "导出文件已写出");
        Ok((artifact, summary))
    }

    fn prepare(&self, request: &ExportRequest) -> ApiResult<(CompiledPredicate, ExportOptions)> {
        let sections = parse_sections(request.sections.as_deref())?;
        let layout = match request.layout.as_deref().map(str::trim) {
            None | Some("") => ExportLayout::default(),
            Some(raw) => ExportLayout::parse(raw)
                .ok_or_else(|| ApiError::InvalidInput(format!("未知导出布局: {}", raw)))?,
        };

        let tree = RuleGroup::from_json(&request.rules)?;
        let predicate = self.compiler.compile_for_execution(&tree)?;

        let (order, fell_back) =
            SortOrder::resolve(request.sort_by.as_deref(), request.sort_direction.as_deref());
        if fell_back {
            warn!(sort_by = ?request.sort_by, "导出排序字段不在白名单内，使用默认排序");
        }

        Ok((
            predicate,
            ExportOptions {
                sections,
                layout,
                order,
                batch_size: self.settings.export_batch_size,
            },
        ))
    }
}
