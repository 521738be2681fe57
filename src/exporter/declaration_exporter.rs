// ==========================================
// BC 2.0 报关单查询系统 - 报关单导出器
// ==========================================
// 流程: 建表头 → 分批读取 id → 按需加载子表 → 展开为行 → 写出
// 约束: 每批只持有一批报关单，内存占用与结果总数无关
// ==========================================

use crate::domain::customs::Declaration;
use crate::domain::types::{Section, SortOrder};
use crate::engine::predicate_compiler::CompiledPredicate;
use crate::engine::row_projection::{Column, DisplayRow, FlatLayout, RowProjector};
use crate::exporter::batch::BatchPlan;
use crate::exporter::error::ExportResult;
use crate::exporter::sheet_writer_trait::{SheetHandle, SheetWriter};
use crate::repository::declaration_reader::{DeclarationReader, HydrationNeeds};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// 平铺布局的工作表名
pub const FLAT_SHEET_TITLE: &str = "Data PIB";

// ==========================================
// ExportLayout - 导出布局
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportLayout {
    /// 每个分区一个工作表
    #[default]
    MultiSheet,
    /// 单个工作表，与查询视图的平铺展开一致
    Flat,
}

impl ExportLayout {
    pub fn parse(s: &str) -> Option<ExportLayout> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "multi_sheet" | "multisheet" | "sheets" => Some(ExportLayout::MultiSheet),
            "flat" => Some(ExportLayout::Flat),
            _ => None,
        }
    }
}

/// 导出选项
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub sections: Vec<Section>,
    pub layout: ExportLayout,
    pub order: SortOrder,
    pub batch_size: usize,
}

/// 导出结果摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub batches: usize,
    pub headers: usize,
    /// (工作表名, 数据行数)，按工作表创建顺序
    pub rows_per_sheet: Vec<(String, usize)>,
}

impl ExportSummary {
    pub fn rows_in(&self, sheet: &str) -> Option<usize> {
        self.rows_per_sheet
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, n)| *n)
    }
}

// 工作表目标：分区（多表）或平铺布局
enum SheetTarget {
    Section(Section),
    Flat(FlatLayout),
}

struct SheetSlot {
    handle: SheetHandle,
    title: String,
    target: SheetTarget,
    rows: usize,
}

// ==========================================
// DeclarationExporter
// ==========================================
pub struct DeclarationExporter {
    reader: Arc<dyn DeclarationReader>,
    projector: RowProjector,
}

impl DeclarationExporter {
    pub fn new(reader: Arc<dyn DeclarationReader>, projector: RowProjector) -> Self {
        Self { reader, projector }
    }

    /// 按谓词导出报关单
    ///
    /// # 参数
    /// - predicate: 已编译谓词（空规则树应在调用前被拒绝）
    /// - options: 分区 / 布局 / 排序 / 批大小
    /// - writer: 写出目标
    ///
    /// # 返回
    /// - Ok(ExportSummary): 批次数、报关单数、各工作表行数
    ///
    /// # 说明
    /// - 未调用 writer.finish()，由调用方决定写出时机
    pub fn export(
        &self,
        predicate: &CompiledPredicate,
        options: &ExportOptions,
        writer: &mut dyn SheetWriter,
    ) -> ExportResult<ExportSummary> {
        let start = Instant::now();
        let sections = if options.sections.is_empty() {
            vec![Section::General]
        } else {
            options.sections.clone()
        };

        // === 步骤 1: 建工作表 ===
        let mut slots = self.open_sheets(&sections, options.layout, writer)?;
        let needs = match options.layout {
            ExportLayout::MultiSheet => HydrationNeeds::for_sections(&sections),
            ExportLayout::Flat => {
                HydrationNeeds::for_sections(&FlatLayout::for_sections(&sections).sections())
            }
        };

        // === 步骤 2: 分批读取 ===
        let plan = BatchPlan::new(
            self.reader.as_ref(),
            predicate,
            options.order,
            options.batch_size,
        )?;
        info!(
            total = plan.total(),
            batch_size = plan.batch_size(),
            batch_count = plan.batch_count(),
            layout = ?options.layout,
            "开始导出报关单"
        );

        let mut batches = 0usize;
        let mut headers = 0usize;
        for batch in plan.iter() {
            let ids = batch?;
            let declarations = self.reader.load_declarations(&ids, &needs)?;
            batches += 1;
            headers += declarations.len();

            // === 步骤 3: 展开并写出 ===
            for decl in &declarations {
                for slot in slots.iter_mut() {
                    let rows = self.rows_for(slot, decl);
                    for row in &rows {
                        writer.write_row(slot.handle, &row.cells)?;
                    }
                    slot.rows += rows.len();
                }
            }
            debug!(batch = batches, declarations = declarations.len(), "导出批次完成");
        }

        let summary = ExportSummary {
            batches,
            headers,
            rows_per_sheet: slots.into_iter().map(|s| (s.title, s.rows)).collect(),
        };
        info!(
            batches = summary.batches,
            headers = summary.headers,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "导出完成"
        );
        Ok(summary)
    }

    fn open_sheets(
        &self,
        sections: &[Section],
        layout: ExportLayout,
        writer: &mut dyn SheetWriter,
    ) -> ExportResult<Vec<SheetSlot>> {
        let mut slots = Vec::new();
        match layout {
            ExportLayout::MultiSheet => {
                for section in sections {
                    let columns = self.projector.columns_for_section(*section);
                    let handle = writer.add_sheet(section.sheet_title(), &labels(&columns))?;
                    slots.push(SheetSlot {
                        handle,
                        title: section.sheet_title().to_string(),
                        target: SheetTarget::Section(*section),
                        rows: 0,
                    });
                }
            }
            ExportLayout::Flat => {
                let flat = FlatLayout::for_sections(sections);
                let handle = writer.add_sheet(FLAT_SHEET_TITLE, &labels(&flat.columns()))?;
                slots.push(SheetSlot {
                    handle,
                    title: FLAT_SHEET_TITLE.to_string(),
                    target: SheetTarget::Flat(flat),
                    rows: 0,
                });
            }
        }
        Ok(slots)
    }

    fn rows_for(&self, slot: &SheetSlot, decl: &Declaration) -> Vec<DisplayRow> {
        match &slot.target {
            SheetTarget::Section(section) => self.projector.rows_for_section(decl, *section),
            SheetTarget::Flat(layout) => self.projector.flat_rows(decl, layout),
        }
    }
}

fn labels(columns: &[Column]) -> Vec<&'static str> {
    columns.iter().map(|c| c.label).collect()
}
