// ==========================================
// BC 2.0 报关单查询系统 - 表格写出实现
// ==========================================
// 支持: Excel (.xlsx，每分区一个工作表) / CSV（每分区一个文件）
// ==========================================

use crate::engine::row_projection::Cell;
use crate::exporter::error::{ExportError, ExportResult};
use crate::exporter::sheet_writer_trait::{ExportArtifact, SheetHandle, SheetWriter};
use rust_xlsxwriter::{Format, Workbook};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Excel 单个工作表最大行数
pub const XLSX_MAX_ROWS: u32 = 1_048_576;

// ==========================================
// Excel Writer 实现
// ==========================================
// 工作表以常量内存模式创建: 每写完一行即刷到临时文件，
// 同一工作表内行号必须递增（导出器按批次顺序追加，满足该约束）
pub struct XlsxSheetWriter {
    workbook: Workbook,
    header_format: Format,
    sheet_names: Vec<String>,
    next_rows: Vec<u32>,
    target: PathBuf,
}

impl XlsxSheetWriter {
    /// 写入文件
    pub fn to_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            workbook: Workbook::new(),
            header_format: Format::new().set_bold(),
            sheet_names: Vec::new(),
            next_rows: Vec::new(),
            target: path.as_ref().to_path_buf(),
        }
    }

    fn sheet_name(&self, sheet: SheetHandle) -> String {
        self.sheet_names.get(sheet.0).cloned().unwrap_or_default()
    }
}

impl SheetWriter for XlsxSheetWriter {
    fn add_sheet(&mut self, name: &str, headers: &[&str]) -> ExportResult<SheetHandle> {
        let worksheet = self.workbook.add_worksheet_with_constant_memory();
        worksheet.set_name(name)?;
        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &self.header_format)?;
        }

        self.sheet_names.push(name.to_string());
        self.next_rows.push(1);
        Ok(SheetHandle(self.next_rows.len() - 1))
    }

    fn write_row(&mut self, sheet: SheetHandle, cells: &[Cell]) -> ExportResult<()> {
        let row = *self
            .next_rows
            .get(sheet.0)
            .ok_or(ExportError::UnknownSheet(sheet.0))?;
        if row >= XLSX_MAX_ROWS {
            return Err(ExportError::SheetTooLarge {
                sheet: self.sheet_name(sheet),
                rows: u64::from(row) + 1,
            });
        }

        let worksheet = self.workbook.worksheet_from_index(sheet.0)?;
        for (col, cell) in cells.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(row, col, s.as_str())?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(row, col, *n)?;
                }
                Cell::Empty => {}
            }
        }

        self.next_rows[sheet.0] = row + 1;
        Ok(())
    }

    fn finish(&mut self) -> ExportResult<ExportArtifact> {
        self.workbook.save(&self.target)?;
        Ok(ExportArtifact::File(self.target.clone()))
    }
}

// ==========================================
// CSV Writer 实现
// ==========================================
pub struct CsvSheetWriter {
    dir: PathBuf,
    prefix: Option<String>,
    sheets: Vec<(PathBuf, csv::Writer<File>)>,
}

impl CsvSheetWriter {
    /// 每个工作表写为 `<dir>/<sheet>.csv`
    pub fn to_dir<P: AsRef<Path>>(dir: P) -> ExportResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: None,
            sheets: Vec::new(),
        })
    }

    /// 每个工作表写为 `<dir>/<prefix>_<sheet>.csv`
    pub fn with_prefix<P: AsRef<Path>>(dir: P, prefix: &str) -> ExportResult<Self> {
        let mut writer = Self::to_dir(dir)?;
        writer.prefix = Some(prefix.to_string());
        Ok(writer)
    }

    fn file_name(&self, sheet_name: &str) -> String {
        let slug: String = sheet_name
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        match &self.prefix {
            Some(prefix) => format!("{}_{}.csv", prefix, slug),
            None => format!("{}.csv", slug),
        }
    }
}

impl SheetWriter for CsvSheetWriter {
    fn add_sheet(&mut self, name: &str, headers: &[&str]) -> ExportResult<SheetHandle> {
        let path = self.dir.join(self.file_name(name));
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(headers)?;
        self.sheets.push((path, writer));
        Ok(SheetHandle(self.sheets.len() - 1))
    }

    fn write_row(&mut self, sheet: SheetHandle, cells: &[Cell]) -> ExportResult<()> {
        let (_, writer) = self
            .sheets
            .get_mut(sheet.0)
            .ok_or(ExportError::UnknownSheet(sheet.0))?;
        writer.write_record(cells.iter().map(Cell::to_text))?;
        Ok(())
    }

    fn finish(&mut self) -> ExportResult<ExportArtifact> {
        let mut paths = Vec::with_capacity(self.sheets.len());
        for (path, writer) in self.sheets.iter_mut() {
            writer.flush()?;
            paths.push(path.clone());
        }
        Ok(ExportArtifact::Files(paths))
    }
}

// ==========================================
// 通用写出器（根据输出路径自动选择）
// ==========================================
pub struct UniversalSheetWriter;

impl UniversalSheetWriter {
    /// 根据输出路径选择写出器
    ///
    /// - `*.xlsx` → Excel 工作簿
    /// - `*.csv`  → 同目录下 `<文件名>_<工作表>.csv`
    /// - 无扩展名或已存在的目录 → 目录下每个工作表一个 CSV
    pub fn for_output<P: AsRef<Path>>(&self, output: P) -> ExportResult<Box<dyn SheetWriter>> {
        let path = output.as_ref();
        if path.is_dir() {
            return Ok(Box::new(CsvSheetWriter::to_dir(path)?));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xlsx" => Ok(Box::new(XlsxSheetWriter::to_path(path))),
            "csv" => {
                let dir = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("export");
                Ok(Box::new(CsvSheetWriter::with_prefix(dir, stem)?))
            }
            "" => Ok(Box::new(CsvSheetWriter::to_dir(path)?)),
            _ => Err(ExportError::UnsupportedFormat(ext)),
        }
    }
}
