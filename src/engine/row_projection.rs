// ==========================================
// BC 2.0 报关单查询系统 - 行展开与展示列
// ==========================================
// 规则:
// - 每行固定以标识列开头: 申报编号 / 登记号 / 登记日期
// - 汇总分区 (general/values/bc11/warehouse): 每张报关单一行
// - 明细分区 (goods/documents/containers/duties): 每条子记录一行；
//   无子记录时输出一行空明细占位行，不会丢失报关单
// - 平铺视图只展开一个明细分区，优先级 containers > goods > documents > duties
// ==========================================

use crate::domain::customs::Declaration;
use crate::domain::types::{EntityRole, Section};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

// ==========================================
// Cell / Column / DisplayRow
// ==========================================

/// 单元格值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn text(v: Option<&str>) -> Cell {
        match v.map(str::trim) {
            Some(s) if !s.is_empty() => Cell::Text(s.to_string()),
            _ => Cell::Empty,
        }
    }

    fn number(v: Option<f64>) -> Cell {
        match v {
            Some(n) if n.is_finite() => Cell::Number(n),
            _ => Cell::Empty,
        }
    }

    fn date(v: Option<NaiveDate>) -> Cell {
        v.map(|d| Cell::Text(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Cell::Empty)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// 文本形式（CSV 输出）
    pub fn to_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Empty => String::new(),
        }
    }
}

/// 展示列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
}

const fn col(key: &'static str, label: &'static str) -> Column {
    Column { key, label }
}

/// 展示行（一张报关单可展开为多行）
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub header_id: i64,
    pub cells: Vec<Cell>,
}

impl DisplayRow {
    /// 按列定义转为 JSON 对象
    pub fn to_json(&self, columns: &[Column]) -> Value {
        let mut obj = Map::with_capacity(columns.len() + 1);
        obj.insert("header_id".to_string(), Value::from(self.header_id));
        for (column, cell) in columns.iter().zip(self.cells.iter()) {
            let v = serde_json::to_value(cell).unwrap_or(Value::Null);
            obj.insert(column.key.to_string(), v);
        }
        Value::Object(obj)
    }
}

// ==========================================
// 列定义
// ==========================================

const IDENTITY_COLUMNS: &[Column] = &[
    col("nomor_aju", "Nomor Aju"),
    col("nomor_daftar", "Nomor PIB"),
    col("tanggal_daftar", "Tanggal PIB"),
];

const GENERAL_COLUMNS: &[Column] = &[
    col("kode_jalur", "Jalur"),
    col("nama_perusahaan", "Perusahaan"),
    col("nama_kantor", "Kantor Pabean"),
    col("status_respon", "Status"),
    col("kode_dokumen", "Kode Dokumen"),
    col("nama_importir", "Importir"),
    col("npwp_importir", "NPWP Importir"),
    col("nama_ppjk", "PPJK"),
];

const VALUES_COLUMNS: &[Column] = &[
    col("netto", "Netto (Kg)"),
    col("bruto", "Bruto (Kg)"),
    col("cif", "CIF"),
    col("kode_valuta", "Valuta"),
    col("ndpbm", "NDPBM"),
    col("cif_rupiah", "CIF (Rp)"),
];

const BC11_COLUMNS: &[Column] = &[
    col("nomor_bc11", "Nomor BC 1.1"),
    col("tanggal_bc11", "Tanggal BC 1.1"),
    col("pos_bc11", "Pos BC 1.1"),
    col("nama_pengangkut", "Sarana Angkut"),
    col("nomor_pengangkut", "Voy/Flight"),
    col("tanggal_tiba", "Tanggal Tiba"),
    col("pelabuhan_muat", "Pelabuhan Muat"),
    col("pelabuhan_tujuan", "Pelabuhan Tujuan"),
];

const WAREHOUSE_COLUMNS: &[Column] = &[col("kode_tps", "Kode TPS"), col("nama_tps", "Nama TPS")];

const GOODS_COLUMNS: &[Column] = &[
    col("seri_barang", "Seri Barang"),
    col("kode_hs", "Kode HS"),
    col("uraian", "Uraian Barang"),
    col("jumlah_satuan", "Jumlah Satuan"),
    col("kode_satuan", "Satuan"),
    col("jumlah_kemasan", "Jumlah Kemasan"),
    col("kode_kemasan", "Kemasan"),
    col("netto_barang", "Netto Barang"),
    col("cif_barang", "CIF Barang"),
    col("harga_satuan", "Harga Satuan"),
    col("negara_asal", "Negara Asal"),
];

const DOCUMENTS_COLUMNS: &[Column] = &[
    col("seri_dokumen", "Seri Dokumen"),
    col("jenis_dokumen", "Jenis Dokumen"),
    col("nomor_dokumen", "Nomor Dokumen"),
    col("tanggal_dokumen", "Tanggal Dokumen"),
];

const CONTAINERS_COLUMNS: &[Column] = &[
    col("seri_kontainer", "Seri Kontainer"),
    col("nomor_kontainer", "Nomor Kontainer"),
    col("ukuran_kontainer", "Ukuran"),
    col("tipe_kontainer", "Tipe"),
    col("teu", "TEU"),
];

const DUTIES_COLUMNS: &[Column] = &[
    col("jenis_pungutan", "Jenis Pungutan"),
    col("nilai_pungutan", "Nilai"),
    col("kode_fasilitas", "Fasilitas"),
];

/// 分区专属列（不含标识列）
pub fn section_columns(section: Section) -> &'static [Column] {
    match section {
        Section::General => GENERAL_COLUMNS,
        Section::Values => VALUES_COLUMNS,
        Section::Bc11 => BC11_COLUMNS,
        Section::Warehouse => WAREHOUSE_COLUMNS,
        Section::Goods => GOODS_COLUMNS,
        Section::Documents => DOCUMENTS_COLUMNS,
        Section::Containers => CONTAINERS_COLUMNS,
        Section::Duties => DUTIES_COLUMNS,
    }
}

pub fn identity_columns() -> &'static [Column] {
    IDENTITY_COLUMNS
}

// ==========================================
// FlatLayout - 平铺视图的分区组合
// ==========================================
/// 平铺视图布局
///
/// 多个明细分区同时请求时只展开优先级最高的一个，其余明细分区被忽略。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatLayout {
    pub summary: Vec<Section>,
    pub item: Option<Section>,
}

impl FlatLayout {
    pub fn for_sections(sections: &[Section]) -> Self {
        let summary = sections
            .iter()
            .copied()
            .filter(|s| !s.is_item_section())
            .collect();
        let item = Section::ITEM_PRECEDENCE
            .iter()
            .copied()
            .find(|s| sections.contains(s));
        Self { summary, item }
    }

    /// 实际参与展示的分区（用于决定子表加载范围）
    pub fn sections(&self) -> Vec<Section> {
        let mut out = self.summary.clone();
        out.extend(self.item);
        out
    }

    pub fn columns(&self) -> Vec<Column> {
        let mut columns = IDENTITY_COLUMNS.to_vec();
        for s in &self.summary {
            columns.extend_from_slice(section_columns(*s));
        }
        if let Some(item) = self.item {
            columns.extend_from_slice(section_columns(item));
        }
        columns
    }
}

// ==========================================
// 派生字段
// ==========================================

/// 货物单价 = CIF / 数量
///
/// 数量为空或为 0、CIF 为空、结果非有限数时返回 None。
///
/// # 示例
/// ```
/// use bc20_query::engine::row_projection::format_unit_price;
/// assert_eq!(format_unit_price(Some(100.0), Some(4.0), 4, Some("USD")).as_deref(), Some("25.0000 USD"));
/// assert_eq!(format_unit_price(Some(100.0), Some(0.0), 4, Some("USD")), None);
/// ```
pub fn format_unit_price(
    cif: Option<f64>,
    quantity: Option<f64>,
    decimals: usize,
    currency: Option<&str>,
) -> Option<String> {
    let quantity = quantity.filter(|q| *q != 0.0)?;
    let price = cif? / quantity;
    if !price.is_finite() {
        return None;
    }
    let formatted = format!("{:.*}", decimals, price);
    match currency.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => Some(format!("{} {}", formatted, c)),
        None => Some(formatted),
    }
}

// ==========================================
// RowProjector - 报关单 → 展示行
// ==========================================
pub struct RowProjector {
    unit_price_decimals: usize,
}

impl Default for RowProjector {
    fn default() -> Self {
        Self::new(4)
    }
}

impl RowProjector {
    pub fn new(unit_price_decimals: usize) -> Self {
        Self {
            unit_price_decimals,
        }
    }

    /// 单个分区的列（含标识列）
    pub fn columns_for_section(&self, section: Section) -> Vec<Column> {
        let mut columns = IDENTITY_COLUMNS.to_vec();
        columns.extend_from_slice(section_columns(section));
        columns
    }

    /// 单个分区的展示行（多工作表导出）
    pub fn rows_for_section(&self, decl: &Declaration, section: Section) -> Vec<DisplayRow> {
        let identity = identity_cells(decl);
        if !section.is_item_section() {
            let mut cells = identity;
            cells.extend(self.summary_cells(decl, section));
            return vec![DisplayRow {
                header_id: decl.header.id,
                cells,
            }];
        }
        self.expand_items(decl, identity, section)
    }

    /// 平铺视图展示行
    pub fn flat_rows(&self, decl: &Declaration, layout: &FlatLayout) -> Vec<DisplayRow> {
        let mut base = identity_cells(decl);
        for s in &layout.summary {
            base.extend(self.summary_cells(decl, *s));
        }
        match layout.item {
            None => vec![DisplayRow {
                header_id: decl.header.id,
                cells: base,
            }],
            Some(item) => self.expand_items(decl, base, item),
        }
    }

    fn expand_items(&self, decl: &Declaration, base: Vec<Cell>, section: Section) -> Vec<DisplayRow> {
        let items = self.item_cells(decl, section);
        if items.is_empty() {
            let mut cells = base;
            cells.extend(std::iter::repeat(Cell::Empty).take(section_columns(section).len()));
            return vec![DisplayRow {
                header_id: decl.header.id,
                cells,
            }];
        }
        items
            .into_iter()
            .map(|item| {
                let mut cells = base.clone();
                cells.extend(item);
                DisplayRow {
                    header_id: decl.header.id,
                    cells,
                }
            })
            .collect()
    }

    fn summary_cells(&self, decl: &Declaration, section: Section) -> Vec<Cell> {
        let h = &decl.header;
        let data = decl.data.as_ref();
        match section {
            Section::General => {
                let importer = decl.entity(EntityRole::Importir);
                let ppjk = decl.entity(EntityRole::Ppjk);
                vec![
                    Cell::text(h.kode_jalur.as_deref()),
                    Cell::text(h.nama_perusahaan.as_deref()),
                    Cell::text(h.nama_kantor.as_deref()),
                    Cell::text(h.status_respon.as_deref()),
                    Cell::text(h.kode_dokumen.as_deref()),
                    Cell::text(importer.and_then(|e| e.nama.as_deref())),
                    Cell::text(importer.and_then(|e| e.nomor_identitas.as_deref())),
                    Cell::text(ppjk.and_then(|e| e.nama.as_deref())),
                ]
            }
            Section::Values => vec![
                Cell::number(data.and_then(|d| d.netto)),
                Cell::number(data.and_then(|d| d.bruto)),
                Cell::number(data.and_then(|d| d.cif)),
                Cell::text(data.and_then(|d| d.kode_valuta.as_deref())),
                Cell::number(data.and_then(|d| d.ndpbm)),
                Cell::number(data.and_then(|d| d.cif_rupiah())),
            ],
            Section::Bc11 => {
                let carrier = decl.first_carrier();
                vec![
                    Cell::text(data.and_then(|d| d.nomor_bc11.as_deref())),
                    Cell::date(data.and_then(|d| d.tanggal_bc11)),
                    Cell::text(data.and_then(|d| d.pos_bc11.as_deref())),
                    Cell::text(carrier.and_then(|c| c.nama_pengangkut.as_deref())),
                    Cell::text(carrier.and_then(|c| c.nomor_pengangkut.as_deref())),
                    Cell::date(data.and_then(|d| d.tanggal_tiba)),
                    Cell::text(data.and_then(|d| d.pelabuhan_muat.as_deref())),
                    Cell::text(data.and_then(|d| d.pelabuhan_tujuan.as_deref())),
                ]
            }
            Section::Warehouse => vec![
                Cell::text(data.and_then(|d| d.kode_tps.as_deref())),
                Cell::text(data.and_then(|d| d.nama_tps.as_deref())),
            ],
            _ => Vec::new(),
        }
    }

    fn item_cells(&self, decl: &Declaration, section: Section) -> Vec<Vec<Cell>> {
        match section {
            Section::Goods => {
                let currency = decl.currency();
                decl.goods
                    .iter()
                    .map(|g| {
                        let unit_price = format_unit_price(
                            g.cif,
                            g.jumlah_satuan,
                            self.unit_price_decimals,
                            currency,
                        );
                        vec![
                            Cell::Number(g.seri_barang as f64),
                            Cell::text(g.kode_hs.as_deref()),
                            Cell::text(g.uraian.as_deref()),
                            Cell::number(g.jumlah_satuan),
                            Cell::text(g.kode_satuan.as_deref()),
                            Cell::number(g.jumlah_kemasan),
                            Cell::text(g.kode_kemasan.as_deref()),
                            Cell::number(g.netto),
                            Cell::number(g.cif),
                            Cell::text(unit_price.as_deref()),
                            Cell::text(g.kode_negara_asal.as_deref()),
                        ]
                    })
                    .collect()
            }
            Section::Documents => decl
                .documents
                .iter()
                .map(|d| {
                    vec![
                        Cell::Number(d.seri as f64),
                        Cell::text(d.kode_dokumen.as_deref()),
                        Cell::text(d.nomor_dokumen.as_deref()),
                        Cell::date(d.tanggal_dokumen),
                    ]
                })
                .collect(),
            Section::Containers => decl
                .containers
                .iter()
                .map(|c| {
                    vec![
                        Cell::Number(c.seri as f64),
                        Cell::text(c.nomor_kontainer.as_deref()),
                        Cell::text(c.kode_ukuran.as_deref()),
                        Cell::text(c.kode_tipe.as_deref()),
                        c.teu().map(|t| Cell::Number(f64::from(t))).unwrap_or(Cell::Empty),
                    ]
                })
                .collect(),
            Section::Duties => decl
                .recognized_duties()
                .map(|d| {
                    vec![
                        Cell::text(Some(d.kode_jenis_pungutan.as_str())),
                        Cell::number(d.nilai_pungutan),
                        Cell::text(d.kode_fasilitas.as_deref()),
                    ]
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn identity_cells(decl: &Declaration) -> Vec<Cell> {
    let h = &decl.header;
    vec![
        Cell::text(Some(h.nomor_aju.as_str())),
        Cell::text(h.nomor_daftar.as_deref()),
        Cell::date(h.tanggal_daftar),
    ]
}
