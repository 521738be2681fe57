// ==========================================
// BC 2.0 报关单查询系统 - 字段注册表
// ==========================================
// 职责: 客户端字段名 → (物理表, 列, 值类型, 固定范围条件) 的唯一映射
// 红线: 只有注册表中的表名/列名会进入 SQL 文本（注入防护边界）
// ==========================================

use crate::domain::rule::Operator;
use crate::engine::error::{RuleError, RuleResult};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

// ==========================================
// SourceTable - 字段所在物理表
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTable {
    Header,
    Data,
    Goods,
    Documents,
    Containers,
    Entities,
    Carriers,
    Duties,
}

/// 相对表头的基数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Root,
    OneToOne,
    OneToMany,
}

impl SourceTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            SourceTable::Header => "bc20_header",
            SourceTable::Data => "bc20_data",
            SourceTable::Goods => "bc20_barang",
            SourceTable::Documents => "bc20_dokumen",
            SourceTable::Containers => "bc20_kontainer",
            SourceTable::Entities => "bc20_entitas",
            SourceTable::Carriers => "bc20_pengangkut",
            SourceTable::Duties => "bc20_pungutan",
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            SourceTable::Header => Cardinality::Root,
            SourceTable::Data => Cardinality::OneToOne,
            _ => Cardinality::OneToMany,
        }
    }
}

// ==========================================
// ValueType - 字段值类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Date,
    Enum(&'static [&'static str]),
}

const STRING_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::NotEq,
    Operator::Contains,
    Operator::BeginsWith,
    Operator::EndsWith,
    Operator::DoesNotContain,
    Operator::DoesNotBeginWith,
    Operator::DoesNotEndWith,
    Operator::In,
    Operator::NotIn,
    Operator::Null,
    Operator::NotNull,
];

const RANGE_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::NotEq,
    Operator::Lt,
    Operator::Gt,
    Operator::Lte,
    Operator::Gte,
    Operator::Between,
    Operator::NotBetween,
    Operator::Null,
    Operator::NotNull,
];

const ENUM_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::NotEq,
    Operator::In,
    Operator::NotIn,
    Operator::Null,
    Operator::NotNull,
];

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Date => "date",
            ValueType::Enum(_) => "enum",
        }
    }

    /// 该类型允许的运算符
    pub fn allowed_operators(&self) -> &'static [Operator] {
        match self {
            ValueType::String => STRING_OPERATORS,
            ValueType::Number | ValueType::Date => RANGE_OPERATORS,
            ValueType::Enum(_) => ENUM_OPERATORS,
        }
    }

    pub fn allows(&self, op: Operator) -> bool {
        self.allowed_operators().contains(&op)
    }

    pub fn enum_values(&self) -> Option<&'static [&'static str]> {
        match self {
            ValueType::Enum(values) => Some(values),
            _ => None,
        }
    }
}

/// 子表固定范围条件（如关联方角色、税费类型）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldScope {
    pub column: &'static str,
    pub value: &'static str,
}

// ==========================================
// FieldDescriptor - 字段描述
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub table: SourceTable,
    pub column: &'static str,
    pub value_type: ValueType,
    pub scope: Option<FieldScope>,
}

const JALUR_VALUES: &[&str] = &["H", "K", "M", "P"];
const UKURAN_VALUES: &[&str] = &["20", "40", "45"];
const PUNGUTAN_VALUES: &[&str] = &["BM", "PPN", "PPH", "PPNBM"];

const fn field(
    name: &'static str,
    label: &'static str,
    table: SourceTable,
    column: &'static str,
    value_type: ValueType,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        label,
        table,
        column,
        value_type,
        scope: None,
    }
}

const fn scoped(
    name: &'static str,
    label: &'static str,
    table: SourceTable,
    column: &'static str,
    value_type: ValueType,
    scope_column: &'static str,
    scope_value: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        label,
        table,
        column,
        value_type,
        scope: Some(FieldScope {
            column: scope_column,
            value: scope_value,
        }),
    }
}

use SourceTable as T;
use ValueType as V;

/// 全部可查询字段
pub const FIELDS: &[FieldDescriptor] = &[
    // ===== 表头 =====
    field("nomoraju", "Nomor Aju", T::Header, "nomor_aju", V::String),
    field("nomordaftar", "Nomor Pendaftaran (PIB)", T::Header, "nomor_daftar", V::String),
    field("tanggaldaftar", "Tanggal Pendaftaran", T::Header, "tanggal_daftar", V::Date),
    field("kodejalur", "Jalur", T::Header, "kode_jalur", V::Enum(JALUR_VALUES)),
    field("namaperusahaan", "Nama Perusahaan", T::Header, "nama_perusahaan", V::String),
    field("kodekantor", "Kode Kantor", T::Header, "kode_kantor", V::String),
    field("namakantor", "Nama Kantor", T::Header, "nama_kantor", V::String),
    field("statusrespon", "Status Respon", T::Header, "status_respon", V::String),
    field("kodedokumen", "Kode Dokumen", T::Header, "kode_dokumen", V::String),
    field("kodeproses", "Kode Proses", T::Header, "kode_proses", V::String),
    // ===== 表头扩展 =====
    field("netto", "Berat Bersih", T::Data, "netto", V::Number),
    field("bruto", "Berat Kotor", T::Data, "bruto", V::Number),
    field("cif", "Nilai CIF", T::Data, "cif", V::Number),
    field("kodevaluta", "Valuta", T::Data, "kode_valuta", V::String),
    field("ndpbm", "NDPBM", T::Data, "ndpbm", V::Number),
    field("tanggaltiba", "Tanggal Tiba", T::Data, "tanggal_tiba", V::Date),
    field("pelabuhanmuat", "Pelabuhan Muat", T::Data, "pelabuhan_muat", V::String),
    field("pelabuhantujuan", "Pelabuhan Tujuan", T::Data, "pelabuhan_tujuan", V::String),
    field("nomorbc11", "Nomor BC 1.1", T::Data, "nomor_bc11", V::String),
    field("tanggalbc11", "Tanggal BC 1.1", T::Data, "tanggal_bc11", V::Date),
    field("posbc11", "Pos BC 1.1", T::Data, "pos_bc11", V::String),
    field("kodetps", "Kode TPS", T::Data, "kode_tps", V::String),
    field("namatps", "Nama TPS", T::Data, "nama_tps", V::String),
    // ===== 货物 =====
    field("kodehs", "Kode HS", T::Goods, "kode_hs", V::String),
    field("uraianbarang", "Uraian Barang", T::Goods, "uraian", V::String),
    field("jumlahsatuan", "Jumlah Satuan", T::Goods, "jumlah_satuan", V::Number),
    field("kodesatuan", "Kode Satuan", T::Goods, "kode_satuan", V::String),
    field("cifbarang", "CIF Barang", T::Goods, "cif", V::Number),
    field("nettobarang", "Netto Barang", T::Goods, "netto", V::Number),
    field("kodekemasan", "Kode Kemasan", T::Goods, "kode_kemasan", V::String),
    field("kodenegaraasal", "Negara Asal", T::Goods, "kode_negara_asal", V::String),
    // ===== 单证 =====
    field("jenisdokumen", "Jenis Dokumen", T::Documents, "kode_dokumen", V::String),
    field("nomordokumen", "Nomor Dokumen", T::Documents, "nomor_dokumen", V::String),
    field("tanggaldokumen", "Tanggal Dokumen", T::Documents, "tanggal_dokumen", V::Date),
    // ===== 集装箱 =====
    field("nomorkontainer", "Nomor Kontainer", T::Containers, "nomor_kontainer", V::String),
    field("ukurankontainer", "Ukuran Kontainer", T::Containers, "kode_ukuran", V::Enum(UKURAN_VALUES)),
    field("tipekontainer", "Tipe Kontainer", T::Containers, "kode_tipe", V::String),
    // ===== 关联方（按角色限定）=====
    scoped("namaimportir", "Nama Importir", T::Entities, "nama", V::String, "kode_entitas", "1"),
    scoped("npwpimportir", "NPWP Importir", T::Entities, "nomor_identitas", V::String, "kode_entitas", "1"),
    scoped("alamatimportir", "Alamat Importir", T::Entities, "alamat", V::String, "kode_entitas", "1"),
    scoped("namappjk", "Nama PPJK", T::Entities, "nama", V::String, "kode_entitas", "4"),
    scoped("npwpppjk", "NPWP PPJK", T::Entities, "nomor_identitas", V::String, "kode_entitas", "4"),
    scoped("namapemilik", "Nama Pemilik Barang", T::Entities, "nama", V::String, "kode_entitas", "7"),
    scoped("namapengirim", "Nama Pengirim", T::Entities, "nama", V::String, "kode_entitas", "9"),
    scoped("negarapengirim", "Negara Pengirim", T::Entities, "kode_negara", V::String, "kode_entitas", "9"),
    scoped("namapenjual", "Nama Penjual", T::Entities, "nama", V::String, "kode_entitas", "10"),
    scoped("negarapenjual", "Negara Penjual", T::Entities, "kode_negara", V::String, "kode_entitas", "10"),
    // ===== 运输工具 =====
    field("namapengangkut", "Nama Sarana Angkut", T::Carriers, "nama_pengangkut", V::String),
    field("nomorpengangkut", "Nomor Voy/Flight", T::Carriers, "nomor_pengangkut", V::String),
    field("kodebendera", "Bendera", T::Carriers, "kode_bendera", V::String),
    field("caraangkut", "Cara Angkut", T::Carriers, "kode_cara_angkut", V::String),
    // ===== 税费 =====
    field("jenispungutan", "Jenis Pungutan", T::Duties, "kode_jenis_pungutan", V::Enum(PUNGUTAN_VALUES)),
    scoped("nilaibm", "Nilai BM", T::Duties, "nilai_pungutan", V::Number, "kode_jenis_pungutan", "BM"),
    scoped("nilaippn", "Nilai PPN", T::Duties, "nilai_pungutan", V::Number, "kode_jenis_pungutan", "PPN"),
    scoped("nilaipph", "Nilai PPh", T::Duties, "nilai_pungutan", V::Number, "kode_jenis_pungutan", "PPH"),
    scoped("nilaippnbm", "Nilai PPnBM", T::Duties, "nilai_pungutan", V::Number, "kode_jenis_pungutan", "PPNBM"),
];

// ==========================================
// FieldRegistry - 字段注册表
// ==========================================
/// 字段注册表（进程内只读，首次使用时构建）
pub struct FieldRegistry {
    fields: &'static [FieldDescriptor],
    index: HashMap<&'static str, usize>,
}

static GLOBAL_REGISTRY: OnceLock<FieldRegistry> = OnceLock::new();

impl FieldRegistry {
    pub fn new(fields: &'static [FieldDescriptor]) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name, i))
            .collect();
        Self { fields, index }
    }

    /// 全局注册表
    pub fn global() -> &'static FieldRegistry {
        GLOBAL_REGISTRY.get_or_init(|| FieldRegistry::new(FIELDS))
    }

    /// 解析字段名（精确匹配，区分大小写）
    pub fn resolve(&self, name: &str) -> RuleResult<&FieldDescriptor> {
        self.index
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| RuleError::UnknownField {
                field: name.to_string(),
            })
    }

    /// 全部字段（注册顺序）
    pub fn fields(&self) -> &'static [FieldDescriptor] {
        self.fields
    }
}
