// ==========================================
// BC 2.0 报关单查询系统 - 报关单实体
// ==========================================
// 对齐: bc20_header / bc20_data / bc20_barang / bc20_dokumen /
//       bc20_kontainer / bc20_entitas / bc20_pengangkut / bc20_pungutan
// 说明: 只读实体，由外部导入流程写入
// ==========================================

use crate::domain::types::{DutyType, EntityRole};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// DeclarationHeader - 报关单表头
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarationHeader {
    pub id: i64,
    pub nomor_aju: String,             // 申报编号
    pub nomor_daftar: Option<String>,  // 登记号 (PIB)
    pub tanggal_daftar: Option<NaiveDate>,
    pub kode_jalur: Option<String>,    // 查验通道 (H/K/M/P)
    pub nama_perusahaan: Option<String>,
    pub kode_kantor: Option<String>,
    pub nama_kantor: Option<String>,
    pub status_respon: Option<String>,
    pub kode_dokumen: Option<String>,
    pub kode_proses: Option<String>,
}

// ==========================================
// HeaderData - 表头扩展信息（一对一）
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeaderData {
    pub header_id: i64,
    pub netto: Option<f64>,
    pub bruto: Option<f64>,
    pub cif: Option<f64>,
    pub kode_valuta: Option<String>,
    pub ndpbm: Option<f64>, // 汇率 (NDPBM)
    pub tanggal_tiba: Option<NaiveDate>,
    pub pelabuhan_muat: Option<String>,
    pub pelabuhan_tujuan: Option<String>,
    pub nomor_bc11: Option<String>,
    pub tanggal_bc11: Option<NaiveDate>,
    pub pos_bc11: Option<String>,
    pub kode_tps: Option<String>,
    pub nama_tps: Option<String>,
}

impl HeaderData {
    /// CIF 折算本币金额（cif × ndpbm）
    pub fn cif_rupiah(&self) -> Option<f64> {
        match (self.cif, self.ndpbm) {
            (Some(cif), Some(rate)) => {
                let v = cif * rate;
                v.is_finite().then_some(v)
            }
            _ => None,
        }
    }
}

// ==========================================
// 明细子表
// ==========================================

/// 货物明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goods {
    pub id: i64,
    pub header_id: i64,
    pub seri_barang: i64,
    pub kode_hs: Option<String>,
    pub uraian: Option<String>,
    pub jumlah_satuan: Option<f64>,
    pub kode_satuan: Option<String>,
    pub cif: Option<f64>,
    pub jumlah_kemasan: Option<f64>,
    pub kode_kemasan: Option<String>,
    pub netto: Option<f64>,
    pub kode_negara_asal: Option<String>,
}

/// 随附单证
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub header_id: i64,
    pub seri: i64,
    pub kode_dokumen: Option<String>,
    pub nomor_dokumen: Option<String>,
    pub tanggal_dokumen: Option<NaiveDate>,
}

/// 集装箱
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: i64,
    pub header_id: i64,
    pub seri: i64,
    pub nomor_kontainer: Option<String>,
    pub kode_ukuran: Option<String>, // 20 / 40 / 45
    pub kode_tipe: Option<String>,
}

impl Container {
    /// 标准箱折算 (TEU): 20 尺 = 1，40/45 尺 = 2
    pub fn teu(&self) -> Option<u8> {
        match self.kode_ukuran.as_deref().map(str::trim) {
            Some("20") => Some(1),
            Some("40") | Some("45") => Some(2),
            _ => None,
        }
    }
}

/// 报关关联方
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyEntity {
    pub id: i64,
    pub header_id: i64,
    pub kode_entitas: String,
    pub nama: Option<String>,
    pub alamat: Option<String>,
    pub nomor_identitas: Option<String>, // NPWP / 证件号
    pub kode_negara: Option<String>,
}

impl PartyEntity {
    pub fn role(&self) -> Option<EntityRole> {
        EntityRole::from_code(&self.kode_entitas)
    }
}

/// 运输工具
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    pub id: i64,
    pub header_id: i64,
    pub seri: i64,
    pub kode_cara_angkut: Option<String>,
    pub nama_pengangkut: Option<String>,
    pub nomor_pengangkut: Option<String>,
    pub kode_bendera: Option<String>,
}

/// 税费
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duty {
    pub id: i64,
    pub header_id: i64,
    pub kode_jenis_pungutan: String,
    pub nilai_pungutan: Option<f64>,
    pub kode_fasilitas: Option<String>,
}

impl Duty {
    /// 可识别的税费类型；其它代码返回 None（不展示）
    pub fn duty_type(&self) -> Option<DutyType> {
        DutyType::from_code(&self.kode_jenis_pungutan)
    }
}

// ==========================================
// Declaration - 报关单聚合（表头 + 按需加载的子表）
// ==========================================
/// 报关单聚合
///
/// 子表集合只包含本次请求所需分区的数据，未加载的集合为空。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub header: DeclarationHeader,
    pub data: Option<HeaderData>,
    pub goods: Vec<Goods>,
    pub documents: Vec<Document>,
    pub containers: Vec<Container>,
    pub entities: Vec<PartyEntity>,
    pub carriers: Vec<Carrier>,
    pub duties: Vec<Duty>,
}

impl Declaration {
    pub fn new(header: DeclarationHeader) -> Self {
        Self {
            header,
            data: None,
            goods: Vec::new(),
            documents: Vec::new(),
            containers: Vec::new(),
            entities: Vec::new(),
            carriers: Vec::new(),
            duties: Vec::new(),
        }
    }

    /// 按角色取第一条关联方
    pub fn entity(&self, role: EntityRole) -> Option<&PartyEntity> {
        self.entities.iter().find(|e| e.role() == Some(role))
    }

    /// 第一条运输工具（BC 1.1 汇总使用）
    pub fn first_carrier(&self) -> Option<&Carrier> {
        self.carriers.first()
    }

    /// 可识别类型的税费
    pub fn recognized_duties(&self) -> impl Iterator<Item = &Duty> {
        self.duties.iter().filter(|d| d.duty_type().is_some())
    }

    /// 申报币种
    pub fn currency(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.kode_valuta.as_deref())
    }
}

/// 宽松日期解析：支持 `YYYY-MM-DD` 及带时间部分的 `YYYY-MM-DD HH:MM:SS`
pub fn parse_lenient_date(raw: Option<String>) -> Option<NaiveDate> {
    let raw = raw?;
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
