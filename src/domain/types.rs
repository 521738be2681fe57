// ==========================================
// BC 2.0 报关单查询系统 - 通用类型
// ==========================================
// 职责: 展示分区、排序白名单、实体角色、税费类型、操作人
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Section - 展示/导出分区
// ==========================================
/// 展示/导出分区
///
/// 汇总分区（general/values/bc11/warehouse）每张报关单一行；
/// 明细分区（goods/documents/containers/duties）每条子记录一行。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    General,
    Values,
    Bc11,
    Warehouse,
    Goods,
    Documents,
    Containers,
    Duties,
}

impl Section {
    /// 全部分区（规范顺序）
    pub const ALL: [Section; 8] = [
        Section::General,
        Section::Values,
        Section::Bc11,
        Section::Warehouse,
        Section::Goods,
        Section::Documents,
        Section::Containers,
        Section::Duties,
    ];

    /// 明细分区展开优先级: containers > goods > documents > duties
    pub const ITEM_PRECEDENCE: [Section; 4] = [
        Section::Containers,
        Section::Goods,
        Section::Documents,
        Section::Duties,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::General => "general",
            Section::Values => "values",
            Section::Bc11 => "bc11",
            Section::Warehouse => "warehouse",
            Section::Goods => "goods",
            Section::Documents => "documents",
            Section::Containers => "containers",
            Section::Duties => "duties",
        }
    }

    /// 解析分区名（`basic` 为 `general` 的旧别名）
    pub fn parse(s: &str) -> Option<Section> {
        match s.trim().to_lowercase().as_str() {
            "general" | "basic" => Some(Section::General),
            "values" => Some(Section::Values),
            "bc11" => Some(Section::Bc11),
            "warehouse" => Some(Section::Warehouse),
            "goods" => Some(Section::Goods),
            "documents" => Some(Section::Documents),
            "containers" => Some(Section::Containers),
            "duties" => Some(Section::Duties),
            _ => None,
        }
    }

    /// 解析逗号分隔的分区列表
    ///
    /// # 返回
    /// - Ok(Vec<Section>): 去重并按规范顺序排列；空输入返回 [General]
    /// - Err(String): 第一个无法识别的分区名
    pub fn parse_list(raw: Option<&str>) -> Result<Vec<Section>, String> {
        let mut sections = Vec::new();
        for name in raw.unwrap_or("").split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let section = Section::parse(name).ok_or_else(|| name.to_string())?;
            if !sections.contains(&section) {
                sections.push(section);
            }
        }

        if sections.is_empty() {
            sections.push(Section::General);
        }
        sections.sort();
        Ok(sections)
    }

    /// 是否为明细分区（需要按子记录展开）
    pub fn is_item_section(&self) -> bool {
        matches!(
            self,
            Section::Goods | Section::Documents | Section::Containers | Section::Duties
        )
    }

    /// 导出工作表名称
    pub fn sheet_title(&self) -> &'static str {
        match self {
            Section::General => "Data Umum",
            Section::Values => "Nilai",
            Section::Bc11 => "BC 1.1",
            Section::Warehouse => "Gudang",
            Section::Goods => "Barang",
            Section::Documents => "Dokumen",
            Section::Containers => "Kontainer",
            Section::Duties => "Pungutan",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 排序白名单
// ==========================================
/// 可排序列（仅限报关单表头字段）
///
/// 子表字段（一对多）不允许排序：无法确定按哪条子记录的值排序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortColumn {
    NomorDaftar,
    TanggalDaftar,
    KodeJalur,
}

impl SortColumn {
    /// 对外字段名（与字段注册表一致）
    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::NomorDaftar => "nomordaftar",
            SortColumn::TanggalDaftar => "tanggaldaftar",
            SortColumn::KodeJalur => "kodejalur",
        }
    }

    /// 物理列（带表头别名 h）
    pub fn column_sql(&self) -> &'static str {
        match self {
            SortColumn::NomorDaftar => "h.nomor_daftar",
            SortColumn::TanggalDaftar => "h.tanggal_daftar",
            SortColumn::KodeJalur => "h.kode_jalur",
        }
    }

    pub fn parse(s: &str) -> Option<SortColumn> {
        match s.trim().to_lowercase().as_str() {
            "nomordaftar" | "nomor_daftar" => Some(SortColumn::NomorDaftar),
            "tanggaldaftar" | "tanggal_daftar" => Some(SortColumn::TanggalDaftar),
            "kodejalur" | "kode_jalur" => Some(SortColumn::KodeJalur),
            _ => None,
        }
    }
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// 非 desc 一律视为 asc
    pub fn parse(s: Option<&str>) -> SortDirection {
        match s.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "desc" => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

/// 排序规则（白名单列 + 方向，末尾固定追加 h.id 保证全序）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            column: SortColumn::NomorDaftar,
            direction: SortDirection::Asc,
        }
    }
}

impl SortOrder {
    /// 解析客户端排序参数
    ///
    /// # 返回
    /// - (SortOrder, bool): bool 为 true 表示 sort_by 不在白名单内，已回退到默认排序
    ///
    /// # 说明
    /// - 回退时方向也恢复默认（asc），结果与完全不传排序参数一致
    pub fn resolve(sort_by: Option<&str>, sort_direction: Option<&str>) -> (SortOrder, bool) {
        let sort_by = sort_by.map(str::trim).filter(|s| !s.is_empty());
        match sort_by {
            None => (
                SortOrder {
                    column: SortColumn::NomorDaftar,
                    direction: SortDirection::parse(sort_direction),
                },
                false,
            ),
            Some(name) => match SortColumn::parse(name) {
                Some(column) => (
                    SortOrder {
                        column,
                        direction: SortDirection::parse(sort_direction),
                    },
                    false,
                ),
                None => (SortOrder::default(), true),
            },
        }
    }

    /// ORDER BY 子句内容（不含 ORDER BY 关键字）
    pub fn to_sql(&self) -> String {
        let dir = match self.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        format!("{} {}, h.id {}", self.column.column_sql(), dir, dir)
    }
}

// ==========================================
// 报关实体角色 / 税费类型
// ==========================================
/// 报关单关联方角色（bc20_entitas.kode_entitas）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityRole {
    /// 进口商
    Importir,
    /// 报关代理 (PPJK)
    Ppjk,
    /// 货主
    Pemilik,
    /// 发货人
    Pengirim,
    /// 卖方
    Penjual,
}

impl EntityRole {
    pub fn code(&self) -> &'static str {
        match self {
            EntityRole::Importir => "1",
            EntityRole::Ppjk => "4",
            EntityRole::Pemilik => "7",
            EntityRole::Pengirim => "9",
            EntityRole::Penjual => "10",
        }
    }

    pub fn from_code(code: &str) -> Option<EntityRole> {
        match code.trim() {
            "1" => Some(EntityRole::Importir),
            "4" => Some(EntityRole::Ppjk),
            "7" => Some(EntityRole::Pemilik),
            "9" => Some(EntityRole::Pengirim),
            "10" => Some(EntityRole::Penjual),
            _ => None,
        }
    }
}

/// 可识别的税费类型（bc20_pungutan.kode_jenis_pungutan）
///
/// 其它代码的税费记录不展示、不导出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DutyType {
    /// 进口关税
    Bm,
    /// 增值税
    Ppn,
    /// 所得税
    Pph,
    /// 奢侈品增值税
    Ppnbm,
}

impl DutyType {
    pub const RECOGNIZED_CODES: [&'static str; 4] = ["BM", "PPN", "PPH", "PPNBM"];

    pub fn code(&self) -> &'static str {
        match self {
            DutyType::Bm => "BM",
            DutyType::Ppn => "PPN",
            DutyType::Pph => "PPH",
            DutyType::Ppnbm => "PPNBM",
        }
    }

    pub fn from_code(code: &str) -> Option<DutyType> {
        match code.trim().to_uppercase().as_str() {
            "BM" => Some(DutyType::Bm),
            "PPN" => Some(DutyType::Ppn),
            "PPH" => Some(DutyType::Pph),
            "PPNBM" => Some(DutyType::Ppnbm),
            _ => None,
        }
    }
}

// ==========================================
// 操作人（由上游认证网关注入）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn parse(s: &str) -> UserRole {
        match s.trim().to_lowercase().as_str() {
            "admin" | "administrator" | "super-admin" => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}

/// 当前请求的操作人
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_parse_list_alias_and_order() {
        let sections = Section::parse_list(Some("goods, basic,goods ,VALUES")).unwrap();
        assert_eq!(
            sections,
            vec![Section::General, Section::Values, Section::Goods]
        );
    }

    #[test]
    fn test_section_parse_list_default_and_unknown() {
        assert_eq!(Section::parse_list(None).unwrap(), vec![Section::General]);
        assert_eq!(Section::parse_list(Some(" , ")).unwrap(), vec![Section::General]);
        assert_eq!(
            Section::parse_list(Some("general,pabean")).unwrap_err(),
            "pabean"
        );
    }

    #[test]
    fn test_sort_order_fallback_for_child_column() {
        // 子表字段不在白名单内 → 回退默认排序
        let (order, fell_back) = SortOrder::resolve(Some("kodehs"), Some("desc"));
        assert!(fell_back);
        assert_eq!(order, SortOrder::default());

        let (order, fell_back) = SortOrder::resolve(Some("tanggaldaftar"), Some("DESC"));
        assert!(!fell_back);
        assert_eq!(order.column, SortColumn::TanggalDaftar);
        assert_eq!(order.direction, SortDirection::Desc);
        assert_eq!(order.to_sql(), "h.tanggal_daftar DESC, h.id DESC");
    }

    #[test]
    fn test_sort_direction_defaults_to_asc() {
        assert_eq!(SortDirection::parse(Some("sideways")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(None), SortDirection::Asc);
    }

    #[test]
    fn test_entity_role_and_duty_codes() {
        assert_eq!(EntityRole::from_code("10"), Some(EntityRole::Penjual));
        assert_eq!(EntityRole::Importir.code(), "1");
        assert_eq!(DutyType::from_code("ppn"), Some(DutyType::Ppn));
        assert_eq!(DutyType::from_code("CUKAI"), None);
    }
}
