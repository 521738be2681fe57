// ==========================================
// BC 2.0 报关单查询系统 - 报关单读取 Trait
// ==========================================
// 职责: 定义查询/导出所需的只读数据访问接口
// 实现者: DeclarationRepository（使用 rusqlite）
// ==========================================

use crate::domain::customs::Declaration;
use crate::domain::types::{Section, SortOrder};
use crate::engine::predicate_compiler::CompiledPredicate;
use crate::repository::error::RepositoryResult;

/// 子表加载范围
///
/// 只加载展示所需的子表，未加载的集合在 Declaration 中保持为空。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrationNeeds {
    pub data: bool,
    pub goods: bool,
    pub documents: bool,
    pub containers: bool,
    pub entities: bool,
    pub carriers: bool,
    pub duties: bool,
}

impl HydrationNeeds {
    /// 根据展示分区推导需要加载的子表
    pub fn for_sections(sections: &[Section]) -> Self {
        let mut needs = HydrationNeeds::default();
        for section in sections {
            match section {
                Section::General => needs.entities = true,
                Section::Values | Section::Warehouse => needs.data = true,
                Section::Bc11 => {
                    needs.data = true;
                    needs.carriers = true;
                }
                Section::Goods => {
                    // 单价后缀需要申报币种
                    needs.data = true;
                    needs.goods = true;
                }
                Section::Documents => needs.documents = true,
                Section::Containers => needs.containers = true,
                Section::Duties => needs.duties = true,
            }
        }
        needs
    }

    pub fn all() -> Self {
        Self {
            data: true,
            goods: true,
            documents: true,
            containers: true,
            entities: true,
            carriers: true,
            duties: true,
        }
    }
}

// ==========================================
// DeclarationReader Trait
// ==========================================
pub trait DeclarationReader: Send + Sync {
    /// 满足谓词的报关单数量
    fn count_matching(&self, predicate: &CompiledPredicate) -> RepositoryResult<i64>;

    /// 满足谓词的报关单 id（按排序规则，取 offset 起 limit 条）
    fn find_matching_ids(
        &self,
        predicate: &CompiledPredicate,
        order: &SortOrder,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<Vec<i64>>;

    /// 按 id 批量加载报关单（返回顺序与 ids 一致，不存在的 id 被跳过）
    fn load_declarations(
        &self,
        ids: &[i64],
        needs: &HydrationNeeds,
    ) -> RepositoryResult<Vec<Declaration>>;
}
