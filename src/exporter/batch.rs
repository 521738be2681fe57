// ==========================================
// BC 2.0 报关单查询系统 - 导出分批计划
// ==========================================
// 规则:
// - 先统计一次总数 N，批次数固定为 ceil(N / B)
// - 每批按与查询视图相同的排序读取 id（offset 递增，只前进）
// - iter() 可重复调用，每次都从第一批开始
// ==========================================

use crate::domain::types::SortOrder;
use crate::engine::predicate_compiler::CompiledPredicate;
use crate::repository::declaration_reader::DeclarationReader;
use crate::repository::error::RepositoryResult;

// ==========================================
// BatchPlan - 分批读取计划
// ==========================================
pub struct BatchPlan<'a> {
    reader: &'a dyn DeclarationReader,
    predicate: &'a CompiledPredicate,
    order: SortOrder,
    batch_size: usize,
    total: usize,
}

impl<'a> BatchPlan<'a> {
    /// 创建分批计划（执行一次 COUNT）
    ///
    /// # 参数
    /// - batch_size: 每批报关单数量，0 视为 1
    pub fn new(
        reader: &'a dyn DeclarationReader,
        predicate: &'a CompiledPredicate,
        order: SortOrder,
        batch_size: usize,
    ) -> RepositoryResult<Self> {
        let total = reader.count_matching(predicate)?.max(0) as usize;
        Ok(Self {
            reader,
            predicate,
            order,
            batch_size: batch_size.max(1),
            total,
        })
    }

    /// 满足条件的报关单总数
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 批次数 = ceil(total / batch_size)
    pub fn batch_count(&self) -> usize {
        self.total.div_ceil(self.batch_size)
    }

    /// 从第一批开始迭代
    pub fn iter(&self) -> BatchIter<'_, 'a> {
        BatchIter {
            plan: self,
            next_batch: 0,
            failed: false,
        }
    }
}

// ==========================================
// BatchIter - 批次迭代器
// ==========================================
/// 每次产出一批报关单 id；读取失败后不再继续产出
pub struct BatchIter<'p, 'a> {
    plan: &'p BatchPlan<'a>,
    next_batch: usize,
    failed: bool,
}

impl<'p, 'a> Iterator for BatchIter<'p, 'a> {
    type Item = RepositoryResult<Vec<i64>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next_batch >= self.plan.batch_count() {
            return None;
        }

        let offset = self.next_batch * self.plan.batch_size;
        self.next_batch += 1;

        let result = self.plan.reader.find_matching_ids(
            self.plan.predicate,
            &self.plan.order,
            self.plan.batch_size,
            offset,
        );
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.plan.batch_count().saturating_sub(self.next_batch);
        (0, Some(remaining))
    }
}
