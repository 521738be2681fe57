// ==========================================
// BC 2.0 报关单查询系统 - 领域模型层
// ==========================================
// 职责: 定义报关实体、规则树、规则集、通用枚举
// 红线: 不含数据访问逻辑,不含 SQL 生成逻辑
// ==========================================

pub mod customs;
pub mod rule;
pub mod rule_set;
pub mod types;

// 重导出核心类型
pub use customs::{
    Carrier, Container, Declaration, DeclarationHeader, Document, Duty, Goods, HeaderData,
    PartyEntity,
};
pub use rule::{Combinator, Condition, Operator, RuleGroup, RuleNode};
pub use rule_set::{RuleSet, RuleSetDraft};
pub use types::{
    Actor, DutyType, EntityRole, Section, SortColumn, SortDirection, SortOrder, UserRole,
};
