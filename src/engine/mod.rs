// ==========================================
// BC 2.0 报关单查询系统 - 引擎层
// ==========================================
// 职责: 字段注册表 / 规则树编译 / 展示行展开
// 红线: 引擎不访问数据库；SQL 文本只由编译器按注册表生成
// ==========================================

pub mod error;
pub mod field_registry;
pub mod predicate_compiler;
pub mod row_projection;

// 重导出核心引擎
pub use error::{MalformedReason, RuleError, RuleResult};
pub use field_registry::{
    Cardinality, FieldDescriptor, FieldRegistry, FieldScope, SourceTable, ValueType,
};
pub use predicate_compiler::{CompiledPredicate, PredicateCompiler, SqlValue};
pub use row_projection::{Cell, Column, DisplayRow, FlatLayout, RowProjector};
