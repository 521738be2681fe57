// ==========================================
// BC 2.0 报关单查询系统 - 规则集（已保存的查询）
// ==========================================
// 可见性: 公开规则集所有用户可见；私有规则集仅所有者与管理员可见
// ==========================================

use crate::domain::rule::RuleGroup;
use crate::domain::types::Actor;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 已保存的规则集
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub rules: RuleGroup,
    pub owner: String,
    pub is_public: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl RuleSet {
    /// 操作人是否可查看
    pub fn is_visible_to(&self, actor: &Actor) -> bool {
        self.is_public || actor.is_admin() || self.owner == actor.user_id
    }

    /// 操作人是否可修改/删除
    pub fn is_editable_by(&self, actor: &Actor) -> bool {
        actor.is_admin() || self.owner == actor.user_id
    }
}

/// 新建/更新规则集的请求体
///
/// `rules` 保持原始 JSON，在 API 层统一解析与校验。
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSetDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub rules: Value,
    #[serde(default)]
    pub is_public: bool,
}
