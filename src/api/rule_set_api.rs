// ==========================================
// BC 2.0 报关单查询系统 - 规则集 API
// ==========================================
// 职责: 规则集增删改查 + 可见性/所有权校验
// 约束: 保存前用同一编译器校验规则树，空规则树不允许保存
// ==========================================

use std::sync::Arc;

use chrono::{Local, NaiveDateTime, Timelike};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::rule::RuleGroup;
use crate::domain::rule_set::{RuleSet, RuleSetDraft};
use crate::domain::types::Actor;
use crate::engine::predicate_compiler::PredicateCompiler;
use crate::repository::rule_set_repo::RuleSetRepository;

/// 规则集名称最大长度（字符数）
pub const MAX_RULE_SET_NAME_LEN: usize = 120;

// ==========================================
// RuleSetApi - 规则集 API
// ==========================================
pub struct RuleSetApi {
    repo: Arc<RuleSetRepository>,
    compiler: PredicateCompiler,
}

impl RuleSetApi {
    pub fn new(repo: Arc<RuleSetRepository>) -> Self {
        Self {
            repo,
            compiler: PredicateCompiler::new(),
        }
    }

    /// 列出操作人可见的规则集（管理员可见全部）
    pub fn list(&self, actor: &Actor) -> ApiResult<Vec<RuleSet>> {
        let owner = if actor.is_admin() {
            None
        } else {
            Some(actor.user_id.as_str())
        };
        Ok(self.repo.list_visible_to(owner)?)
    }

    /// 查看单个规则集
    ///
    /// # 返回
    /// - Err(NotFound): 不存在
    /// - Err(Forbidden): 他人的私有规则集
    pub fn get(&self, actor: &Actor, id: &str) -> ApiResult<RuleSet> {
        load_visible(&self.repo, actor, id)
    }

    /// 新建规则集（所有者为操作人）
    pub fn create(&self, actor: &Actor, draft: RuleSetDraft) -> ApiResult<RuleSet> {
        let (name, description, rules) = self.validate_draft(&draft)?;

        let now = now_seconds();
        let rule_set = RuleSet {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            rules,
            owner: actor.user_id.clone(),
            is_public: draft.is_public,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(&rule_set)?;

        info!(
            rule_set_id = %rule_set.id,
            owner = %rule_set.owner,
            is_public = rule_set.is_public,
            "规则集已创建"
        );
        Ok(rule_set)
    }

    /// 更新规则集（仅所有者或管理员）
    pub fn update(&self, actor: &Actor, id: &str, draft: RuleSetDraft) -> ApiResult<RuleSet> {
        let existing = self.load_editable(actor, id)?;
        let (name, description, rules) = self.validate_draft(&draft)?;

        let updated = RuleSet {
            name,
            description,
            rules,
            is_public: draft.is_public,
            updated_at: now_seconds(),
            ..existing
        };
        if self.repo.update(&updated)? == 0 {
            return Err(ApiError::NotFound(format!("RuleSet(id={})", id)));
        }

        info!(rule_set_id = %id, actor = %actor.user_id, "规则集已更新");
        Ok(updated)
    }

    /// 删除规则集（仅所有者或管理员）
    pub fn delete(&self, actor: &Actor, id: &str) -> ApiResult<()> {
        self.load_editable(actor, id)?;
        if self.repo.delete(id)? == 0 {
            return Err(ApiError::NotFound(format!("RuleSet(id={})", id)));
        }
        info!(rule_set_id = %id, actor = %actor.user_id, "规则集已删除");
        Ok(())
    }

    fn load_editable(&self, actor: &Actor, id: &str) -> ApiResult<RuleSet> {
        let rule_set = load_visible(&self.repo, actor, id)?;
        if !rule_set.is_editable_by(actor) {
            warn!(rule_set_id = %id, actor = %actor.user_id, "非所有者尝试修改规则集");
            return Err(ApiError::Forbidden(format!(
                "规则集 {} 仅所有者或管理员可修改",
                id
            )));
        }
        Ok(rule_set)
    }

    // 名称非空且不超长；规则树可编译且非空
    fn validate_draft(
        &self,
        draft: &RuleSetDraft,
    ) -> ApiResult<(String, Option<String>, RuleGroup)> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("规则集名称不能为空".to_string()));
        }
        if name.chars().count() > MAX_RULE_SET_NAME_LEN {
            return Err(ApiError::InvalidInput(format!(
                "规则集名称不能超过 {} 个字符",
                MAX_RULE_SET_NAME_LEN
            )));
        }

        let rules = RuleGroup::from_json(&draft.rules)?;
        self.compiler.compile_for_execution(&rules)?;

        let description = draft
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok((name.to_string(), description, rules))
    }
}

// 与存储精度一致（秒）
fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// 读取操作人可见的规则集
pub(crate) fn load_visible(
    repo: &RuleSetRepository,
    actor: &Actor,
    id: &str,
) -> ApiResult<RuleSet> {
    let rule_set = repo
        .find_by_id(id)?
        .ok_or_else(|| ApiError::NotFound(format!("RuleSet(id={})", id)))?;
    if !rule_set.is_visible_to(actor) {
        return Err(ApiError::Forbidden(format!("规则集 {} 为私有", id)));
    }
    Ok(rule_set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::UserRole;
    use rusqlite::Connection;
    use serde_json::json;
    use std::sync::Mutex;

    fn api() -> RuleSetApi {
        let conn = Connection::open_in_memory().unwrap();
        let repo = RuleSetRepository::new(Arc::new(Mutex::new(conn)));
        RuleSetApi::new(Arc::new(repo))
    }

    fn draft(name: &str, is_public: bool) -> RuleSetDraft {
        RuleSetDraft {
            name: name.to_string(),
            description: Some("  ".to_string()),
            rules: json!({"combinator": "and", "rules": [
                {"field": "kodejalur", "operator": "=", "value": "M"}
            ]}),
            is_public,
        }
    }

    #[test]
    fn test_create_and_visibility() {
        let api = api();
        let alice = Actor::new("alice", UserRole::User);
        let bob = Actor::new("bob", UserRole::User);
        let admin = Actor::new("root", UserRole::Admin);

        let private = api.create(&alice, draft("Jalur merah", false)).unwrap();
        let public = api.create(&alice, draft("Publik", true)).unwrap();
        assert_eq!(private.description, None);

        assert_eq!(api.list(&alice).unwrap().len(), 2);
        let bob_view = api.list(&bob).unwrap();
        assert_eq!(bob_view.len(), 1);
        assert_eq!(bob_view[0].id, public.id);
        assert_eq!(api.list(&admin).unwrap().len(), 2);

        assert!(matches!(
            api.get(&bob, &private.id),
            Err(ApiError::Forbidden(_))
        ));
        assert!(api.get(&admin, &private.id).is_ok());
    }

    #[test]
    fn test_only_owner_or_admin_can_modify() {
        let api = api();
        let alice = Actor::new("alice", UserRole::User);
        let bob = Actor::new("bob", UserRole::User);
        let admin = Actor::new("root", UserRole::Admin);

        let rs = api.create(&alice, draft("Publik", true)).unwrap();
        assert!(matches!(
            api.update(&bob, &rs.id, draft("Diubah", true)),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(api.delete(&bob, &rs.id), Err(ApiError::Forbidden(_))));

        let updated = api.update(&admin, &rs.id, draft("Diubah", false)).unwrap();
        assert_eq!(updated.name, "Diubah");
        assert_eq!(updated.owner, "alice");
        assert_eq!(updated.created_at, rs.created_at);

        api.delete(&alice, &rs.id).unwrap();
        assert!(matches!(api.get(&alice, &rs.id), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_invalid_drafts_rejected() {
        let api = api();
        let alice = Actor::new("alice", UserRole::User);

        let err = api.create(&alice, draft("   ", false)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err = api.create(&alice, draft(&"x".repeat(121), false)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let mut bad = draft("Salah", false);
        bad.rules = json!({"rules": [{"field": "tidakada", "operator": "=", "value": 1}]});
        assert!(matches!(
            api.create(&alice, bad).unwrap_err(),
            ApiError::UnknownField { .. }
        ));

        let mut empty = draft("Kosong", false);
        empty.rules = json!({"combinator": "and", "rules": [{"rules": []}]});
        assert!(matches!(
            api.create(&alice, empty).unwrap_err(),
            ApiError::EmptyQueryRejected
        ));
    }
}
