// ==========================================
// RuleSetApi 集成测试
// ==========================================
// 测试范围:
// 1. 规则集持久化与读取（规则树往返）
// 2. 公开 / 私有可见性与所有权
// 3. 执行已保存的规则集
// ==========================================

mod helpers;

use bc20_query::api::{ApiError, QueryRequest};
use bc20_query::domain::{Actor, RuleSetDraft, UserRole};
use helpers::api_test_helper::ApiTestEnv;
use helpers::test_data_builder::seed_four_declarations;
use serde_json::json;

fn jalur_merah(is_public: bool) -> RuleSetDraft {
    RuleSetDraft {
        name: "Jalur merah SINAR".to_string(),
        description: Some("Importir SINAR di jalur merah".to_string()),
        rules: json!({"combinator": "and", "rules": [
            {"field": "kodejalur", "operator": "=", "value": "M"},
            {"combinator": "or", "rules": [
                {"field": "namaimportir", "operator": "contains", "value": "SINAR"},
                {"field": "kodehs", "operator": "beginsWith", "value": "8471"}
            ]}
        ]}),
        is_public,
    }
}

#[test]
fn test_rule_set_persists_rule_tree() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let alice = Actor::new("alice", UserRole::User);

    let created = env
        .rule_set_api
        .create(&alice, jalur_merah(false))
        .expect("创建失败");
    let loaded = env.rule_set_api.get(&alice, &created.id).expect("读取失败");

    assert_eq!(loaded, created);
    assert_eq!(loaded.owner, "alice");
    assert_eq!(loaded.rules.condition_count(), 3);
}

#[test]
fn test_private_rule_set_hidden_from_other_users() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let alice = Actor::new("alice", UserRole::User);
    let bob = Actor::new("bob", UserRole::User);

    let private = env
        .rule_set_api
        .create(&alice, jalur_merah(false))
        .expect("创建失败");
    let public = env
        .rule_set_api
        .create(&bob, jalur_merah(true))
        .expect("创建失败");

    let alice_view: Vec<String> = env
        .rule_set_api
        .list(&alice)
        .expect("列表失败")
        .into_iter()
        .map(|rs| rs.id)
        .collect();
    assert!(alice_view.contains(&private.id));
    assert!(alice_view.contains(&public.id));

    let bob_view = env.rule_set_api.list(&bob).expect("列表失败");
    assert_eq!(bob_view.len(), 1);
    assert_eq!(bob_view[0].id, public.id);

    assert!(matches!(
        env.rule_set_api.get(&bob, &private.id),
        Err(ApiError::Forbidden(_))
    ));
    assert!(matches!(
        env.rule_set_api.get(&bob, "tidak-ada"),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_public_rule_set_is_read_only_for_others() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let alice = Actor::new("alice", UserRole::User);
    let bob = Actor::new("bob", UserRole::User);

    let rs = env
        .rule_set_api
        .create(&alice, jalur_merah(true))
        .expect("创建失败");

    assert!(env.rule_set_api.get(&bob, &rs.id).is_ok());
    assert!(matches!(
        env.rule_set_api.update(&bob, &rs.id, jalur_merah(false)),
        Err(ApiError::Forbidden(_))
    ));
    assert!(matches!(
        env.rule_set_api.delete(&bob, &rs.id),
        Err(ApiError::Forbidden(_))
    ));

    // 所有者改为私有后他人不可见
    env.rule_set_api
        .update(&alice, &rs.id, jalur_merah(false))
        .expect("更新失败");
    assert!(matches!(
        env.rule_set_api.get(&bob, &rs.id),
        Err(ApiError::Forbidden(_))
    ));
}

#[test]
fn test_execute_saved_rule_set() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed(seed_four_declarations).expect("写入夹具失败");
    let alice = Actor::new("alice", UserRole::User);
    let bob = Actor::new("bob", UserRole::User);
    let admin = Actor::new("root", UserRole::Admin);

    let rs = env
        .rule_set_api
        .create(&alice, jalur_merah(false))
        .expect("创建失败");

    let page = env
        .query_api
        .execute_rule_set(&alice, &rs.id, &QueryRequest::default())
        .expect("执行失败");
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0]["header_id"], json!(1));

    // 与直接提交相同规则树的结果一致
    let direct = env
        .query_api
        .execute(&QueryRequest {
            rules: jalur_merah(false).rules,
            ..Default::default()
        })
        .expect("执行失败");
    assert_eq!(page.data, direct.data);

    assert!(matches!(
        env.query_api
            .execute_rule_set(&bob, &rs.id, &QueryRequest::default()),
        Err(ApiError::Forbidden(_))
    ));
    assert!(env
        .query_api
        .execute_rule_set(&admin, &rs.id, &QueryRequest::default())
        .is_ok());
}

#[test]
fn test_invalid_rule_tree_is_not_saved() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let alice = Actor::new("alice", UserRole::User);

    let mut draft = jalur_merah(false);
    draft.rules = json!({"rules": [{"field": "cif", "operator": "between", "value": [1]}]});
    let err = env.rule_set_api.create(&alice, draft).unwrap_err();
    assert!(matches!(err, ApiError::MalformedRuleTree { .. }));

    assert!(env.rule_set_api.list(&alice).expect("列表失败").is_empty());
}
