// ==========================================
// QueryApi 集成测试
// ==========================================
// 测试范围:
// 1. 规则树 AND / OR / 嵌套组合，子表存在性语义
// 2. 分页: 页间不重叠、总数稳定、越界页
// 3. 平铺展开: 多货物多行、无货物占位行、单价派生
// 4. 排序白名单回退、重复执行结果一致
// 5. 校验错误: 空规则树、未知字段、运算符与类型不匹配
// ==========================================

mod helpers;

use std::collections::HashSet;

use bc20_query::api::{ApiError, QueryPage, QueryRequest};
use helpers::api_test_helper::ApiTestEnv;
use helpers::test_data_builder::{seed_four_declarations, DeclarationBuilder};
use serde_json::{json, Value};

fn env_with_fixture() -> ApiTestEnv {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed(seed_four_declarations).expect("写入夹具失败");
    env
}

fn request(rules: Value) -> QueryRequest {
    QueryRequest {
        rules,
        ..Default::default()
    }
}

fn header_ids(page: &QueryPage) -> Vec<i64> {
    page.data
        .iter()
        .map(|row| row["header_id"].as_i64().expect("header_id 缺失"))
        .collect()
}

fn all_declarations() -> Value {
    json!({"combinator": "and", "rules": [
        {"field": "nomoraju", "operator": "beginsWith", "value": "AJU"}
    ]})
}

// ==========================================
// 规则树语义
// ==========================================

#[test]
fn test_and_combinator_requires_all_conditions() {
    let env = env_with_fixture();
    let page = env
        .query_api
        .execute(&request(json!({"combinator": "and", "rules": [
            {"field": "kodejalur", "operator": "=", "value": "M"},
            {"field": "namaimportir", "operator": "contains", "value": "SINAR"}
        ]})))
        .expect("查询失败");

    assert_eq!(page.total, 1);
    assert_eq!(header_ids(&page), vec![1]);
}

#[test]
fn test_or_combinator_matches_any_condition() {
    let env = env_with_fixture();
    let page = env
        .query_api
        .execute(&request(json!({"combinator": "or", "rules": [
            {"field": "kodejalur", "operator": "=", "value": "K"},
            {"field": "namaimportir", "operator": "contains", "value": "KARYA"}
        ]})))
        .expect("查询失败");

    assert_eq!(page.total, 2);
    assert_eq!(header_ids(&page), vec![3, 4]);
}

#[test]
fn test_nested_group_with_child_table_condition() {
    let env = env_with_fixture();
    let page = env
        .query_api
        .execute(&request(json!({"combinator": "and", "rules": [
            {"field": "kodejalur", "operator": "in", "value": ["M", "H"]},
            {"combinator": "or", "rules": [
                {"field": "kodehs", "operator": "beginsWith", "value": "8471"},
                {"field": "ukurankontainer", "operator": "=", "value": "40"}
            ]}
        ]})))
        .expect("查询失败");

    // 报关单 3 无货物，报关单 4 通道为 K
    assert_eq!(header_ids(&page), vec![1, 2]);
}

#[test]
fn test_empty_negated_group_does_not_exclude_everything() {
    let env = env_with_fixture();
    let page = env
        .query_api
        .execute(&request(json!({"combinator": "and", "rules": [
            {"field": "kodejalur", "operator": "=", "value": "M"},
            {"combinator": "and", "not": true, "rules": []}
        ]})))
        .expect("查询失败");

    assert_eq!(page.total, 2);
    assert_eq!(header_ids(&page), vec![1, 3]);
}

#[test]
fn test_numeric_range_on_values_table() {
    let env = env_with_fixture();

    let page = env
        .query_api
        .execute(&request(json!({"rules": [
            {"field": "cif", "operator": ">", "value": 500}
        ]})))
        .expect("查询失败");
    assert_eq!(header_ids(&page), vec![1, 4]);

    let page = env
        .query_api
        .execute(&request(json!({"rules": [
            {"field": "cif", "operator": "between", "value": "100,800"}
        ]})))
        .expect("查询失败");
    assert_eq!(header_ids(&page), vec![2, 4]);
}

#[test]
fn test_negated_child_condition_keeps_existence_semantics() {
    let env = env_with_fixture();
    let page = env
        .query_api
        .execute(&request(json!({"rules": [
            {"field": "kodehs", "operator": "doesNotBeginWith", "value": "8471"}
        ]})))
        .expect("查询失败");

    // 存在至少一项不以 8471 开头的货物；无货物的报关单 3 不匹配
    assert_eq!(header_ids(&page), vec![1, 4]);
}

#[test]
fn test_scoped_entity_fields_do_not_leak_across_roles() {
    let env = env_with_fixture();
    let page = env
        .query_api
        .execute(&request(json!({"rules": [
            {"field": "namaimportir", "operator": "contains", "value": "PPJK"}
        ]})))
        .expect("查询失败");
    assert_eq!(page.total, 0);
    assert!(page.data.is_empty());

    let page = env
        .query_api
        .execute(&request(json!({"rules": [
            {"field": "namappjk", "operator": "contains", "value": "PPJK"}
        ]})))
        .expect("查询失败");
    assert_eq!(header_ids(&page), vec![1]);
}

// ==========================================
// 分页
// ==========================================

#[test]
fn test_pages_are_disjoint_and_total_is_stable() {
    let env = env_with_fixture();

    let mut seen = HashSet::new();
    for page_no in 1..=2 {
        let page = env
            .query_api
            .execute(&QueryRequest {
                rules: all_declarations(),
                page: Some(page_no),
                per_page: Some(3),
                ..Default::default()
            })
            .expect("查询失败");

        assert_eq!(page.total, 4);
        assert_eq!(page.last_page, 2);
        assert_eq!(page.per_page, 3);
        for id in header_ids(&page) {
            assert!(seen.insert(id), "报关单 {} 出现在多页中", id);
        }

        if page_no == 2 {
            assert_eq!(page.from, Some(4));
            assert_eq!(page.to, Some(4));
        } else {
            assert_eq!(page.from, Some(1));
            assert_eq!(page.to, Some(3));
        }
    }
    assert_eq!(seen.len(), 4);
}

#[test]
fn test_out_of_range_page_is_empty() {
    let env = env_with_fixture();
    let page = env
        .query_api
        .execute(&QueryRequest {
            rules: all_declarations(),
            page: Some(9),
            per_page: Some(3),
            ..Default::default()
        })
        .expect("查询失败");

    assert_eq!(page.total, 4);
    assert_eq!(page.current_page, 9);
    assert!(page.data.is_empty());
    assert_eq!(page.from, None);
    assert_eq!(page.to, None);
}

#[test]
fn test_per_page_is_clamped() {
    let env = env_with_fixture();
    let page = env
        .query_api
        .execute(&QueryRequest {
            rules: all_declarations(),
            per_page: Some(100_000),
            ..Default::default()
        })
        .expect("查询失败");
    assert_eq!(page.per_page, 100);

    let page = env
        .query_api
        .execute(&QueryRequest {
            rules: all_declarations(),
            per_page: Some(0),
            ..Default::default()
        })
        .expect("查询失败");
    assert_eq!(page.per_page, 1);
    assert_eq!(page.last_page, 4);
}

// ==========================================
// 平铺展开
// ==========================================

#[test]
fn test_goods_section_expands_one_row_per_item() {
    let env = env_with_fixture();
    let page = env
        .query_api
        .execute(&QueryRequest {
            rules: json!({"rules": [{"field": "nomordaftar", "operator": "=", "value": "000001"}]}),
            sections: Some("general,goods".to_string()),
            ..Default::default()
        })
        .expect("查询失败");

    // 计数按报关单，行数按货物
    assert_eq!(page.total, 1);
    assert_eq!(page.data.len(), 3);
    assert_eq!(page.from, Some(1));
    assert_eq!(page.to, Some(1));
    for row in &page.data {
        assert_eq!(row["header_id"], json!(1));
        assert_eq!(row["nama_importir"], json!("PT SINAR JAYA"));
    }
    let hs: Vec<&str> = page
        .data
        .iter()
        .map(|r| r["kode_hs"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(hs, vec!["84713010", "85176299", "39269099"]);
}

#[test]
fn test_declaration_without_goods_yields_placeholder_row() {
    let env = env_with_fixture();
    let page = env
        .query_api
        .execute(&QueryRequest {
            rules: json!({"rules": [{"field": "nomordaftar", "operator": "=", "value": "000003"}]}),
            sections: Some("goods".to_string()),
            ..Default::default()
        })
        .expect("查询失败");

    assert_eq!(page.data.len(), 1);
    let row = &page.data[0];
    assert_eq!(row["header_id"], json!(3));
    assert_eq!(row["kode_hs"], Value::Null);
    assert_eq!(row["harga_satuan"], Value::Null);
}

#[test]
fn test_unit_price_is_derived_with_currency() {
    let env = env_with_fixture();
    let page = env
        .query_api
        .execute(&QueryRequest {
            rules: json!({"rules": [{"field": "kodejalur", "operator": "in", "value": "M,K"}]}),
            sections: Some("goods".to_string()),
            ..Default::default()
        })
        .expect("查询失败");

    let price_of = |id: i64, hs: &str| -> Value {
        page.data
            .iter()
            .find(|r| r["header_id"] == json!(id) && r["kode_hs"] == json!(hs))
            .map(|r| r["harga_satuan"].clone())
            .expect("缺少货物行")
    };

    assert_eq!(price_of(1, "84713010"), json!("25.0000 USD"));
    assert_eq!(price_of(1, "85176299"), json!("30.0000 USD"));
    // 数量为 0 时单价为空
    assert_eq!(price_of(4, "52083900"), Value::Null);
}

#[test]
fn test_item_section_precedence_in_flat_view() {
    let env = env_with_fixture();
    let page = env
        .query_api
        .execute(&QueryRequest {
            rules: json!({"rules": [{"field": "nomordaftar", "operator": "=", "value": "000001"}]}),
            sections: Some("goods,containers".to_string()),
            ..Default::default()
        })
        .expect("查询失败");

    // 集装箱优先于货物展开：1 个集装箱 → 1 行
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0]["nomor_kontainer"], json!("MSKU0000001"));
    let keys: Vec<&str> = page.columns.iter().map(|c| c.key).collect();
    assert!(keys.contains(&"nomor_kontainer"));
    assert!(!keys.contains(&"kode_hs"));
}

// ==========================================
// 排序
// ==========================================

#[test]
fn test_sort_by_whitelisted_column() {
    let env = env_with_fixture();
    let page = env
        .query_api
        .execute(&QueryRequest {
            rules: all_declarations(),
            sort_by: Some("tanggaldaftar".to_string()),
            sort_direction: Some("desc".to_string()),
            ..Default::default()
        })
        .expect("查询失败");

    assert_eq!(header_ids(&page), vec![4, 3, 2, 1]);
    assert_eq!(page.sort_by, "tanggaldaftar");
    assert_eq!(page.sort_direction, "desc");
}

#[test]
fn test_unknown_sort_column_falls_back_to_default() {
    let env = env_with_fixture();
    let page = env
        .query_api
        .execute(&QueryRequest {
            rules: all_declarations(),
            sort_by: Some("nama_perusahaan; DROP TABLE bc20_header".to_string()),
            sort_direction: Some("desc".to_string()),
            ..Default::default()
        })
        .expect("查询失败");

    assert_eq!(page.sort_by, "nomordaftar");
    assert_eq!(page.sort_direction, "asc");
    assert_eq!(header_ids(&page), vec![1, 2, 3, 4]);
}

#[test]
fn test_repeated_execution_is_identical() {
    let env = env_with_fixture();
    let req = QueryRequest {
        rules: all_declarations(),
        sections: Some("general,values,goods".to_string()),
        per_page: Some(2),
        ..Default::default()
    };

    let first = serde_json::to_value(env.query_api.execute(&req).expect("查询失败"))
        .expect("序列化失败");
    let second = serde_json::to_value(env.query_api.execute(&req).expect("查询失败"))
        .expect("序列化失败");
    assert_eq!(first, second);
}

// ==========================================
// 校验错误
// ==========================================

#[test]
fn test_empty_rule_tree_is_rejected() {
    let env = env_with_fixture();
    let err = env
        .query_api
        .execute(&request(json!({"combinator": "and", "rules": []})))
        .unwrap_err();
    assert!(matches!(err, ApiError::EmptyQueryRejected));
    assert!(err.is_client_error());
}

#[test]
fn test_unknown_field_is_rejected() {
    let env = env_with_fixture();
    let err = env
        .query_api
        .execute(&request(json!({"rules": [
            {"field": "password", "operator": "=", "value": "x"}
        ]})))
        .unwrap_err();
    match err {
        ApiError::UnknownField { field } => assert_eq!(field, "password"),
        other => panic!("意外的错误: {:?}", other),
    }
}

#[test]
fn test_operator_not_allowed_for_type() {
    let env = env_with_fixture();
    let err = env
        .query_api
        .execute(&request(json!({"rules": [
            {"field": "kodejalur", "operator": "contains", "value": "M"}
        ]})))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidOperator { .. }));
}

#[test]
fn test_unknown_section_is_rejected() {
    let env = env_with_fixture();
    let err = env
        .query_api
        .execute(&QueryRequest {
            rules: all_declarations(),
            sections: Some("general,secret".to_string()),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn test_field_catalogue_lists_operators() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let fields = env.query_api.list_fields();

    let jalur = fields
        .iter()
        .find(|f| f.name == "kodejalur")
        .expect("缺少 kodejalur");
    assert_eq!(jalur.value_type, "enum");
    assert_eq!(jalur.values.as_deref(), Some(&["H", "K", "M", "P"][..]));
    assert!(jalur.operators.contains(&"in"));
    assert!(!jalur.operators.contains(&"contains"));
}

#[test]
fn test_large_result_counts_headers_not_rows() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed(|conn| {
        for id in 1..=25 {
            DeclarationBuilder::new(id)
                .jalur("H")
                .goods("84713010", 1.0, 10.0)
                .goods("84713020", 1.0, 10.0)
                .insert(conn)?;
        }
        Ok(())
    })
    .expect("写入失败");

    let page = env
        .query_api
        .execute(&QueryRequest {
            rules: json!({"rules": [{"field": "kodejalur", "operator": "=", "value": "H"}]}),
            sections: Some("goods".to_string()),
            per_page: Some(10),
            page: Some(3),
            ..Default::default()
        })
        .expect("查询失败");

    assert_eq!(page.total, 25);
    assert_eq!(page.last_page, 3);
    assert_eq!(page.from, Some(21));
    assert_eq!(page.to, Some(25));
    assert_eq!(page.data.len(), 10);
}
