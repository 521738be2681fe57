// ==========================================
// DashboardApi 集成测试
// ==========================================
// 测试范围:
// 1. 总量与 CIF 合计
// 2. 通道 / 月度 / 进口商分布
// 3. 登记日期范围过滤
// ==========================================

mod helpers;

use bc20_query::api::{ApiError, DashboardFilter};
use helpers::api_test_helper::ApiTestEnv;
use helpers::test_data_builder::{seed_four_declarations, DeclarationBuilder};

fn buckets(list: &[bc20_query::repository::CountBucket]) -> Vec<(&str, i64)> {
    list.iter().map(|b| (b.key.as_str(), b.count)).collect()
}

#[test]
fn test_summary_without_filter() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed(seed_four_declarations).expect("写入夹具失败");

    let summary = env
        .dashboard_api
        .summary(&DashboardFilter::default())
        .expect("统计失败");

    assert_eq!(summary.total_declarations, 4);
    assert!((summary.total_cif - 1950.0).abs() < 1e-9);
    assert_eq!(buckets(&summary.by_jalur), vec![("H", 1), ("K", 1), ("M", 2)]);
    assert_eq!(buckets(&summary.by_month), vec![("2024-01", 2), ("2024-02", 2)]);
    assert_eq!(
        buckets(&summary.top_importers),
        vec![("PT SINAR JAYA", 2), ("CV KARYA", 1), ("PT MAJU", 1)]
    );
}

#[test]
fn test_summary_with_date_range() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed(seed_four_declarations).expect("写入夹具失败");

    let summary = env
        .dashboard_api
        .summary(&DashboardFilter {
            date_from: Some("2024-02-01".to_string()),
            date_to: Some("2024-02-10".to_string()),
        })
        .expect("统计失败");

    assert_eq!(summary.total_declarations, 1);
    assert!((summary.total_cif - 50.0).abs() < 1e-9);
    assert_eq!(buckets(&summary.by_jalur), vec![("M", 1)]);
    assert_eq!(buckets(&summary.top_importers), vec![("CV KARYA", 1)]);
}

#[test]
fn test_unregistered_declarations_counted_without_month() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed(|conn| {
        DeclarationBuilder::new(1).tanggal("2024-03-01").insert(conn)?;
        DeclarationBuilder::new(2).insert(conn)?;
        Ok(())
    })
    .expect("写入失败");

    let summary = env
        .dashboard_api
        .summary(&DashboardFilter::default())
        .expect("统计失败");

    assert_eq!(summary.total_declarations, 2);
    assert_eq!(summary.total_cif, 0.0);
    // 通道为空记为 "-"
    assert_eq!(buckets(&summary.by_jalur), vec![("-", 2)]);
    assert_eq!(buckets(&summary.by_month), vec![("2024-03", 1)]);
    assert!(summary.top_importers.is_empty());
}

#[test]
fn test_invalid_date_range_rejected() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let err = env
        .dashboard_api
        .summary(&DashboardFilter {
            date_from: Some("2024-12-31".to_string()),
            date_to: Some("2024-01-01".to_string()),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}
