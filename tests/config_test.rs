// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证查询配置读取、默认值与修正逻辑
// ==========================================


use bc20_query::config::{config_keys, ConfigManager, QueryConfigReader, QuerySettings};
use test_helpers::{create_test_db, insert_test_config, open_test_connection};

#[tokio::test]
async fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[tokio::test]
async fn test_defaults_when_unset() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    let settings = config_manager
        .load_query_settings()
        .await
        .expect("Failed to load settings");
    assert_eq!(settings, QuerySettings::default());
}

#[tokio::test]
async fn test_overrides_are_read() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).expect("Failed to open db");
    insert_test_config(&conn, config_keys::QUERY_DEFAULT_PER_PAGE, "25").unwrap();
    insert_test_config(&conn, config_keys::EXPORT_BATCH_SIZE, "1000").unwrap();
    insert_test_config(&conn, config_keys::LOCALE, "en").unwrap();

    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    assert_eq!(config_manager.get_default_per_page().await.unwrap(), 25);
    assert_eq!(config_manager.get_export_batch_size().await.unwrap(), 1000);
    assert_eq!(config_manager.get_locale().await.unwrap(), "en");
}

#[tokio::test]
async fn test_malformed_values_fall_back_to_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).expect("Failed to open db");
    insert_test_config(&conn, config_keys::QUERY_MAX_PER_PAGE, "banyak").unwrap();
    insert_test_config(&conn, config_keys::LOCALE, "   ").unwrap();

    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    let defaults = QuerySettings::default();
    assert_eq!(
        config_manager.get_max_per_page().await.unwrap(),
        defaults.max_per_page
    );
    assert_eq!(config_manager.get_locale().await.unwrap(), defaults.locale);
}

#[tokio::test]
async fn test_loaded_settings_are_normalized() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).expect("Failed to open db");
    insert_test_config(&conn, config_keys::QUERY_DEFAULT_PER_PAGE, "500").unwrap();
    insert_test_config(&conn, config_keys::QUERY_MAX_PER_PAGE, "50").unwrap();
    insert_test_config(&conn, config_keys::EXPORT_BATCH_SIZE, "0").unwrap();

    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    let settings = config_manager.load_query_settings().await.unwrap();
    assert_eq!(settings.max_per_page, 50);
    assert_eq!(settings.default_per_page, 50);
    assert_eq!(settings.export_batch_size, 1);
}

#[test]
fn test_set_global_config_value_overwrites() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config_manager
        .set_global_config_value(config_keys::UNIT_PRICE_DECIMALS, "2")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::UNIT_PRICE_DECIMALS, "3")
        .unwrap();
    assert_eq!(
        config_manager
            .get_global_config_value(config_keys::UNIT_PRICE_DECIMALS)
            .unwrap()
            .as_deref(),
        Some("3")
    );
}
