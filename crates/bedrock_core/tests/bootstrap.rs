use bedrock_core::db::TransactionMode;
use bedrock_core::{layered_resolver, transaction_manager_from, BootstrapError, ConfigError};
use std::fs;

#[test]
fn transaction_manager_uses_db_group_settings() {
    let root = tempfile::tempdir().unwrap();
    let db_path = root.path().join("data").join("app.db");
    fs::create_dir_all(db_path.parent().unwrap()).unwrap();
    fs::write(
        root.path().join("db.json"),
        format!(
            r#"{{"path": {}, "transaction_mode": "deferred"}}"#,
            serde_json::to_string(db_path.to_str().unwrap()).unwrap()
        ),
    )
    .unwrap();
    fs::create_dir_all(root.path().join("test")).unwrap();
    fs::write(
        root.path().join("test").join("db.toml"),
        "transaction_mode = \"immediate\"\n",
    )
    .unwrap();

    let resolver = layered_resolver(root.path(), Some("test"));
    let mut tm = transaction_manager_from(&resolver).unwrap();

    assert_eq!(tm.connection().mode(), TransactionMode::Immediate);
    tm.begin().unwrap();
    tm.connection()
        .execute_batch("CREATE TABLE t (v INTEGER); INSERT INTO t VALUES (1);")
        .unwrap();
    tm.commit().unwrap();
    assert!(db_path.exists());
}

#[test]
fn missing_db_group_falls_back_to_in_memory_defaults() {
    let root = tempfile::tempdir().unwrap();

    let resolver = layered_resolver(root.path(), None);
    let tm = transaction_manager_from(&resolver).unwrap();

    assert_eq!(tm.connection().mode(), TransactionMode::Deferred);
    assert_eq!(tm.depth(), 0);
}

#[test]
fn malformed_db_group_is_a_config_error() {
    let root = tempfile::tempdir().unwrap();
    fs::write(
        root.path().join("db.toml"),
        "busy_timeout_ms = \"soon\"\n",
    )
    .unwrap();

    let resolver = layered_resolver(root.path(), None);
    let err = transaction_manager_from(&resolver).unwrap_err();

    assert!(matches!(
        err,
        BootstrapError::Config(ConfigError::Decode { .. })
    ));
}

#[test]
fn log_group_without_dir_keeps_logging_off() {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("log.toml"), "level = \"warn\"\n").unwrap();

    let resolver = layered_resolver(root.path(), None);
    assert!(!bedrock_core::init_logging_from(&resolver).unwrap());
}
