use std::fs;
use tasky_core::{ConfigError, CoreConfig, KvStore};

#[test]
fn config_file_is_loaded_and_opens_its_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("board.db");
    let config_path = dir.path().join("tasky.json");
    let json = serde_json::json!({
        "log_level": "DEBUG",
        "database_path": db_path,
        "kanban_board_key": "sprint"
    });
    fs::write(&config_path, json.to_string()).unwrap();

    let config = CoreConfig::load(&config_path).unwrap();
    assert_eq!(config.kanban_base_key().unwrap().as_str(), "sprint");
    assert!(!config.init_logging().unwrap());

    let store = config.open_store().unwrap();
    store.set("probe", "1").unwrap();
    assert!(db_path.exists());
}

#[test]
fn missing_config_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    match CoreConfig::load(&path) {
        Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn relative_log_dir_is_rejected() {
    let err = CoreConfig::from_json_str(r#"{"log_dir": "logs"}"#).unwrap_err();
    assert!(err.to_string().contains("log_dir must be absolute"));
}
