use figment::providers::Env;
use ocrfind::config::{Config, ConfigError};
use ocrfind::merge::{MergeLayout, OriginalPlacement};
use ocrfind::search::StopPolicy;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_config_load_from_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
dated_roots = ['\\ronsin158\ocr_processed\{year}']
archive_roots = ['\\ronsin158\ocr_processed']
override_dir = 'X:\xray'
stop_policy = "exhaustive"
layout = "flat"
original = "keep"
recent_days = 90
phases = ["recent-days", "full-archive"]
"#,
    )
    .unwrap();

    let config: Config = Config::figment(Some(&path)).unwrap().extract().unwrap();

    assert_eq!(config.dated_roots, vec![r"\\ronsin158\ocr_processed\{year}"]);
    assert_eq!(config.override_dir, Some(PathBuf::from(r"X:\xray")));
    assert_eq!(config.stop_policy, StopPolicy::Exhaustive);
    assert_eq!(config.layout, MergeLayout::Flat);
    assert_eq!(config.original, OriginalPlacement::Keep);
    assert_eq!(config.recent_days, 90);
    // untouched keys keep their defaults
    assert_eq!(config.search_workers, 8);
    assert_eq!(config.unresolved_dir, "NOT IN OCR");
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_env_layer_wins_over_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "search_workers = 2\npool_ceiling = 4\n").unwrap();

    std::env::set_var("OCRFIND_ENVTEST_SEARCH_WORKERS", "3");
    let config: Config = Config::figment(Some(&path))
        .unwrap()
        .merge(Env::prefixed("OCRFIND_ENVTEST_"))
        .extract()
        .unwrap();
    std::env::remove_var("OCRFIND_ENVTEST_SEARCH_WORKERS");

    assert_eq!(config.search_workers, 3);
    assert_eq!(config.pool_ceiling, 4);
}

#[test]
fn test_config_bad_value_is_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "layout = \"sideways\"\n").unwrap();

    let result = Config::load(Some(&path));

    assert!(matches!(result, Err(ConfigError::Figment(_))));
}

#[test]
fn test_config_missing_explicit_file() {
    let dir = tempdir().unwrap();
    let result = Config::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(ConfigError::FileMissing(_))));
}

#[test]
fn test_config_show_config_output_parses() {
    let config = Config {
        dated_roots: vec!["/ocr/{year}".into()],
        ..Default::default()
    };
    let text = config.to_toml().unwrap();
    let parsed: toml::Value = toml::from_str(&text).unwrap();
    assert_eq!(parsed["recent_days"].as_integer(), Some(365));
    assert_eq!(parsed["phases"].as_array().map(Vec::len), Some(5));
}
