/*!
 * Tests for application configuration
 */

use vnloc::app_config::{Config, LogLevel, TranslationProvider};

use crate::common::{create_temp_dir, create_test_file};

/// Test that a full config file round trips through save and load
#[test]
fn test_save_thenLoad_shouldPreserveAllSections() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.target_language = "en".to_string();
    config.translation.provider = TranslationProvider::Mock;
    config.translation.knowledge_base = vec!["Ema speaks formally.".to_string()];
    config.markup.size_wrapper = "<size=85%>".to_string();
    config.pipeline.max_parallel_files = 8;
    config.validation.script_purity_validation = false;
    config.log_level = LogLevel::Debug;
    config.save(&path).unwrap();

    let loaded = Config::load_or_create(&path).unwrap();

    assert_eq!(loaded, config);
}

/// Test that provider and log level names are lowercase in JSON
#[test]
fn test_deserialize_withLowercaseNames_shouldParseEnums() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(
        dir.path(),
        "conf.json",
        r#"{"translation": {"provider": "mock", "temperature": 0.2}, "log_level": "warn"}"#,
    )
    .unwrap();

    let config = Config::load_or_create(&path).unwrap();

    assert_eq!(config.translation.provider, TranslationProvider::Mock);
    assert_eq!(config.translation.temperature, Some(0.2));
    assert_eq!(config.log_level, LogLevel::Warn);
    assert_eq!(config.translation.concurrent_requests, 4);
    assert!(config.validation.enabled);
}

/// Test that an invalid config file is reported, not replaced
#[test]
fn test_load_or_create_withBrokenJson_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "conf.json", "{ not json").unwrap();

    assert!(Config::load_or_create(&path).is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}

/// Test that link style parts must be configured together
#[test]
fn test_validate_withHalfLinkStyle_shouldFail() {
    let mut config = Config::default();
    config.markup.link_style_close = String::new();

    assert!(config.validate().is_err());

    config.markup.link_style_open = String::new();
    assert!(config.validate().is_ok());
}

/// Test that an explicit database path wins over the default location
#[test]
fn test_database_path_withExplicitPath_shouldUseIt() {
    let mut config = Config::default();
    config.pipeline.database_path = Some("custom/slots.db".into());

    assert_eq!(config.database_path().unwrap(), std::path::PathBuf::from("custom/slots.db"));
}

/// Test that the markup section maps onto the reinsertion style
#[test]
fn test_reinsertion_style_shouldMirrorMarkupSection() {
    let mut config = Config::default();
    config.markup.link_style_open = "<b>".to_string();

    let style = config.markup.reinsertion_style();

    assert_eq!(style.link_style_open, "<b>");
    assert_eq!(style.size_wrapper, "<size=90%>");
}
