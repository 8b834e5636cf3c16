use jsonhand::config::Config;
use jsonhand::jsonpath::ResultMode;

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.mode, ResultMode::Value);
    assert!(config.allow_eval);
    assert_eq!(config.debug, 0);
    assert!(config.pretty);
    assert!(!config.unique);
}

#[test]
fn test_custom_config() {
    let config = Config {
        mode: ResultMode::IndexPath,
        allow_eval: false,
        debug: 1,
        pretty: false,
        unique: true,
    };

    assert_eq!(config.mode, ResultMode::IndexPath);
    assert!(!config.allow_eval);
    assert_eq!(config.debug, 1);
    assert!(!config.pretty);
    assert!(config.unique);
}

#[test]
fn test_config_serialization() {
    let config = Config {
        mode: ResultMode::Path,
        ..Config::default()
    };

    let toml_string = toml::to_string(&config).unwrap();
    assert!(toml_string.contains("mode = \"path\""));
    assert!(toml_string.contains("allow_eval = true"));

    let parsed: Config = toml::from_str(&toml_string).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_ipath_mode_name() {
    let config: Config = toml::from_str("mode = \"ipath\"").unwrap();
    assert_eq!(config.mode, ResultMode::IndexPath);
}

#[test]
fn test_empty_file_gives_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let config = Config {
        mode: ResultMode::Path,
        unique: true,
        ..Config::default()
    };
    config.save_to(&path).unwrap();
    assert!(path.exists());

    assert_eq!(Config::load_from(&path), config);
}

#[test]
fn test_load_missing_or_invalid_falls_back() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("absent.toml");
    assert_eq!(Config::load_from(&missing), Config::default());

    let invalid = dir.path().join("invalid.toml");
    std::fs::write(&invalid, "mode = [not toml").unwrap();
    assert_eq!(Config::load_from(&invalid), Config::default());

    let wrong_mode = dir.path().join("wrong.toml");
    std::fs::write(&wrong_mode, "mode = \"xml\"").unwrap();
    assert_eq!(Config::load_from(&wrong_mode), Config::default());
}

#[test]
fn test_config_path_location() {
    if let Some(path) = Config::config_path() {
        assert!(path.ends_with(".config/jsonhand/config.toml"));
    }
}
