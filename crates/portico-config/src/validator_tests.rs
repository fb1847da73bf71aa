use super::*;

#[test]
fn test_validate_default_config() {
    let config = Config::default();
    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_invalid_port() {
    let mut config = Config::default();
    config.server.port = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "server.port"));
}

#[test]
fn test_validate_empty_host() {
    let mut config = Config::default();
    config.server.host = String::new();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "server.host"));
}

#[test]
fn test_validate_public_host_warning() {
    let mut config = Config::default();
    config.server.host = "0.0.0.0".to_string();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "server.host"));
}

#[test]
fn test_validate_localhost_and_ipv6_loopback() {
    for host in ["localhost", "::1", "127.0.0.1"] {
        let mut config = Config::default();
        config.server.host = host.to_string();

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.warnings.is_empty(), "unexpected warning for {host}");
    }
}

#[test]
fn test_validate_root_path_without_slash() {
    let mut config = Config::default();
    config.server.root_path = Some("app".to_string());

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "server.root_path"));
}

#[test]
fn test_validate_empty_cookie_name() {
    let mut config = Config::default();
    config.session.cookie_name = String::new();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "session.cookie_name"));
}

#[test]
fn test_validate_zero_workers() {
    let mut config = Config::default();
    config.kernel.max_workers = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "kernel.max_workers"));
}

#[test]
fn test_validate_large_worker_pool_warning() {
    let mut config = Config::default();
    config.kernel.max_workers = 10_000;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "kernel.max_workers"));
}

#[test]
fn test_validate_zero_message_size() {
    let mut config = Config::default();
    config.websocket.max_message_size = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "websocket.max_message_size"));
}

#[test]
fn test_validate_unknown_log_level() {
    let mut config = Config::default();
    config.logging.level = "verbose".to_string();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "logging.level"));
}

#[test]
fn test_validate_log_level_case_insensitive() {
    let mut config = Config::default();
    config.logging.level = "DEBUG".to_string();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
}

#[test]
fn test_into_result() {
    let mut config = Config::default();
    config.server.port = 0;

    let err = ConfigValidator::validate(&config)
        .unwrap()
        .into_result()
        .unwrap_err();
    assert!(err.to_string().contains("server.port"));

    let warnings = ConfigValidator::validate(&Config::default())
        .unwrap()
        .into_result()
        .unwrap();
    assert!(warnings.is_empty());
}
