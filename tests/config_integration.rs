use serial_test::serial;
use std::env;
use std::fs;
use std::time::Duration;
use study_chat_widget::config::AppConfig;

const BIN: &str = "study-chat-widget";

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("WIDGET_SERVER__PORT");
        env::remove_var("WIDGET_REVEAL__STAGGER_MS");
        env::remove_var("WIDGET_SEED");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.chat.reply_delay_min_ms, 1500);
    assert_eq!(config.chat.reply_delay_jitter_ms, 1000);
    assert_eq!(config.reveal.stagger_ms, 100);
    assert_eq!(config.page.viewport_height, 800.0);
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("WIDGET_SERVER__PORT", "9090");
        env::set_var("WIDGET_REVEAL__STAGGER_MS", "50");
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    let settings = config.widget_settings().expect("Invalid widget settings");
    assert_eq!(settings.reveal.stagger_for(2), Duration::from_millis(100));

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env_vars();
    unsafe {
        env::set_var("WIDGET_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args([BIN, "--port", "4040", "--seed", "7"])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 4040);
    assert_eq!(config.server.seed, Some(7));

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let config_content = r#"
server:
  port: 7070
chat:
  reply_delay_min_ms: 200
  responses:
    - "Só uma resposta."
"#;

    let file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp config");
    fs::write(file.path(), config_content).expect("Failed to write temp config");

    // Tell AppConfig to use this file via Env Var (mocking CLI arg indirectly)
    unsafe {
        env::set_var("CONFIG_FILE", file.path());
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.chat.reply_delay_min_ms, 200);
    assert_eq!(config.chat.responses, vec!["Só uma resposta.".to_string()]);
    // Untouched sections keep their defaults
    assert_eq!(config.reveal.threshold_divisor, 1.3);

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env_vars();

    let result = AppConfig::load_from_args([BIN, "--config", "does/not/exist.yaml"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_cwd_config_fallback() {
    clear_env_vars();

    let config_content = r#"
server:
  port: 6060
    "#;
    let cwd_path = "config.yaml";
    fs::write(cwd_path, config_content).expect("Failed to write ./config.yaml");

    let port = AppConfig::load_from_args([BIN])
        .ok()
        .map(|config| config.server.port);

    // Remove the file before asserting so a failure doesn't leak it into other tests
    let result = std::panic::catch_unwind(|| {
        assert_eq!(port, Some(6060));
    });

    fs::remove_file(cwd_path).unwrap();

    if let Err(e) = result {
        std::panic::resume_unwind(e);
    }
}
