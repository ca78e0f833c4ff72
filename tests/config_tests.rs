use std::env;

use serial_test::serial;

use eyeshield::config::EyeshieldConfig;

const VARS: [&str; 6] = [
    "EYESHIELD_SERVER_HOST",
    "EYESHIELD_SERVER_PORT",
    "EYESHIELD_STORAGE_PATH",
    "EYESHIELD_LICENSE_KEY_PREFIX",
    "EYESHIELD_LOGGING_ENABLED",
    "EYESHIELD_LOG_LEVEL",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn load_without_overrides_uses_defaults() {
    clear_env();

    let config = EyeshieldConfig::load().expect("config should load");

    // A local config.toml may override these, so only check they validate.
    assert!(config.validate().is_ok());
    assert!(config.server.port > 0);
    assert!(!config.storage.path.is_empty());
}

#[test]
#[serial]
fn environment_overrides_file_and_defaults() {
    clear_env();
    env::set_var("EYESHIELD_SERVER_PORT", "4000");
    env::set_var("EYESHIELD_STORAGE_PATH", "/tmp/eyeshield-test.json");
    env::set_var("EYESHIELD_LICENSE_KEY_PREFIX", "ACME");
    env::set_var("EYESHIELD_LOG_LEVEL", "debug");

    let config = EyeshieldConfig::load().expect("config should load");
    clear_env();

    assert_eq!(config.server.port, 4000);
    assert_eq!(config.storage.path, "/tmp/eyeshield-test.json");
    assert_eq!(config.license.key_prefix, "ACME");
    assert_eq!(config.logging.level, "debug");
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn unparseable_port_override_is_ignored() {
    clear_env();
    env::set_var("EYESHIELD_SERVER_PORT", "not-a-port");

    let config = EyeshieldConfig::load().expect("config should load");
    clear_env();

    assert!(config.server.port > 0);
}

#[test]
#[serial]
fn invalid_level_override_fails_validation() {
    clear_env();
    env::set_var("EYESHIELD_LOG_LEVEL", "chatty");

    let config = EyeshieldConfig::load().expect("config should load");
    clear_env();

    assert!(config.validate().is_err());
}
