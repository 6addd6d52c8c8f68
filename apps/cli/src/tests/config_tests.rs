use std::{
    collections::HashMap,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use super::*;

fn write_temp_config(label: &str, contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("assistant_cli_{label}_{suffix}.toml"));
    fs::write(&path, contents).expect("write config");
    path
}

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn file_values_override_defaults_and_keep_the_rest() {
    let path = write_temp_config(
        "partial",
        "server_url = \"https://assistant.example\"\ntoast_ms = 1500\n",
    );

    let settings = load_settings_with(Some(&path), env_of(&[])).expect("settings");

    assert_eq!(settings.server_url, "https://assistant.example");
    assert_eq!(settings.toast_duration(), Duration::from_millis(1500));
    assert_eq!(
        settings.database_url,
        ClientSettings::default().database_url
    );
    assert_eq!(settings.main_view_delay(), Duration::from_millis(500));
    fs::remove_file(path).expect("cleanup");
}

#[test]
fn environment_overrides_file_and_app_prefix_wins() {
    let path = write_temp_config("env", "server_url = \"http://file.example\"\n");

    let settings = load_settings_with(
        Some(&path),
        env_of(&[
            ("ASSISTANT_SERVER_URL", "http://plain.example"),
            ("APP__SERVER_URL", "http://prefixed.example"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("APP__MAIN_VIEW_DELAY_MS", "0"),
        ]),
    )
    .expect("settings");

    assert_eq!(settings.server_url, "http://prefixed.example");
    assert_eq!(settings.database_url, "sqlite::memory:");
    assert_eq!(settings.main_view_delay(), Duration::ZERO);
    fs::remove_file(path).expect("cleanup");
}

#[test]
fn non_numeric_duration_env_is_ignored() {
    let mut settings = ClientSettings::default();
    settings.apply_env(env_of(&[("APP__TOAST_MS", "soon")]));
    assert_eq!(settings.toast_ms, 3000);
}

#[test]
fn missing_explicit_config_file_is_an_error() {
    let path = std::env::temp_dir().join("assistant_cli_definitely_missing.toml");
    assert!(load_settings_with(Some(&path), env_of(&[])).is_err());
}

#[test]
fn unknown_config_keys_are_rejected() {
    let path = write_temp_config("unknown", "bind_addr = \"0.0.0.0:1\"\n");
    let err = load_settings_with(Some(&path), env_of(&[])).expect_err("unknown key");
    assert!(format!("{err:#}").contains("invalid config file"));
    fs::remove_file(path).expect("cleanup");
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:data\\state.db"),
        "sqlite://data/state.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("   "),
        ClientSettings::default().database_url
    );
}
