use super::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> SettingsStore {
    SettingsStore::at_path(dir.path().join("settings.json"))
}

#[test]
fn test_defaults_when_file_missing() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let settings = store.load().unwrap();
    assert_eq!(settings.backend_url, DEFAULT_BACKEND_URL);
    assert!(settings.auto_detect);
    assert_eq!(settings.default_project, None);
    assert_eq!(settings.readability_url, None);
    assert_eq!(settings.session_cookie, None);
}

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut settings = Settings::default();
    settings.default_project = Some("conv-123".to_string());
    settings.session_cookie = Some("sk-abc".to_string());
    store.save(&settings).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.default_project, Some("conv-123".to_string()));
    assert_eq!(reloaded.session_cookie, Some("sk-abc".to_string()));
}

#[test]
fn test_set_and_get_keys() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    store.set("auto_detect", "false").unwrap();
    assert_eq!(store.get("auto_detect").unwrap(), "false");

    store.set("backend_url", "https://backend.example/").unwrap();
    // Trailing slash is stripped on write
    assert_eq!(store.get("backend_url").unwrap(), "https://backend.example");

    store.set("readability_url", "https://extract.example").unwrap();
    assert_eq!(
        store.get("readability_url").unwrap(),
        "https://extract.example"
    );
}

#[test]
fn test_set_empty_clears_optional_keys() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    store.set("default_project", "conv-1").unwrap();
    let settings = store.set("default_project", "").unwrap();
    assert_eq!(settings.default_project, None);
}

#[test]
fn test_set_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let err = store.set("no_such_key", "x").unwrap_err();
    assert!(err.to_string().contains("Unknown setting"));
}

#[test]
fn test_set_rejects_bad_bool() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let err = store.set("auto_detect", "maybe").unwrap_err();
    assert!(err.to_string().contains("true or false"));
}

#[test]
fn test_partial_settings_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    std::fs::write(store.path(), r#"{"default_project": "conv-9"}"#).unwrap();
    let settings = store.load().unwrap();
    assert_eq!(settings.default_project, Some("conv-9".to_string()));
    assert_eq!(settings.backend_url, DEFAULT_BACKEND_URL);
    assert!(settings.auto_detect);
}
