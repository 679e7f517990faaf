// Unit tests for configuration layering

use super::*;
use crate::locators::{Page, Role};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::io::Write;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults_target_periplus() {
    let config = HarnessConfig::default();
    assert_eq!(config.site.home_url().unwrap(), "https://www.periplus.com/");
    assert_eq!(
        config.site.login_url().unwrap(),
        "https://www.periplus.com/account/Login"
    );
    assert_eq!(
        config.site.cart_url().unwrap(),
        "https://www.periplus.com/checkout/cart"
    );
    assert_eq!(config.wait.policy(), WaitPolicy::default());
    assert_eq!(config.cart.removal_attempt_limit, 20);
    assert!(config.browser.headless);
    assert!(config.credentials.is_none());
    config.validate().unwrap();
}

#[test]
fn test_site_urls_follow_base_override() {
    let site = SiteConfig {
        base_url: "http://127.0.0.1:8123".to_string(),
        ..SiteConfig::default()
    };
    assert_eq!(site.cart_url().unwrap(), "http://127.0.0.1:8123/checkout/cart");
}

#[test]
fn test_invalid_base_url_is_config_error() {
    let mut config = HarnessConfig::default();
    config.site.base_url = "not a url".to_string();
    let err = config.validate().unwrap_err();
    assert_eq!(err.exit_code(), 6);
}

#[test]
fn test_env_primary_names_win_over_fallbacks() {
    let mut config = HarnessConfig::default();
    config.apply_env(env(&[
        ("CARTPROBE_EMAIL", "primary@example.com"),
        ("TEST_EMAIL", "fallback@example.com"),
        ("TEST_PASSWORD", "secret"),
    ]));

    let creds = config.require_credentials().unwrap();
    assert_eq!(creds.email, "primary@example.com");
    assert_eq!(creds.password, "secret");
}

#[test]
fn test_env_overrides_file_credentials_field_by_field() {
    let mut config = HarnessConfig {
        credentials: Some(Credentials {
            email: "file@example.com".to_string(),
            password: "from-file".to_string(),
        }),
        ..HarnessConfig::default()
    };
    config.apply_env(env(&[("CARTPROBE_PASSWORD", "from-env")]));

    let creds = config.credentials.unwrap();
    assert_eq!(creds.email, "file@example.com");
    assert_eq!(creds.password, "from-env");
}

#[test]
fn test_half_credentials_from_env_are_ignored() {
    let mut config = HarnessConfig::default();
    config.apply_env(env(&[("TEST_EMAIL", "only@example.com")]));
    assert!(config.credentials.is_none());
    assert_eq!(config.require_credentials().unwrap_err().exit_code(), 6);
}

#[test]
fn test_env_base_url_and_webdriver_url() {
    let mut config = HarnessConfig::default();
    config.apply_env(env(&[
        ("CARTPROBE_BASE_URL", "http://localhost:9999"),
        ("CARTPROBE_WEBDRIVER_URL", "http://localhost:4444"),
    ]));
    assert_eq!(config.site.base_url, "http://localhost:9999");
    assert_eq!(
        config.browser.webdriver_url.as_deref(),
        Some("http://localhost:4444")
    );
}

#[test]
fn test_debug_redacts_password() {
    let creds = Credentials {
        email: "user@example.com".to_string(),
        password: "hunter2".to_string(),
    };
    let rendered = format!("{:?}", creds);
    assert!(rendered.contains("user@example.com"));
    assert!(!rendered.contains("hunter2"));
}

#[test]
fn test_partial_file_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "site": {{ "base_url": "http://127.0.0.1:3000" }},
            "wait": {{ "timeout_secs": 7 }},
            "cart": {{ "name_match": "exact" }},
            "locators": {{
                "home.search_box": [{{ "css": "input.search" }}]
            }}
        }}"#
    )
    .unwrap();

    let config = HarnessConfig::from_file(file.path()).unwrap();
    assert_eq!(config.site.base_url, "http://127.0.0.1:3000");
    assert_eq!(config.site.cart_path, "/checkout/cart");
    assert_eq!(config.wait.timeout_secs, 7);
    assert_eq!(config.wait.poll_interval_ms, 250);
    assert_eq!(config.cart.name_match, MatchStrategy::Exact);
    assert_eq!(config.products, Catalog::default());

    let registry = config.registry().unwrap();
    let search = registry.get(Page::Home, Role::SearchBox).unwrap();
    assert_eq!(search.selectors(), &[Selector::css("input.search")]);
}

#[test]
fn test_malformed_file_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    let err = HarnessConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, HarnessError::Config(_)));
}

#[test]
fn test_missing_file_is_config_error() {
    let err = HarnessConfig::from_file(Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(matches!(err, HarnessError::Config(_)));
}

#[test]
fn test_zero_limits_rejected() {
    let mut config = HarnessConfig::default();
    config.cart.removal_attempt_limit = 0;
    assert!(config.validate().is_err());

    let mut config = HarnessConfig::default();
    config.wait.timeout_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_unknown_locator_override_rejected() {
    let mut config = HarnessConfig::default();
    config
        .locators
        .insert("cart.nonsense".to_string(), vec![Selector::css("x")]);
    assert!(matches!(config.validate(), Err(HarnessError::Config(_))));
}

#[test]
fn test_load_leaves_validation_to_caller() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"site": {{"base_url": "not a url"}}, "wait": {{"timeout_secs": 0}}}}"#
    )
    .unwrap();

    let mut config = HarnessConfig::load(Some(file.path())).unwrap();
    assert!(config.validate().is_err());

    // What a --base-url / --timeout flag would do
    config.site.base_url = "http://127.0.0.1:3000".to_string();
    config.wait.timeout_secs = 5;
    config.validate().unwrap();
}

#[test]
fn test_empty_primary_env_does_not_hide_fallback() {
    let mut config = HarnessConfig::default();
    config.apply_env(env(&[
        ("CARTPROBE_EMAIL", ""),
        ("CARTPROBE_PASSWORD", ""),
        ("TEST_EMAIL", "fallback@example.com"),
        ("TEST_PASSWORD", "secret"),
        ("CARTPROBE_BASE_URL", ""),
    ]));

    let creds = config.require_credentials().unwrap();
    assert_eq!(creds.email, "fallback@example.com");
    assert_eq!(creds.password, "secret");
    assert_eq!(config.site.base_url, "https://www.periplus.com");
}
