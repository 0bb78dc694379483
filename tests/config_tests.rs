use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use workday_feed::{ConfigError, ServiceConfig};

fn config_from(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ServiceConfig::from_lookup(|name| vars.get(name).cloned())
}

#[test]
fn defaults_apply_when_nothing_is_set() {
    let config = config_from(&[]).unwrap();
    assert_eq!(config.http_addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
    assert_eq!(config.db_path.to_str(), Some("workday-feed.sqlite3"));
    assert_eq!(config.update_interval, Some(Duration::from_millis(3_600_000)));
    assert_eq!(config.fetch_timeout, Duration::from_secs(10));
    assert_eq!(config.update_api_key, None);
    assert_eq!(config.client_url, None);
    assert_eq!(config.workday.timezone, "Europe/Stockholm");
    assert_eq!(config.workday.day_start_hour, 6);
    assert_eq!(config.workday.summary, "Jobb");
    assert_eq!(config.workday.exclusion_keywords.len(), 5);
}

#[test]
fn port_is_used_when_no_address_is_given() {
    let config = config_from(&[("PORT", "8080")]).unwrap();
    assert_eq!(config.http_addr.port(), 8080);

    let config = config_from(&[("PORT", "8080"), ("WORKDAY_FEED_HTTP_ADDR", "127.0.0.1:9000")])
        .unwrap();
    assert_eq!(config.http_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
}

#[test]
fn overrides_are_read() {
    let config = config_from(&[
        ("UPDATE_INTERVAL", "0"),
        ("UPDATE_API_KEY", "secret"),
        ("CLIENT_URL", "https://app.example.com"),
        ("FETCH_TIMEOUT_MS", "2500"),
        ("CALENDAR_TIMEZONE", "UTC"),
        ("WORKDAY_START_HOUR", "4"),
        ("DEFAULT_SUMMARY", "Work"),
        ("EXCLUDE_KEYWORDS", "vacation, Course ,"),
    ])
    .unwrap();
    assert_eq!(config.update_interval, None);
    assert_eq!(config.update_api_key.as_deref(), Some("secret"));
    assert_eq!(config.client_url.as_deref(), Some("https://app.example.com"));
    assert_eq!(config.fetch_timeout, Duration::from_millis(2500));
    assert_eq!(config.workday.timezone, "UTC");
    assert_eq!(config.workday.day_start_hour, 4);
    assert_eq!(config.workday.summary, "Work");
    assert_eq!(config.workday.exclusion_keywords, vec!["vacation", "Course"]);
}

#[test]
fn empty_keyword_list_disables_filtering() {
    let config = config_from(&[("EXCLUDE_KEYWORDS", "")]).unwrap();
    assert!(config.workday.exclusion_keywords.is_empty());
}

#[test]
fn malformed_values_name_their_variable() {
    let err = config_from(&[("UPDATE_INTERVAL", "hourly")]).unwrap_err();
    assert!(err.to_string().starts_with("UPDATE_INTERVAL"), "{err}");

    let err = config_from(&[("WORKDAY_FEED_HTTP_ADDR", "localhost")]).unwrap_err();
    assert!(err.to_string().starts_with("WORKDAY_FEED_HTTP_ADDR"), "{err}");

    assert!(matches!(
        config_from(&[("FETCH_TIMEOUT_MS", "0")]),
        Err(ConfigError::Invalid { variable: "FETCH_TIMEOUT_MS", .. })
    ));
}

#[test]
fn invalid_workday_settings_are_rejected() {
    assert!(matches!(
        config_from(&[("CALENDAR_TIMEZONE", "Mars/Olympus")]),
        Err(ConfigError::Workday(_))
    ));
    assert!(matches!(
        config_from(&[("WORKDAY_START_HOUR", "24")]),
        Err(ConfigError::Workday(_))
    ));
}
