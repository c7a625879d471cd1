use std::collections::HashMap;

use super::*;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_keep_one_second_delay() {
    let settings = Settings::default();
    assert_eq!(settings.response_delay, Duration::from_secs(1));
    assert_eq!(settings.server_bind, "127.0.0.1:8080");
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
bind_addr = "0.0.0.0:9000"
response_delay_ms = 250
"#,
    )
    .expect("parse");

    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.response_delay, Duration::from_millis(250));
    assert_eq!(settings.max_body_bytes, Settings::default().max_body_bytes);
}

#[test]
fn malformed_file_is_an_error() {
    let mut settings = Settings::default();
    assert!(apply_file(&mut settings, "response_delay_ms = \"soon\"").is_err());
}

#[test]
fn prefixed_env_wins_over_plain_name() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env(&[
            ("SERVER_BIND", "127.0.0.1:1111"),
            ("APP__BIND_ADDR", "127.0.0.1:2222"),
            ("APP__RESPONSE_DELAY_MS", "0"),
            ("APP__MAX_BODY_BYTES", "1024"),
        ]),
    );

    assert_eq!(settings.server_bind, "127.0.0.1:2222");
    assert_eq!(settings.response_delay, Duration::ZERO);
    assert_eq!(settings.max_body_bytes, 1024);
}

#[test]
fn unparsable_env_numbers_are_ignored() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env(&[("APP__RESPONSE_DELAY_MS", "fast"), ("APP__MAX_BODY_BYTES", "-1")]),
    );
    assert_eq!(settings, Settings::default());
}
