//! Tests for field resolution methods (`resolve_token`,
//! `resolve_repositories`, `settings`).

use std::time::Duration;

use rstest::rstest;

use crate::HoarderConfig;
use crate::github::HarvestError;

#[rstest]
fn resolve_token_returns_value_when_present() {
    let config = HoarderConfig {
        token: Some("my-token".to_owned()),
        ..Default::default()
    };

    assert_eq!(
        config.resolve_token().ok(),
        Some("my-token".to_owned()),
        "should return the token"
    );
}

#[rstest]
fn resolve_token_returns_error_when_none() {
    // Lock and clear GITHUB_TOKEN to ensure test isolation
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", None::<&str>)]);
    let config = HoarderConfig::default();

    assert_eq!(config.resolve_token(), Err(HarvestError::MissingToken));
}

#[rstest]
fn resolve_token_falls_back_to_github_token() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", Some("legacy-token"))]);
    let config = HoarderConfig::default();

    assert_eq!(
        config.resolve_token().ok(),
        Some("legacy-token".to_owned()),
        "legacy variable should be used when no token is configured"
    );
}

#[rstest]
fn resolve_repositories_keeps_input_order() {
    let config = HoarderConfig {
        repositories: Some("Octo/Zeta, https://github.com/octo/alpha.git\nocto/mid".to_owned()),
        ..Default::default()
    };

    let targets = config
        .resolve_repositories()
        .expect("repositories should parse");
    let rendered: Vec<String> = targets.iter().map(ToString::to_string).collect();

    assert_eq!(rendered, vec!["octo/zeta", "octo/alpha", "octo/mid"]);
}

#[rstest]
#[case::missing(None)]
#[case::blank(Some(" , ".to_owned()))]
fn resolve_repositories_requires_an_entry(#[case] repositories: Option<String>) {
    let config = HoarderConfig {
        repositories,
        ..Default::default()
    };

    let error = config
        .resolve_repositories()
        .expect_err("empty list should be rejected");
    assert!(
        matches!(error, HarvestError::Configuration { .. }),
        "unexpected error: {error:?}"
    );
}

#[rstest]
fn resolve_repositories_rejects_bad_entry() {
    let config = HoarderConfig {
        repositories: Some("octo/repo,not-a-repo".to_owned()),
        ..Default::default()
    };

    let error = config
        .resolve_repositories()
        .expect_err("bad entry should be rejected");
    assert!(
        matches!(error, HarvestError::InvalidRepository { ref input, .. } if input == "not-a-repo"),
        "unexpected error: {error:?}"
    );
}

#[rstest]
fn settings_carry_configured_timing() {
    let config = HoarderConfig {
        api_base: "https://ghe.example.com/api/v3".to_owned(),
        data_dir: "out".to_owned(),
        max_attempts: 4,
        retry_wait_seconds: 2,
        request_timeout_seconds: 5,
        secondary_timeout_seconds: 40,
        ..Default::default()
    };

    let settings = config.settings().expect("settings should build");

    assert_eq!(settings.api_base.as_str(), "https://ghe.example.com/api/v3");
    assert_eq!(settings.data_dir.as_str(), "out");
    assert_eq!(settings.progress_file.as_str(), "verification.json");
    assert_eq!(settings.retry.max_attempts, 4);
    assert_eq!(settings.retry.retry_wait, Duration::from_secs(2));
    assert_eq!(settings.retry.timeout, Duration::from_secs(5));
    assert_eq!(settings.retry.reset_margin, Duration::from_secs(50));
    assert_eq!(settings.secondary_timeout, Duration::from_secs(40));
}

#[rstest]
#[case::not_a_url("api.github.com")]
#[case::wrong_scheme("ftp://api.github.com")]
fn settings_reject_bad_api_base(#[case] api_base: &str) {
    let config = HoarderConfig {
        api_base: api_base.to_owned(),
        ..Default::default()
    };

    assert!(
        matches!(config.settings(), Err(HarvestError::Configuration { .. })),
        "api_base {api_base} should be rejected"
    );
}
