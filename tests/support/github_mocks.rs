//! Wiremock fixtures imitating the GitHub REST API.

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::runtime::SharedRuntime;

/// Mounts `mocks` on `server`.
pub fn mount_mocks(server: &MockServer, runtime: &SharedRuntime, mocks: Vec<Mock>) {
    runtime.block_on(async {
        for mock in mocks {
            mock.mount(server).await;
        }
    });
}

/// `/user` accepting the token and a roomy `/rate_limit`.
pub fn account_mocks() -> Vec<Mock> {
    vec![
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "harvester"})))
            .named("token check"),
        Mock::given(method("GET"))
            .and(path("/rate_limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resources": {
                    "core": {
                        "limit": 5000,
                        "used": 0,
                        "remaining": 5000,
                        "reset": 1_700_000_000_u64
                    }
                }
            })))
            .named("quota"),
    ]
}

/// `/user` rejecting the token.
pub fn rejected_token_mock() -> Mock {
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
        )
        .named("token check (rejected)")
}

/// One listing page of `resource` for `owner/repo`, advertising `last` pages.
pub fn listing_page(
    server_uri: &str,
    repository: &str,
    resource: &str,
    page: u32,
    last: u32,
    body: &Value,
) -> Mock {
    let listing = format!("/repos/{repository}/{resource}");
    let link = format!(
        "<{server_uri}{listing}?per_page=100&page={next}>; rel=\"next\", \
         <{server_uri}{listing}?per_page=100&page={last}>; rel=\"last\"",
        next = page.saturating_add(1).min(last),
    );
    let template = if last > 1 {
        ResponseTemplate::new(200)
            .set_body_json(body)
            .insert_header("Link", link.as_str())
    } else {
        ResponseTemplate::new(200).set_body_json(body)
    };
    Mock::given(method("GET"))
        .and(path(listing))
        .and(query_param("page", page.to_string()))
        .respond_with(template)
        .named(format!("{resource} page {page}"))
}

/// A JSON answer for an exact path.
pub fn json_at(route: &str, body: &Value) -> Mock {
    Mock::given(method("GET"))
        .and(path(route.to_owned()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
}

/// An issue linking to its comments and events on `server_uri`.
pub fn issue(server_uri: &str, repository: &str, number: u32) -> Value {
    let base = format!("{server_uri}/repos/{repository}/issues/{number}");
    json!({
        "number": number,
        "url": base,
        "comments_url": format!("{base}/comments"),
        "events_url": format!("{base}/events"),
    })
}

/// Number of requests the server saw for one listing page.
///
/// # Panics
///
/// Panics if request recording is disabled.
pub fn requests_for_page(
    server: &MockServer,
    runtime: &SharedRuntime,
    listing_path: &str,
    page: u32,
) -> usize {
    let requests = runtime
        .block_on(server.received_requests())
        .unwrap_or_else(|| panic!("request recording is not enabled"));
    let page_value = page.to_string();
    requests
        .iter()
        .filter(|request| request.url.path() == listing_path)
        .filter(|request| {
            request
                .url
                .query_pairs()
                .any(|(key, value)| key == "page" && value == page_value.as_str())
        })
        .count()
}
