//! Startup credential check.

use serde::Deserialize;
use tracing::info;
use url::Url;

use super::error::HarvestError;
use super::executor::RequestExecutor;
use super::rate_limit::join_api_path;

#[derive(Debug, Deserialize)]
struct AuthenticatedUser {
    login: String,
}

/// Confirms that GitHub accepts the configured token.
///
/// Returns the authenticated login.
///
/// # Errors
///
/// Returns [`HarvestError::Authentication`] for 401/403 answers,
/// [`HarvestError::Api`] for other non-200 statuses and propagates transport
/// exhaustion from the executor.
pub fn validate_token(
    executor: &RequestExecutor<'_>,
    api_base: &Url,
) -> Result<String, HarvestError> {
    let url = join_api_path(api_base, "user")?;
    let response = executor.execute(url.as_str())?;

    match response.status {
        200 => {
            let user: AuthenticatedUser =
                serde_json::from_str(&response.body).map_err(|error| {
                    HarvestError::MalformedPayload {
                        url: response.url.clone(),
                        message: error.to_string(),
                    }
                })?;
            info!(login = %user.login, "authenticated with GitHub");
            Ok(user.login)
        }
        401 | 403 => Err(HarvestError::Authentication {
            message: format!(
                "token check returned status {}: {}",
                response.status,
                extract_github_message(&response.body).unwrap_or_else(|| "no detail".to_owned())
            ),
        }),
        status => Err(HarvestError::Api {
            message: format!("token check returned status {status}"),
        }),
    }
}

/// Pulls the `message` field out of a GitHub error body.
fn extract_github_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return None;
    };
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}
