//! Error types exposed by the harvesting layer.

use thiserror::Error;

/// Errors surfaced while talking to GitHub or persisting harvested data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HarvestError {
    /// The authentication token was missing.
    #[error("personal access token is required")]
    MissingToken,

    /// A repository identifier could not be resolved to `owner/repo`.
    #[error("invalid repository identifier '{input}': {message}")]
    InvalidRepository {
        /// The identifier as supplied.
        input: String,
        /// Why the identifier was rejected.
        message: String,
    },

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// GitHub returned a status other than 200.
    #[error("GitHub API error: {message}")]
    Api {
        /// Status and response detail.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// Every attempt at a request failed before a response arrived.
    #[error("gave up on {url} after {attempts} attempts")]
    ExhaustedRetries {
        /// The URL that could not be fetched.
        url: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// A `Link` header entry carried no parseable page number.
    #[error("invalid pagination link: {message}")]
    InvalidLinkHeader {
        /// The offending link entry.
        message: String,
    },

    /// A response body was not valid JSON.
    #[error("malformed payload from {url}: {message}")]
    MalformedPayload {
        /// The URL that produced the payload.
        url: String,
        /// Decoder error detail.
        message: String,
    },

    /// The progress file exists but cannot be understood.
    #[error("progress store '{path}' is corrupt: {message}")]
    StoreCorruption {
        /// Location of the progress file.
        path: String,
        /// Parser error detail.
        message: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },
}

impl HarvestError {
    /// Returns true when the run cannot continue safely after this error.
    ///
    /// Transient conditions leave durable state consistent and are absorbed
    /// by the caller; everything else aborts the run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::Api { .. }
                | Self::Network { .. }
                | Self::ExhaustedRetries { .. }
                | Self::InvalidLinkHeader { .. }
                | Self::MalformedPayload { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::HarvestError;

    #[rstest]
    #[case::exhausted(HarvestError::ExhaustedRetries { url: "u".to_owned(), attempts: 30 }, false)]
    #[case::api(HarvestError::Api { message: "404".to_owned() }, false)]
    #[case::malformed(
        HarvestError::MalformedPayload { url: "u".to_owned(), message: "eof".to_owned() },
        false
    )]
    #[case::auth(HarvestError::Authentication { message: "bad".to_owned() }, true)]
    #[case::corrupt(
        HarvestError::StoreCorruption { path: "p".to_owned(), message: "eof".to_owned() },
        true
    )]
    #[case::io(HarvestError::Io { message: "disk full".to_owned() }, true)]
    fn classifies_fatal_errors(#[case] error: HarvestError, #[case] fatal: bool) {
        assert_eq!(
            error.is_fatal(),
            fatal,
            "unexpected classification for {error:?}"
        );
    }
}
