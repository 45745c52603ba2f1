//! Repository identity wrappers and token handling.

use std::fmt;

use url::Url;

use super::error::HarvestError;

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    /// Validates and lower-cases an owner segment.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidRepository`] when the segment is blank.
    pub fn new(value: &str) -> Result<Self, HarvestError> {
        validate_segment(value, "owner").map(Self)
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryName(String);

impl RepositoryName {
    /// Validates and lower-cases a repository name segment.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidRepository`] when the segment is blank.
    pub fn new(value: &str) -> Result<Self, HarvestError> {
        validate_segment(value, "name").map(Self)
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

fn validate_segment(value: &str, what: &str) -> Result<String, HarvestError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HarvestError::InvalidRepository {
            input: value.to_owned(),
            message: format!("repository {what} must not be empty"),
        });
    }
    if trimmed.contains(['/', '?', '#']) || trimmed.chars().any(char::is_whitespace) {
        return Err(HarvestError::InvalidRepository {
            input: value.to_owned(),
            message: format!("repository {what} contains invalid characters"),
        });
    }
    Ok(trimmed.to_lowercase())
}

/// A repository whose resources are harvested.
///
/// Every derived key and path is namespaced by [`RepositoryTarget::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryTarget {
    owner: RepositoryOwner,
    name: RepositoryName,
}

impl RepositoryTarget {
    /// Creates a target from already-validated parts.
    #[must_use]
    pub const fn new(owner: RepositoryOwner, name: RepositoryName) -> Self {
        Self { owner, name }
    }

    /// Resolves `owner/repo` or `https://github.com/owner/repo[...]`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidRepository`] when the input has no owner
    /// and name, or names a host other than `github.com`.
    pub fn parse(input: &str) -> Result<Self, HarvestError> {
        let trimmed = input.trim();
        if trimmed.contains("://") {
            return Self::from_url(trimmed);
        }

        let mut segments = trimmed.trim_matches('/').split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(owner), Some(name), None) => Ok(Self::new(
                RepositoryOwner::new(owner)?,
                RepositoryName::new(name)?,
            )),
            _ => Err(HarvestError::InvalidRepository {
                input: input.to_owned(),
                message: "expected owner/repo".to_owned(),
            }),
        }
    }

    fn from_url(input: &str) -> Result<Self, HarvestError> {
        let parsed = Url::parse(input).map_err(|error| HarvestError::InvalidRepository {
            input: input.to_owned(),
            message: error.to_string(),
        })?;

        let is_github = parsed
            .host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case("github.com"));
        if !is_github {
            return Err(HarvestError::InvalidRepository {
                input: input.to_owned(),
                message: "only github.com repository URLs are supported".to_owned(),
            });
        }

        let mut segments = parsed
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|segment| !segment.is_empty());
        match (segments.next(), segments.next()) {
            (Some(owner), Some(name)) => Ok(Self::new(
                RepositoryOwner::new(owner)?,
                RepositoryName::new(name.trim_end_matches(".git"))?,
            )),
            _ => Err(HarvestError::InvalidRepository {
                input: input.to_owned(),
                message: "URL must match /owner/repo".to_owned(),
            }),
        }
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn name(&self) -> &RepositoryName {
        &self.name
    }

    /// The `{owner}_{repo}` key used in progress records and file names.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}_{}", self.owner.as_str(), self.name.as_str())
    }
}

impl fmt::Display for RepositoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner.as_str(), self.name.as_str())
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::MissingToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, HarvestError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(HarvestError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PersonalAccessToken(***)")
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}
