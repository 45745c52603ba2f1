//! Resource endpoints harvested for each repository.
//!
//! Seven endpoints are supported. Two of them (`issues_comments` and
//! `issues_events`) are derived: they are filled per issue while the primary
//! `issues` pages are processed and are never paginated on their own.

use std::fmt;

use url::Url;

use super::error::HarvestError;
use super::locator::RepositoryTarget;

/// Items requested per page.
pub const PER_PAGE: u32 = 100;

/// Top-level resource collection of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// `/repos/{owner}/{repo}/issues`
    Issues,
    /// `/repos/{owner}/{repo}/pulls`
    Pulls,
    /// `/repos/{owner}/{repo}/comments` (commit comments)
    Comments,
    /// `/repos/{owner}/{repo}/commits`
    Commits,
}

impl Resource {
    /// Path segment used by the REST API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::Pulls => "pulls",
            Self::Comments => "comments",
            Self::Commits => "commits",
        }
    }

    /// Whether the listing accepts `state=all`.
    const fn has_state_filter(self) -> bool {
        matches!(self, Self::Issues | Self::Pulls)
    }
}

/// Sub-collection scoped under a [`Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// `.../comments`
    Comments,
    /// `.../events`
    Events,
}

impl Category {
    /// Path segment used by the REST API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comments => "comments",
            Self::Events => "events",
        }
    }
}

/// A harvested endpoint: a resource, optionally narrowed by a category and a
/// free-form sub-category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointSpec {
    resource: Resource,
    category: Option<Category>,
    sub_category: Option<&'static str>,
}

impl EndpointSpec {
    /// `issues`
    pub const ISSUES: Self = Self::top_level(Resource::Issues);
    /// `pulls`
    pub const PULLS: Self = Self::top_level(Resource::Pulls);
    /// `comments`
    pub const COMMENTS: Self = Self::top_level(Resource::Comments);
    /// `commits`
    pub const COMMITS: Self = Self::top_level(Resource::Commits);
    /// `issues_comments`, derived from `issues`.
    pub const ISSUES_COMMENTS: Self = Self::scoped(Resource::Issues, Category::Comments);
    /// `issues_events`, derived from `issues`.
    pub const ISSUES_EVENTS: Self = Self::scoped(Resource::Issues, Category::Events);
    /// `pulls_comments` (review comments).
    pub const PULLS_COMMENTS: Self = Self::scoped(Resource::Pulls, Category::Comments);

    /// Every endpoint in harvesting order.
    pub const ALL: [Self; 7] = [
        Self::ISSUES,
        Self::PULLS,
        Self::COMMENTS,
        Self::COMMITS,
        Self::ISSUES_COMMENTS,
        Self::ISSUES_EVENTS,
        Self::PULLS_COMMENTS,
    ];

    const fn top_level(resource: Resource) -> Self {
        Self {
            resource,
            category: None,
            sub_category: None,
        }
    }

    const fn scoped(resource: Resource, category: Category) -> Self {
        Self {
            resource,
            category: Some(category),
            sub_category: None,
        }
    }

    /// Narrows the endpoint with a sub-category segment.
    #[must_use]
    pub const fn with_sub_category(mut self, sub_category: &'static str) -> Self {
        self.sub_category = Some(sub_category);
        self
    }

    /// True for endpoints filled as a side effect of `issues` pages.
    #[must_use]
    pub const fn is_derived(&self) -> bool {
        matches!(self.resource, Resource::Issues) && self.category.is_some()
    }

    /// Composite key: `base`, `base_category` or `base_category_sub`.
    #[must_use]
    pub fn resource_key(&self) -> String {
        let mut key = self.resource.as_str().to_owned();
        if let Some(category) = self.category {
            key.push('_');
            key.push_str(category.as_str());
        }
        if let Some(sub_category) = self.sub_category {
            key.push('_');
            key.push_str(sub_category);
        }
        key
    }

    /// Builds the listing URL for one page of this endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Configuration`] when `api_base` cannot be
    /// extended with the repository path.
    pub fn page_url(
        &self,
        api_base: &Url,
        target: &RepositoryTarget,
        page: u32,
    ) -> Result<Url, HarvestError> {
        let mut url = api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| HarvestError::Configuration {
                    message: format!("API base '{api_base}' cannot carry a path"),
                })?;
            segments.pop_if_empty().extend([
                "repos",
                target.owner().as_str(),
                target.name().as_str(),
                self.resource.as_str(),
            ]);
            if let Some(category) = self.category {
                segments.push(category.as_str());
            }
            if let Some(sub_category) = self.sub_category {
                segments.push(sub_category);
            }
        }

        {
            let mut query = url.query_pairs_mut();
            query.clear();
            if self.category.is_none() && self.resource.has_state_filter() {
                query.append_pair("state", "all");
            }
            query
                .append_pair("per_page", PER_PAGE.to_string().as_str())
                .append_pair("page", page.to_string().as_str());
        }
        Ok(url)
    }
}

impl fmt::Display for EndpointSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_key().as_str())
    }
}
