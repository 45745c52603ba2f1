//! Total page resolution from GitHub `Link` headers.
//!
//! GitHub advertises pagination through a header of the form
//! `<https://api.github.com/...&page=2>; rel="next", <...&page=5>; rel="last"`.
//! Only the `last` relation is consulted; the others are ignored regardless
//! of their order.

use url::Url;

use super::error::HarvestError;
use super::transport::ApiResponse;

/// Returns the total number of pages advertised by `response`.
///
/// A response without a `Link` header (or without a `last` relation) is a
/// single page.
///
/// # Errors
///
/// Returns [`HarvestError::InvalidLinkHeader`] when the `last` entry does not
/// carry a positive `page` parameter.
///
/// # Example
///
/// ```
/// use hoarder::github::pagination::last_page_from_link;
///
/// let header = concat!(
///     r#"<https://api.github.com/x?page=2>; rel="next", "#,
///     r#"<https://api.github.com/x?page=5>; rel="last""#,
/// );
/// assert_eq!(last_page_from_link(Some(header)).ok(), Some(5));
/// assert_eq!(last_page_from_link(None).ok(), Some(1));
/// ```
pub fn last_page(response: &ApiResponse) -> Result<u32, HarvestError> {
    last_page_from_link(response.link.as_deref())
}

/// Parses a raw `Link` header value. See [`last_page`].
///
/// # Errors
///
/// Returns [`HarvestError::InvalidLinkHeader`] for a malformed `last` entry.
pub fn last_page_from_link(link: Option<&str>) -> Result<u32, HarvestError> {
    let Some(header) = link else {
        return Ok(1);
    };

    header
        .split(',')
        .find(|entry| is_last_relation(entry))
        .map_or(Ok(1), parse_page_number)
}

fn is_last_relation(entry: &str) -> bool {
    entry.split(';').skip(1).any(|param| {
        let Some((key, value)) = param.split_once('=') else {
            return false;
        };
        key.trim().eq_ignore_ascii_case("rel")
            && value
                .trim()
                .trim_matches('"')
                .split_whitespace()
                .any(|rel| rel == "last")
    })
}

fn parse_page_number(entry: &str) -> Result<u32, HarvestError> {
    let invalid = || HarvestError::InvalidLinkHeader {
        message: entry.trim().to_owned(),
    };

    let target = entry
        .split(';')
        .next()
        .map(str::trim)
        .and_then(|raw| raw.strip_prefix('<'))
        .and_then(|raw| raw.strip_suffix('>'))
        .ok_or_else(invalid)?;
    let url = Url::parse(target).map_err(|_| invalid())?;

    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .ok_or_else(invalid)
}
