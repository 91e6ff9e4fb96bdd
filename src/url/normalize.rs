use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a URL according to Page Atlas's normalization rules
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Resolve against `base` when one is given; otherwise default a missing
///    scheme to `https://`
/// 3. Reject anything that is not HTTP(S) or has no host
/// 4. Remove fragment (everything after #)
/// 5. Remove trailing slashes (except for root /)
///
/// Query strings are kept as-is: two URLs that differ only by query are two
/// different pages.
///
/// # Arguments
///
/// * `raw` - The URL string to normalize, possibly relative
/// * `base` - The URL to resolve relative input against
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use page_atlas::url::normalize_url;
///
/// let url = normalize_url("example.com/about/#team", None).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about");
/// ```
pub fn normalize_url(raw: &str, base: Option<&Url>) -> UrlResult<Url> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    // Step 2: Resolve or default the scheme
    let url = match base {
        Some(base) => base.join(raw),
        None if has_scheme(raw) => Url::parse(raw),
        None if raw.starts_with('/') => {
            return Err(UrlError::RelativeWithoutBase(raw.to_string()));
        }
        None => Url::parse(&format!("https://{}", raw)),
    }
    .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    // Step 3: Validate scheme and host
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingDomain),
    }

    // Steps 4 & 5
    Ok(canonicalize(url))
}

/// Returns true if the input starts with `scheme://`
///
/// Only the leading component counts, so a URL embedded in the query string
/// (`?next=https://...`) does not make the input absolute.
fn has_scheme(raw: &str) -> bool {
    let Some((scheme, _)) = raw.split_once("://") else {
        return false;
    };

    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Applies the fragment and trailing-slash rules to an already parsed URL
///
/// Used as the membership key for the frontier and the visited set, so that
/// `/a`, `/a/` and `/a#top` all collapse to one entry.
pub fn canonicalize(mut url: Url) -> Url {
    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        };
        url.set_path(&trimmed);
    }

    url
}
