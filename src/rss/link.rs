//! Link canonicalization and item identity.
//!
//! The same article submitted with different tracking parameters must map
//! to one identifier, so links are stripped of known tracking query keys
//! before they are used as a guid.

use tracing::debug;
use url::form_urlencoded;
use url::Url;

/// Remove tracking query parameters from a link.
///
/// Absolute URLs are re-serialized from their parsed form, so scheme and host
/// are normalized the same way whether or not anything was stripped. When no
/// query parameters survive, the `?` is dropped as well.
///
/// Links that do not parse as absolute URLs (scheme-less, relative, or
/// otherwise malformed) are split lexically at `#` and `?` and filtered the
/// same way, leaving the rest of the text as given.
pub fn canonicalize_link<S: AsRef<str>>(link: &str, tracking_params: &[S]) -> String {
    if link.is_empty() {
        return String::new();
    }

    let mut url = match Url::parse(link) {
        Ok(url) => url,
        Err(e) => {
            debug!(link, error = %e, "link is not an absolute URL, filtering it lexically");
            return canonicalize_unparsed(link, tracking_params);
        }
    };

    if let Some(query) = url.query() {
        let kept = retain_query_pairs(query, tracking_params);
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    url.to_string()
}

fn canonicalize_unparsed<S: AsRef<str>>(link: &str, tracking_params: &[S]) -> String {
    let (rest, fragment) = match link.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (link, None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    let mut canonical = path.to_string();
    if let Some(query) = query {
        let kept = retain_query_pairs(query, tracking_params);
        if !kept.is_empty() {
            canonical.push('?');
            canonical.push_str(
                &form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(kept)
                    .finish(),
            );
        }
    }
    if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
        canonical.push('#');
        canonical.push_str(fragment);
    }
    canonical
}

/// Decode a query string and drop the tracking keys, keeping order and blank values.
fn retain_query_pairs<S: AsRef<str>>(query: &str, tracking_params: &[S]) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| !tracking_params.iter().any(|p| p.as_ref() == &**key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Resolve the stable identifier for an item.
///
/// Priority: the explicit guid (trimmed), then the canonical link, then the
/// trimmed title. Returns `None` if all three are blank.
pub fn stable_guid(explicit: Option<&str>, canonical_link: &str, title: &str) -> Option<String> {
    let explicit = explicit.map(str::trim).unwrap_or_default();
    if !explicit.is_empty() {
        return Some(explicit.to_string());
    }
    if !canonical_link.trim().is_empty() {
        return Some(canonical_link.to_string());
    }
    let title = title.trim();
    if !title.is_empty() {
        return Some(title.to_string());
    }
    None
}
