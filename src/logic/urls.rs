/// Base URL of a request path: drops a trailing `add` or `edit` segment, a
/// trailing slash and, for item-scoped routes, the item id.
///
/// `/articles/add` -> `/articles`, `/articles/intro/edit` -> `/articles` (item
/// scoped), `/articles/` -> `/articles`.
pub fn resolve_base_url(path: &str, has_id: bool) -> String {
    let mut url = path.trim_end_matches('/');

    if let Some((head, last)) = url.rsplit_once('/') {
        if last == "add" || last == "edit" {
            url = head;
        }
    }
    url = url.trim_end_matches('/');

    if has_id {
        if let Some((head, _id)) = url.rsplit_once('/') {
            url = head;
        }
    }
    url.to_string()
}

/// The last non-empty path segment, `""` for the root.
pub fn final_segment(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

/// Join a base URL and one segment with exactly one slash.
pub fn join(base: &str, segment: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segment)
}
