use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::model::UserContext;

/// The identity attached to a request, if any.
///
/// User information is read from headers set by an upstream proxy:
/// - X-User-Id: required for a user to be present
/// - X-User-Email: optional email
/// - X-User-Name: optional display name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentUser(pub Option<UserContext>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(user_from_headers(&parts.headers)))
    }
}

pub fn user_from_headers(headers: &HeaderMap) -> Option<UserContext> {
    let user_id = extract_header_value(headers, "x-user-id")?;
    Some(UserContext::with_details(
        user_id,
        extract_header_value(headers, "x-user-email"),
        extract_header_value(headers, "x-user-name"),
    ))
}

/// Extract a non-empty header value as string
fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
