use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;

use crate::model::{Principal, UserContext};

/// Axum extractor for the calling principal.
///
/// Identity is taken from headers set by the authenticating proxy:
/// - X-User-Id: user identifier; without it the caller is anonymous
/// - X-User-Email: optional user email
/// - X-User-Name: optional user display name
#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(principal_from_headers(&parts.headers))
    }
}

pub fn principal_from_headers(headers: &HeaderMap) -> Principal {
    match extract_header_value(headers, "x-user-id") {
        Some(user_id) => Principal::User(UserContext::with_details(
            user_id,
            extract_header_value(headers, "x-user-email"),
            extract_header_value(headers, "x-user-name"),
        )),
        None => Principal::Anonymous,
    }
}

/// Extract a non-blank header value as string
fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    #[test]
    fn test_principal_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_static("2519"),
        );
        headers.insert(
            HeaderName::from_static("x-user-email"),
            HeaderValue::from_static("regular@mozilla.com"),
        );

        let principal = principal_from_headers(&headers);
        assert_eq!(
            principal,
            Principal::User(UserContext::with_details(
                "2519".to_string(),
                Some("regular@mozilla.com".to_string()),
                None,
            ))
        );
    }

    #[test]
    fn test_missing_or_blank_id_is_anonymous() {
        assert_eq!(principal_from_headers(&HeaderMap::new()), Principal::Anonymous);

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_static("   "),
        );
        assert_eq!(principal_from_headers(&headers), Principal::Anonymous);
    }
}
