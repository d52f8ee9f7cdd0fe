use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};

use crate::auth::jwt::JwtKeys;
use crate::auth::services::authenticate_token;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::User;

/// Pulls the bearer token out of the Authorization header, if any.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| {
            h.strip_prefix("Bearer ")
                .or_else(|| h.strip_prefix("bearer "))
        })
}

/// Extractor for endpoints that require an authenticated caller. Resolves
/// the bearer token all the way to a user row and rejects otherwise.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::InvalidCredentials)?;
        let keys = JwtKeys::from_ref(state);
        let user = authenticate_token(&state.db, &keys, token).await?;
        Ok(CurrentUser(user))
    }
}

/// Resolved caller identity for endpoints that also serve anonymous
/// readers. Never rejects: a missing, invalid or stale credential
/// downgrades the request to an anonymous read.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    Known(User),
}

impl Identity {
    pub fn as_user(&self) -> Option<&User> {
        match self {
            Identity::Anonymous => None,
            Identity::Known(user) => Some(user),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.as_user().map(|u| u.is_admin).unwrap_or(false)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(Identity::Anonymous);
        };
        let keys = JwtKeys::from_ref(state);
        match authenticate_token(&state.db, &keys, token).await {
            Ok(user) => Ok(Identity::Known(user)),
            Err(_) => Ok(Identity::Anonymous),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let headers = headers_with_auth("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn accepts_lowercase_scheme() {
        let headers = headers_with_auth("bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_other_schemes_and_absent_header() {
        let headers = headers_with_auth("Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&headers), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn anonymous_identity_has_no_user() {
        let identity = Identity::Anonymous;
        assert!(identity.as_user().is_none());
        assert!(!identity.is_admin());
    }
}
