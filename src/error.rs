use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Request-facing error taxonomy. Every failure is terminal for the
/// current request; nothing here is retried internally.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("resource not found")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is deactivated")]
    Inactive,

    #[error("token expired")]
    Expired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("malformed token")]
    Malformed,

    #[error("insufficient permissions")]
    Forbidden,

    #[error("username already taken")]
    DuplicateUsername,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("cannot delete your own account")]
    SelfDeletionForbidden,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials
            | ApiError::Expired
            | ApiError::InvalidSignature
            | ApiError::Malformed => StatusCode::UNAUTHORIZED,
            ApiError::Inactive | ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::DuplicateUsername
            | ApiError::DuplicateEmail
            | ApiError::SelfDeletionForbidden
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Internal faults are logged with detail but rendered opaque.
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_map_to_401() {
        for e in [
            ApiError::InvalidCredentials,
            ApiError::Expired,
            ApiError::InvalidSignature,
            ApiError::Malformed,
        ] {
            assert_eq!(e.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn role_failures_map_to_403() {
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Inactive.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn duplicates_and_self_deletion_map_to_400() {
        assert_eq!(ApiError::DuplicateUsername.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::SelfDeletionForbidden.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let e = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_response_hides_detail() {
        let e = ApiError::Internal(anyhow::anyhow!("connection pool exhausted"));
        let resp = e.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
