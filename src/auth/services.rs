use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::auth::password::verify_password;
use crate::error::ApiError;
use crate::users::repo::User;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Resolve a username/password pair to a user record.
///
/// The active flag is checked before the password so that a deactivated
/// account always fails with `Inactive`, whatever was typed.
pub async fn authenticate_credentials(
    db: &PgPool,
    username: &str,
    password: &str,
) -> Result<User, ApiError> {
    let user = User::find_by_username(db, username)
        .await?
        .ok_or(ApiError::NotFound)?;

    if !user.is_active {
        warn!(username = %username, "login attempt on deactivated account");
        return Err(ApiError::Inactive);
    }

    let ok = verify_password(password, &user.password_hash).map_err(ApiError::Internal)?;
    if !ok {
        warn!(username = %username, "login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    Ok(user)
}

/// Resolve a bearer token to a user record.
///
/// The subject must still exist, and the account must still be active: a
/// token minted before deactivation stops working on its next use, even
/// though the token itself cannot be revoked.
pub async fn authenticate_token(
    db: &PgPool,
    keys: &JwtKeys,
    token: &str,
) -> Result<User, ApiError> {
    let claims = keys.verify(token)?;

    let user = User::find_by_username(db, &claims.sub)
        .await?
        .ok_or(ApiError::NotFound)?;

    if !user.is_active {
        warn!(username = %claims.sub, "token presented for deactivated account");
        return Err(ApiError::Inactive);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(is_valid_email("reader@example.com"));
        assert!(is_valid_email("a.b+tag@mail.co.uk"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("missing@tld"));
    }
}
