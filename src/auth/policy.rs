//! Authorization rules. Pure functions over data fetched per-request;
//! nothing here touches storage.

use crate::error::ApiError;
use crate::posts::repo::Post;
use crate::users::repo::User;

/// A post is readable when it is published, or when the viewer is an
/// admin. Anonymous callers only ever see published posts.
pub fn can_view_post(viewer: Option<&User>, post: &Post) -> bool {
    post.published || viewer.map(|u| u.is_admin).unwrap_or(false)
}

/// All content mutation is admin-only; regular users have no write
/// capability anywhere.
pub fn can_write(viewer: Option<&User>) -> bool {
    viewer.map(|u| u.is_admin).unwrap_or(false)
}

/// User management is admin-only.
pub fn can_manage_users(viewer: Option<&User>) -> bool {
    viewer.map(|u| u.is_admin).unwrap_or(false)
}

/// Deleting a user requires the admin role, and the target must not be the
/// actor's own record. The self-deletion rule holds regardless of role so
/// the last admin cannot lock themselves out.
pub fn ensure_can_delete_user(actor: &User, target_id: i64) -> Result<(), ApiError> {
    if !actor.is_admin {
        return Err(ApiError::Forbidden);
    }
    if actor.id == target_id {
        return Err(ApiError::SelfDeletionForbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn user(id: i64, is_admin: bool) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: "$argon2id$fake".into(),
            is_active: true,
            is_admin,
        }
    }

    fn post(published: bool) -> Post {
        Post {
            id: 1,
            title: "A".into(),
            content: "B".into(),
            published,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            author_id: 1,
            author_name: None,
        }
    }

    #[test]
    fn anonymous_viewer_sees_exactly_the_published_posts() {
        assert!(can_view_post(None, &post(true)));
        assert!(!can_view_post(None, &post(false)));
    }

    #[test]
    fn admin_sees_every_post() {
        let alice = user(1, true);
        assert!(can_view_post(Some(&alice), &post(true)));
        assert!(can_view_post(Some(&alice), &post(false)));
    }

    #[test]
    fn regular_user_cannot_see_unpublished_posts() {
        let bob = user(2, false);
        assert!(can_view_post(Some(&bob), &post(true)));
        assert!(!can_view_post(Some(&bob), &post(false)));
    }

    #[test]
    fn only_admins_can_write() {
        assert!(!can_write(None));
        assert!(!can_write(Some(&user(2, false))));
        assert!(can_write(Some(&user(1, true))));
    }

    #[test]
    fn only_admins_can_manage_users() {
        assert!(!can_manage_users(None));
        assert!(!can_manage_users(Some(&user(2, false))));
        assert!(can_manage_users(Some(&user(1, true))));
    }

    #[test]
    fn non_admin_cannot_delete_anyone() {
        let bob = user(2, false);
        let err = ensure_can_delete_user(&bob, 3).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[test]
    fn admin_cannot_delete_their_own_account() {
        let alice = user(1, true);
        let err = ensure_can_delete_user(&alice, 1).unwrap_err();
        assert!(matches!(err, ApiError::SelfDeletionForbidden));
    }

    #[test]
    fn admin_can_delete_other_users() {
        let alice = user(1, true);
        assert!(ensure_can_delete_user(&alice, 2).is_ok());
    }
}
