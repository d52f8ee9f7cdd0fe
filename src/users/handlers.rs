use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::PublicUser,
        identity::CurrentUser,
        password::hash_password,
        policy,
        services::is_valid_email,
    },
    error::ApiError,
    state::AppState,
    users::{
        dto::{CreateUserRequest, Pagination, UpdateUserRequest},
        repo::{User, UserChanges},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", put(update_user).delete(delete_user))
}

#[instrument(skip(state, actor))]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    if !policy::can_manage_users(Some(&actor)) {
        return Err(ApiError::Forbidden);
    }
    let users = User::list(&state.db, page.limit, page.offset).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, actor, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    if !policy::can_manage_users(Some(&actor)) {
        return Err(ApiError::Forbidden);
    }

    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    if payload.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("invalid email".into()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::Validation("password too short".into()));
    }

    let hash = hash_password(&payload.password).map_err(ApiError::Internal)?;
    let user = User::create(
        &state.db,
        &payload.username,
        &payload.email,
        &hash,
        payload.is_active,
        payload.is_admin,
    )
    .await?;

    info!(user_id = user.id, created_by = actor.id, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, actor, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    if !policy::can_manage_users(Some(&actor)) {
        return Err(ApiError::Forbidden);
    }

    if let Some(email) = &payload.email {
        if !is_valid_email(email) {
            return Err(ApiError::Validation("invalid email".into()));
        }
    }
    if let Some(username) = &payload.username {
        if username.trim().is_empty() {
            return Err(ApiError::Validation("username is required".into()));
        }
    }

    let password_hash = match &payload.password {
        Some(plain) => {
            if plain.len() < 8 {
                return Err(ApiError::Validation("password too short".into()));
            }
            Some(hash_password(plain).map_err(ApiError::Internal)?)
        }
        None => None,
    };

    let changes = UserChanges {
        username: payload.username,
        email: payload.email,
        password_hash,
        is_active: payload.is_active,
        is_admin: payload.is_admin,
    };
    let user = User::update(&state.db, id, changes).await?;

    info!(user_id = user.id, updated_by = actor.id, "user updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state, actor))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    policy::ensure_can_delete_user(&actor, id)?;

    User::delete(&state.db, id).await?;

    info!(user_id = id, deleted_by = actor.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
