use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest, TokenResponse},
        identity::CurrentUser,
        jwt::JwtKeys,
        password::hash_password,
        services::{authenticate_credentials, is_valid_email},
    },
    error::ApiError,
    state::AppState,
    users::repo::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Form(payload): Form<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "username and password are required".into(),
        ));
    }

    let user = authenticate_credentials(&state.db, &payload.username, &payload.password).await?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(&user.username).map_err(ApiError::Internal)?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<PublicUser>, ApiError> {
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
        warn!("password too short");
        return Err(ApiError::Validation("password too short".into()));
    }

    let hash = hash_password(&payload.password).map_err(ApiError::Internal)?;

    // Registration always produces a regular, active account.
    let user = User::create(&state.db, &payload.username, &payload.email, &hash, true, false).await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(Json(user.into()))
}

#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.into())
}
