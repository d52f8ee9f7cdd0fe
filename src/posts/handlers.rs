use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        identity::{CurrentUser, Identity},
        policy,
    },
    error::ApiError,
    posts::{
        dto::{CreatePostRequest, Pagination, UpdatePostRequest},
        repo::{Post, PostChanges},
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/:id", get(get_post))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/:id", put(update_post).delete(delete_post))
}

#[instrument(skip(state, identity))]
pub async fn list_posts(
    State(state): State<AppState>,
    identity: Identity,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = Post::list(&state.db, identity.is_admin(), page.limit, page.offset).await?;
    Ok(Json(posts))
}

#[instrument(skip(state, identity))]
pub async fn get_post(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    let post = Post::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    // Unpublished posts are indistinguishable from absent ones for
    // viewers without clearance.
    if !policy::can_view_post(identity.as_user(), &post) {
        return Err(ApiError::NotFound);
    }

    Ok(Json(post))
}

#[instrument(skip(state, actor, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    if !policy::can_write(Some(&actor)) {
        return Err(ApiError::Forbidden);
    }

    if payload.title.trim().is_empty() || payload.content.trim().is_empty() {
        return Err(ApiError::Validation("title and content are required".into()));
    }

    let post = Post::create(
        &state.db,
        &payload.title,
        &payload.content,
        payload.published,
        actor.id,
    )
    .await?;

    info!(post_id = post.id, author_id = actor.id, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

#[instrument(skip(state, actor, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    if !policy::can_write(Some(&actor)) {
        return Err(ApiError::Forbidden);
    }

    let changes = PostChanges {
        title: payload.title,
        content: payload.content,
        published: payload.published,
    };
    let post = Post::update(&state.db, id, changes).await?;

    info!(post_id = post.id, updated_by = actor.id, "post updated");
    Ok(Json(post))
}

#[instrument(skip(state, actor))]
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !policy::can_write(Some(&actor)) {
        return Err(ApiError::Forbidden);
    }

    Post::delete(&state.db, id).await?;

    info!(post_id = id, deleted_by = actor.id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}
