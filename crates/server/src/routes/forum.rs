//! Peer-support forum handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use calmly_core::ForumPostId;

use super::JsonBody;
use crate::error::AppError;
use crate::middleware::Caller;
use crate::models::{ForumPost, ForumReply, ForumSort};
use crate::services::ForumService;
use crate::services::forum::{PostForm, PostThread, ReplyForm};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub sort: ForumSort,
}

/// GET /api/forum/posts?sort=latest|top
pub async fn index(
    State(state): State<AppState>,
    _caller: Caller,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ForumPost>>, AppError> {
    let posts = ForumService::new(state.store(), state.random())
        .list(query.sort)
        .await?;
    Ok(Json(posts))
}

/// POST /api/forum/posts
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(form): JsonBody<PostForm>,
) -> Result<(StatusCode, Json<ForumPost>), AppError> {
    let post = ForumService::new(state.store(), state.random())
        .create_post(&caller.context, form)
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/forum/posts/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ForumPostId>,
    _caller: Caller,
) -> Result<Json<PostThread>, AppError> {
    let thread = ForumService::new(state.store(), state.random())
        .thread(id)
        .await?;
    Ok(Json(thread))
}

/// POST /api/forum/posts/{id}/replies
pub async fn reply(
    State(state): State<AppState>,
    Path(id): Path<ForumPostId>,
    caller: Caller,
    JsonBody(form): JsonBody<ReplyForm>,
) -> Result<(StatusCode, Json<ForumReply>), AppError> {
    let reply = ForumService::new(state.store(), state.random())
        .reply(&caller.context, id, form)
        .await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

/// POST /api/forum/posts/{id}/upvote
pub async fn upvote(
    State(state): State<AppState>,
    Path(id): Path<ForumPostId>,
    caller: Caller,
) -> Result<Json<ForumPost>, AppError> {
    let post = ForumService::new(state.store(), state.random())
        .upvote(&caller.context, id)
        .await?;
    Ok(Json(post))
}
