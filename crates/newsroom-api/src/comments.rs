use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;
use uuid::Uuid;

use newsroom_db::models::{CommentFields, CommentRow};
use newsroom_types::api::{CommentPayload, CommentResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::{CurrentUser, MaybeUser};
use crate::news::{find_by_slug, resolve_news};
use crate::run_db;
use crate::validate::Validator;

fn comment_response(row: CommentRow) -> CommentResponse {
    let user_name = row.username.clone().unwrap_or_else(|| row.name.clone());
    CommentResponse {
        id: row.id,
        news: row.news_id,
        user: row.user_id,
        name: row.name,
        email: row.email,
        comment: row.comment,
        timestamp: row.timestamp,
        user_name,
    }
}

/// The single comment-creation path. An authenticated author's name, email
/// and user reference always come from their account; submitted values for
/// those fields are ignored. Anonymous authors must supply both.
async fn create_attributed(
    state: &AppState,
    news_id: Uuid,
    author: Option<CurrentUser>,
    req: CommentPayload,
) -> Result<CommentRow, ApiError> {
    let mut v = Validator::new();
    let (user_id, name, email) = match author {
        Some(user) => (Some(user.id), user.username, user.email),
        None => (None, v.text("name", req.name, 100), v.email("email", req.email)),
    };
    let comment = v.text("comment", req.comment, 0);
    v.finish()?;

    let fields = CommentFields {
        news_id,
        name,
        email,
        comment,
    };
    let row = run_db(state, move |db| db.insert_comment(user_id, &fields)).await?;
    info!(
        "Comment {} on {} by {}",
        row.id,
        row.news_id,
        row.username.as_deref().unwrap_or("anonymous")
    );
    Ok(row)
}

// -- Per-article endpoint --

/// GET /news/{slug}/comments/: newest first.
pub async fn list_news_comments(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let news = find_by_slug(&state, slug).await?;

    let news_id = news.id;
    let rows = run_db(&state, move |db| db.list_comments_for_news(news_id)).await?;
    Ok(Json(rows.into_iter().map(comment_response).collect::<Vec<_>>()))
}

/// POST /news/{slug}/comments/: open to anonymous callers.
pub async fn create_news_comment(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<CommentPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let news = find_by_slug(&state, slug).await?;
    let row = create_attributed(&state, news.id, user, req).await?;
    Ok((StatusCode::CREATED, Json(comment_response(row))))
}

// -- Generic resource --

pub async fn list_comments(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, |db| db.list_comments()).await?;
    Ok(Json(rows.into_iter().map(comment_response).collect::<Vec<_>>()))
}

pub async fn get_comment(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let row = run_db(&state, move |db| db.get_comment(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(comment_response(row)))
}

/// POST /comments/: authenticated, so the comment is always attributed.
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(Json(req), _): WithRejection<Json<CommentPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let news_id = resolve_news(&state, req.news).await?;
    let row = create_attributed(&state, news_id, Some(user), req).await?;
    Ok((StatusCode::CREATED, Json(comment_response(row))))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<CommentPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    save_comment(&state, id, req, false).await
}

pub async fn partial_update_comment(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<CommentPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    save_comment(&state, id, req, true).await
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if !run_db(&state, move |db| db.delete_comment(id)).await? {
        return Err(ApiError::NotFound);
    }
    info!("{} deleted comment {}", user.username, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Attributed comments keep their stored name and email; only anonymous ones
/// accept new values for those fields.
async fn save_comment(
    state: &AppState,
    id: i64,
    req: CommentPayload,
    partial: bool,
) -> Result<Json<CommentResponse>, ApiError> {
    let current = run_db(state, move |db| db.get_comment(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    let base = partial.then_some(&current);

    let news_id = resolve_news(state, req.news.or_else(|| base.map(|c| c.news_id))).await?;

    let mut v = Validator::new();
    let (name, email) = if current.user_id.is_some() {
        (current.name.clone(), current.email.clone())
    } else {
        (
            v.text("name", req.name.or_else(|| base.map(|c| c.name.clone())), 100),
            v.email("email", req.email.or_else(|| base.map(|c| c.email.clone()))),
        )
    };
    let comment = v.text("comment", req.comment.or_else(|| base.map(|c| c.comment.clone())), 0);
    v.finish()?;

    let fields = CommentFields {
        news_id,
        name,
        email,
        comment,
    };
    let row = run_db(state, move |db| db.update_comment(id, &fields))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(comment_response(row)))
}
