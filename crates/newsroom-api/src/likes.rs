use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::{debug, info};

use newsroom_db::DbError;
use newsroom_db::models::LikeRow;
use newsroom_types::api::{LikePayload, LikeResponse, LikeToggleResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::news::{find_by_slug, resolve_news};
use crate::run_db;

fn like_response(row: LikeRow) -> LikeResponse {
    LikeResponse {
        id: row.id,
        user: row.user_id,
        news: row.news_id,
        is_liked: row.is_liked,
        timestamp: row.timestamp,
    }
}

/// POST /news/{slug}/like/: like if the caller hasn't, unlike if they have.
/// `likes_count` counts every Like row on the article after the toggle.
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let news = find_by_slug(&state, slug).await?;

    let (news_id, user_id) = (news.id, user.id);
    let outcome = run_db(&state, move |db| missing_as_none(db.toggle_like(news_id, user_id)))
        .await?
        .ok_or(ApiError::NotFound)?;
    debug!(
        "{} {} {} ({} likes)",
        user.username,
        if outcome.liked { "liked" } else { "unliked" },
        news.slug,
        outcome.likes_count
    );

    Ok(Json(LikeToggleResponse {
        liked: outcome.liked,
        likes_count: outcome.likes_count,
    }))
}

/// The article can disappear between the slug lookup and the toggle; that
/// surfaces as a foreign key failure and reads as "not found".
fn missing_as_none<T>(result: newsroom_db::Result<T>) -> newsroom_db::Result<Option<T>> {
    match result {
        Err(DbError::MissingReference) => Ok(None),
        other => other.map(Some),
    }
}

// -- Generic resource --

pub async fn list_likes(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, |db| db.list_likes()).await?;
    Ok(Json(rows.into_iter().map(like_response).collect::<Vec<_>>()))
}

pub async fn get_like(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let row = run_db(&state, move |db| db.get_like(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(like_response(row)))
}

/// POST /likes/: the like always belongs to the caller.
pub async fn create_like(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(Json(req), _): WithRejection<Json<LikePayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let news_id = resolve_news(&state, req.news).await?;
    let is_liked = req.is_liked.unwrap_or(true);

    let user_id = user.id;
    let row = run_db(&state, move |db| db.insert_like(user_id, news_id, is_liked)).await?;
    info!("{} created like {} on {}", user.username, row.id, news_id);

    Ok((StatusCode::CREATED, Json(like_response(row))))
}

pub async fn update_like(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<LikePayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    save_like(&state, id, req, false).await
}

pub async fn partial_update_like(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<LikePayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    save_like(&state, id, req, true).await
}

pub async fn delete_like(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if !run_db(&state, move |db| db.delete_like(id)).await? {
        return Err(ApiError::NotFound);
    }
    info!("{} deleted like {}", user.username, id);
    Ok(StatusCode::NO_CONTENT)
}

async fn save_like(
    state: &AppState,
    id: i64,
    req: LikePayload,
    partial: bool,
) -> Result<Json<LikeResponse>, ApiError> {
    let current = run_db(state, move |db| db.get_like(id))
        .await?
        .ok_or(ApiError::NotFound)?;

    let news = req.news.or_else(|| partial.then_some(current.news_id));
    let news_id = resolve_news(state, news).await?;
    // A full update resets an omitted flag to its default
    let is_liked = req
        .is_liked
        .or_else(|| partial.then_some(current.is_liked))
        .unwrap_or(true);

    let row = run_db(state, move |db| db.update_like(id, news_id, is_liked))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(like_response(row)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use newsroom_db::Database;
    use uuid::Uuid;

    #[test]
    fn toggle_on_vanished_article_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let reader = db.create_user("reader", "", "hash").unwrap();

        let outcome = missing_as_none(db.toggle_like(Uuid::new_v4(), reader.id)).unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn other_outcomes_pass_through() {
        assert_eq!(missing_as_none(Ok(3)).unwrap(), Some(3));
        assert!(matches!(
            missing_as_none::<()>(Err(DbError::Poisoned)),
            Err(DbError::Poisoned)
        ));
    }
}
