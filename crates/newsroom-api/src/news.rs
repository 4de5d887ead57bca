use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;
use uuid::Uuid;

use newsroom_db::models::{NewsFields, NewsFilter, NewsRow};
use newsroom_types::api::{NewsPayload, NewsQuery, NewsResponse};

use crate::auth::AppState;
use crate::categories::category_response;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::run_db;
use crate::validate::{REQUIRED, Validator, slugify};

pub(crate) fn news_response(row: NewsRow) -> NewsResponse {
    NewsResponse {
        id: row.id,
        title: row.title,
        slug: row.slug,
        category: row.category.map(category_response),
        author: row.author_username,
        image: row.image,
        body: row.body,
        date_posted: row.date_posted,
        updated_at: row.updated_at,
        is_breaking: row.is_breaking,
        likes_count: row.likes_count,
        comments_count: row.comments_count,
    }
}

/// Look an article up by slug, or 404.
pub(crate) async fn find_by_slug(state: &AppState, slug: String) -> Result<NewsRow, ApiError> {
    run_db(state, move |db| db.get_news_by_slug(&slug))
        .await?
        .ok_or(ApiError::NotFound)
}

/// Check that an article referenced from a payload exists; a missing or bad
/// reference is a `news` field error.
pub(crate) async fn resolve_news(state: &AppState, news: Option<Uuid>) -> Result<Uuid, ApiError> {
    let news_id = news.ok_or_else(|| ApiError::field("news", REQUIRED))?;
    if run_db(state, move |db| db.get_news(news_id)).await?.is_none() {
        return Err(ApiError::field(
            "news",
            format!("Invalid pk \"{news_id}\" - object does not exist."),
        ));
    }
    Ok(news_id)
}

/// GET /news/: newest first. `category` matches a category slug exactly;
/// an unknown slug simply yields no results.
pub async fn list_news(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<NewsQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = NewsFilter {
        category_slug: query.category.filter(|s| !s.is_empty()),
        is_breaking: query.is_breaking,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };

    let rows = run_db(&state, move |db| db.list_news(&filter)).await?;
    Ok(Json(rows.into_iter().map(news_response).collect::<Vec<_>>()))
}

pub async fn get_news(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let row = find_by_slug(&state, slug).await?;
    Ok(Json(news_response(row)))
}

/// POST /news/: the author is always the caller, whatever the body says.
pub async fn create_news(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(Json(req), _): WithRejection<Json<NewsPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = validate(&state, req, None).await?;

    let author_id = user.id;
    let row = run_db(&state, move |db| db.insert_news(author_id, &fields)).await?;
    info!("{} published {} ({})", user.username, row.slug, row.id);

    Ok((StatusCode::CREATED, Json(news_response(row))))
}

pub async fn update_news(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Path(slug): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<NewsPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    save_news(&state, slug, req, false).await
}

pub async fn partial_update_news(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Path(slug): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<NewsPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    save_news(&state, slug, req, true).await
}

pub async fn delete_news(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let row = find_by_slug(&state, slug).await?;

    let id = row.id;
    if !run_db(&state, move |db| db.delete_news(id)).await? {
        return Err(ApiError::NotFound);
    }
    info!("{} deleted {} ({})", user.username, row.slug, id);
    Ok(StatusCode::NO_CONTENT)
}

async fn save_news(
    state: &AppState,
    slug: String,
    req: NewsPayload,
    partial: bool,
) -> Result<Json<NewsResponse>, ApiError> {
    let current = find_by_slug(state, slug).await?;
    let fields = validate(state, req, partial.then_some(&current)).await?;

    let id = current.id;
    let row = run_db(state, move |db| db.update_news(id, &fields))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(news_response(row)))
}

/// Validate a payload into writable columns, taking anything the payload
/// leaves out from `current` (partial updates only).
async fn validate(
    state: &AppState,
    req: NewsPayload,
    current: Option<&NewsRow>,
) -> Result<NewsFields, ApiError> {
    let mut v = Validator::new();

    let title = v.text("title", req.title.or_else(|| current.map(|n| n.title.clone())), 255);
    let slug = match req.slug.or_else(|| current.map(|n| n.slug.clone())) {
        Some(slug) => v.slug("slug", Some(slug), 255),
        // Only creates get here: a partial update always has a current slug
        None if !title.is_empty() => v.slug("slug", Some(slugify(&title)), 255),
        None => String::new(),
    };
    let image = v.text("image", req.image.or_else(|| current.map(|n| n.image.clone())), 100);
    let body = v.text("body", req.body.or_else(|| current.map(|n| n.body.clone())), 0);
    let is_breaking = req
        .is_breaking
        .or_else(|| current.map(|n| n.is_breaking))
        .unwrap_or(false);

    let category_id = match req.category_id {
        Some(requested) => requested,
        None => current.and_then(|n| n.category.as_ref().map(|c| c.id)),
    };
    if let Some(id) = category_id {
        let exists = run_db(state, move |db| db.get_category(id)).await?.is_some();
        if !exists {
            v.error(
                "category_id",
                format!("Invalid pk \"{id}\" - object does not exist."),
            );
        }
    }

    v.finish()?;
    Ok(NewsFields {
        category_id,
        title,
        slug,
        image,
        body,
        is_breaking,
    })
}
