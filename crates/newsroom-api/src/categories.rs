use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use newsroom_db::models::CategoryRow;
use newsroom_types::api::{CategoryPayload, CategoryResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::MaybeUser;
use crate::run_db;
use crate::validate::{Validator, slugify};

pub(crate) fn category_response(row: CategoryRow) -> CategoryResponse {
    CategoryResponse {
        id: row.id,
        name: row.name,
        slug: row.slug,
    }
}

pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, |db| db.list_categories()).await?;
    Ok(Json(rows.into_iter().map(category_response).collect::<Vec<_>>()))
}

pub async fn get_category(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let row = run_db(&state, move |db| db.get_category(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(category_response(row)))
}

pub async fn create_category(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    WithRejection(Json(req), _): WithRejection<Json<CategoryPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    check_write_access(&state, user.is_some())?;

    let (name, slug) = validate(req, None)?;
    let row = run_db(&state, move |db| db.insert_category(&name, &slug)).await?;
    info!("Created category {} ({})", row.slug, row.id);

    Ok((StatusCode::CREATED, Json(category_response(row))))
}

pub async fn update_category(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<CategoryPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    check_write_access(&state, user.is_some())?;
    save_category(&state, id, req, false).await
}

pub async fn partial_update_category(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<CategoryPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    check_write_access(&state, user.is_some())?;
    save_category(&state, id, req, true).await
}

pub async fn delete_category(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    check_write_access(&state, user.is_some())?;

    if !run_db(&state, move |db| db.delete_category(id)).await? {
        return Err(ApiError::NotFound);
    }
    info!("Deleted category {}", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn save_category(
    state: &AppState,
    id: i64,
    req: CategoryPayload,
    partial: bool,
) -> Result<Json<CategoryResponse>, ApiError> {
    let current = run_db(state, move |db| db.get_category(id))
        .await?
        .ok_or(ApiError::NotFound)?;

    let (name, slug) = validate(req, partial.then_some(&current))?;
    let row = run_db(state, move |db| db.update_category(id, &name, &slug))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(category_response(row)))
}

/// Validate a payload, filling gaps from `current` for partial updates. A
/// missing slug on create or full update is derived from the name.
fn validate(
    req: CategoryPayload,
    current: Option<&CategoryRow>,
) -> Result<(String, String), ApiError> {
    let mut v = Validator::new();
    let name = v.text("name", req.name.or_else(|| current.map(|c| c.name.clone())), 100);

    let slug = match req.slug.or_else(|| current.map(|c| c.slug.clone())) {
        Some(slug) => v.slug("slug", Some(slug), 100),
        None if !name.is_empty() => v.slug("slug", Some(slugify(&name)), 100),
        None => String::new(),
    };

    v.finish()?;
    Ok((name, slug))
}

fn check_write_access(state: &AppState, authenticated: bool) -> Result<(), ApiError> {
    if state.category_writes_require_auth && !authenticated {
        return Err(ApiError::not_authenticated());
    }
    Ok(())
}
