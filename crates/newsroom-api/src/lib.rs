pub mod auth;
pub mod categories;
pub mod comments;
pub mod error;
pub mod likes;
pub mod middleware;
pub mod news;
pub mod routes;
pub mod validate;

use tracing::error;

use newsroom_db::Database;

use crate::auth::AppState;
use crate::error::ApiError;

/// Run a blocking database call off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> newsroom_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
