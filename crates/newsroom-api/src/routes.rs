use axum::{
    Router, middleware,
    routing::{MethodRouter, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::middleware::{authenticate, require_auth};
use crate::{categories, comments, likes, news};

/// Register `path` both with and without a trailing slash.
fn both(router: Router<AppState>, path: &str, methods: MethodRouter<AppState>) -> Router<AppState> {
    router
        .route(path, methods.clone())
        .route(&format!("{path}/"), methods)
}

pub fn router(state: AppState) -> Router {
    // Credentials come from the body; these routes ignore any bearer header
    let credentials: Vec<(&str, MethodRouter<AppState>)> = vec![
        ("/auth/register", post(auth::register)),
        ("/auth/token", post(auth::obtain_token)),
        ("/auth/token/refresh", post(auth::refresh_token)),
    ];

    let public: Vec<(&str, MethodRouter<AppState>)> = vec![
        (
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        ),
        (
            "/categories/{id}",
            get(categories::get_category)
                .put(categories::update_category)
                .patch(categories::partial_update_category)
                .delete(categories::delete_category),
        ),
        ("/news", get(news::list_news)),
        ("/news/{slug}", get(news::get_news)),
        (
            "/news/{slug}/comments",
            get(comments::list_news_comments).post(comments::create_news_comment),
        ),
        ("/comments", get(comments::list_comments)),
        ("/comments/{id}", get(comments::get_comment)),
    ];

    let protected: Vec<(&str, MethodRouter<AppState>)> = vec![
        ("/news", post(news::create_news)),
        (
            "/news/{slug}",
            MethodRouter::new()
                .put(news::update_news)
                .patch(news::partial_update_news)
                .delete(news::delete_news),
        ),
        ("/news/{slug}/like", post(likes::toggle_like)),
        ("/comments", post(comments::create_comment)),
        (
            "/comments/{id}",
            MethodRouter::new()
                .put(comments::update_comment)
                .patch(comments::partial_update_comment)
                .delete(comments::delete_comment),
        ),
        ("/likes", get(likes::list_likes).post(likes::create_like)),
        (
            "/likes/{id}",
            get(likes::get_like)
                .put(likes::update_like)
                .patch(likes::partial_update_like)
                .delete(likes::delete_like),
        ),
    ];

    let public_routes = public
        .into_iter()
        .fold(Router::new().route("/health", get(health)), |router, (path, methods)| {
            both(router, path, methods)
        });
    let protected_routes = protected
        .into_iter()
        .fold(Router::new(), |router, (path, methods)| both(router, path, methods))
        .route_layer(middleware::from_fn(require_auth));

    let credential_routes = credentials
        .into_iter()
        .fold(Router::new(), |router, (path, methods)| both(router, path, methods));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .merge(credential_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
