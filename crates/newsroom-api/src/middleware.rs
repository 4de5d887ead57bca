use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use newsroom_types::api::TokenKind;

use crate::auth::{AppState, decode_token};
use crate::error::ApiError;
use crate::run_db;

/// The account behind a valid access token, loaded fresh from the database.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Resolve a `Bearer` access token into a [`CurrentUser`] extension.
///
/// Requests without a bearer token pass through anonymously. A bearer token
/// that fails validation, or whose user no longer exists, is rejected even on
/// open endpoints.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    let Some(token) = token else {
        return Ok(next.run(req).await);
    };

    let claims = decode_token(&state.tokens, &token, TokenKind::Access)
        .ok_or(ApiError::Unauthorized("Given token not valid for any token type"))?;
    let user_id = claims
        .user_id()
        .ok_or(ApiError::Unauthorized("Token contained no recognizable user identification"))?;

    let user = run_db(&state, move |db| db.get_user_by_id(user_id))
        .await?
        .ok_or(ApiError::Unauthorized("User not found"))?;

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
        email: user.email,
    });
    Ok(next.run(req).await)
}

/// Reject requests that `authenticate` left anonymous.
pub async fn require_auth(req: Request, next: Next) -> Result<Response, ApiError> {
    if req.extensions().get::<CurrentUser>().is_none() {
        return Err(ApiError::not_authenticated());
    }
    Ok(next.run(req).await)
}

/// The caller, if authenticated. For endpoints open to both.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<CurrentUser>().cloned()))
    }
}
