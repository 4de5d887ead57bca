use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{error, info};

use newsroom_db::Database;
use newsroom_types::api::{
    Claims, RegisterRequest, TokenKind, TokenObtainRequest, TokenPairResponse,
    TokenRefreshRequest, TokenRefreshResponse, UserResponse,
};

use crate::error::ApiError;
use crate::run_db;
use crate::validate::{Validator, is_valid_username};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenSettings,
    pub hasher: Argon2<'static>,
    /// Category writes are open to anonymous callers unless this is set.
    pub category_writes_require_auth: bool,
}

impl AppStateInner {
    pub fn new(db: Database, tokens: TokenSettings) -> Self {
        Self {
            db,
            tokens,
            hasher: Argon2::default(),
            category_writes_require_auth: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::minutes(5),
            refresh_ttl: Duration::days(1),
        }
    }
}

const MIN_PASSWORD_LEN: usize = 8;
const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

/// POST /auth/register/: create an account. No token is issued; clients
/// call /auth/token/ afterwards.
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let mut v = Validator::new();

    let username = v.text("username", req.username, 150);
    if !username.is_empty() && !is_valid_username(&username) {
        v.error(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }

    let email = match req.email.filter(|e| !e.trim().is_empty()) {
        Some(email) => v.email("email", Some(email)),
        None => String::new(),
    };

    let password = match req.password {
        Some(p) if p.is_empty() => {
            v.error("password", crate::validate::BLANK);
            p
        }
        Some(p) if p.chars().count() < MIN_PASSWORD_LEN => {
            v.error(
                "password",
                format!(
                    "This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."
                ),
            );
            p
        }
        Some(p) => p,
        None => {
            v.error("password", crate::validate::REQUIRED);
            String::new()
        }
    };
    v.finish()?;

    let name = username.clone();
    if run_db(&state, move |db| db.get_user_by_username(&name))
        .await?
        .is_some()
    {
        return Err(ApiError::field(
            "username",
            "A user with that username already exists.",
        ));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = state
        .hasher
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal
        })?
        .to_string();

    let user = run_db(&state, move |db| db.create_user(&username, &email, &password_hash)).await?;
    info!("Registered user {} ({})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
        }),
    ))
}

/// POST /auth/token/: exchange credentials for an access/refresh pair.
pub async fn obtain_token(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<TokenObtainRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let mut v = Validator::new();
    let username = v.text("username", req.username, 0);
    let password = match req.password {
        Some(p) if !p.is_empty() => p,
        Some(_) => {
            v.error("password", crate::validate::BLANK);
            String::new()
        }
        None => {
            v.error("password", crate::validate::REQUIRED);
            String::new()
        }
    };
    v.finish()?;

    let user = run_db(&state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::Unauthorized(BAD_CREDENTIALS))?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password).map_err(|e| {
        error!("Stored hash for user {} is unreadable: {}", user.id, e);
        ApiError::Internal
    })?;
    state
        .hasher
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized(BAD_CREDENTIALS))?;

    let access = create_token(&state.tokens, TokenKind::Access, user.id, &user.username)?;
    let refresh = create_token(&state.tokens, TokenKind::Refresh, user.id, &user.username)?;

    Ok(Json(TokenPairResponse { access, refresh }))
}

/// POST /auth/token/refresh/: trade a refresh token for a fresh access token.
pub async fn refresh_token(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<TokenRefreshRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let mut v = Validator::new();
    let refresh = v.text("refresh", req.refresh, 0);
    v.finish()?;

    let claims = decode_token(&state.tokens, &refresh, TokenKind::Refresh)
        .ok_or(ApiError::Unauthorized("Token is invalid or expired"))?;
    let user_id = claims
        .user_id()
        .ok_or(ApiError::Unauthorized("Token is invalid or expired"))?;

    let access = create_token(&state.tokens, TokenKind::Access, user_id, &claims.username)?;
    Ok(Json(TokenRefreshResponse { access }))
}

pub fn create_token(
    settings: &TokenSettings,
    kind: TokenKind,
    user_id: i64,
    username: &str,
) -> Result<String, ApiError> {
    let ttl = match kind {
        TokenKind::Access => settings.access_ttl,
        TokenKind::Refresh => settings.refresh_ttl,
    };
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        kind,
        exp: (Utc::now() + ttl).timestamp().max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(|e| {
        error!("Token encoding failed: {}", e);
        ApiError::Internal
    })
}

/// Validate signature and expiry, and check the token is of the expected kind.
pub fn decode_token(settings: &TokenSettings, token: &str, kind: TokenKind) -> Option<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;
    (data.claims.kind == kind).then_some(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_with_kind() {
        let settings = TokenSettings::new("test-secret");
        let token = create_token(&settings, TokenKind::Access, 42, "alice").unwrap();

        let claims = decode_token(&settings, &token, TokenKind::Access).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.username, "alice");

        assert!(decode_token(&settings, &token, TokenKind::Refresh).is_none());
    }

    #[test]
    fn rejects_foreign_signature_and_expiry() {
        let settings = TokenSettings::new("test-secret");
        let token = create_token(&settings, TokenKind::Access, 1, "alice").unwrap();
        assert!(decode_token(&TokenSettings::new("other"), &token, TokenKind::Access).is_none());

        let expired = TokenSettings {
            access_ttl: Duration::minutes(-10),
            ..TokenSettings::new("test-secret")
        };
        let stale = create_token(&expired, TokenKind::Access, 1, "alice").unwrap();
        assert!(decode_token(&expired, &stale, TokenKind::Access).is_none());
    }
}
