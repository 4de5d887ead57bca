use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// Which half of a token pair a JWT is. Only access tokens authenticate
/// requests; refresh tokens are only accepted by the refresh endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string.
    pub sub: String,
    pub username: String,
    pub kind: TokenKind,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Deserialize a field that may be absent, `null`, or a value, keeping the
/// three cases apart: absent -> `None`, null -> `Some(None)`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Deserialize a query-string flag. Empty means unset; `true`/`false`,
/// `1`/`0`, `yes`/`no` and `on`/`off` are accepted in any case.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(serde::de::Error::custom(format!(
            "\"{raw}\" is not a valid boolean"
        ))),
    }
}

// -- Auth --

// Payload fields are optional so that missing ones surface as field errors
// rather than as body rejections.

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenObtainRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenRefreshRequest {
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenRefreshResponse {
    pub access: String,
}

// -- Categories --

#[derive(Debug, Default, Deserialize)]
pub struct CategoryPayload {
    pub name: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

// -- News --

#[derive(Debug, Default, Deserialize)]
pub struct NewsPayload {
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    pub image: Option<String>,
    pub body: Option<String>,
    pub is_breaking: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub category: Option<CategoryResponse>,
    /// Author username.
    pub author: String,
    pub image: String,
    pub body: String,
    pub date_posted: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_breaking: bool,
    pub likes_count: i64,
    pub comments_count: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    /// Exact category slug.
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_breaking: Option<bool>,
    /// Case-insensitive substring of title or body.
    pub search: Option<String>,
}

// -- Comments --

#[derive(Debug, Default, Deserialize)]
pub struct CommentPayload {
    /// Target article. Ignored by the per-article endpoint, which takes it
    /// from the path.
    pub news: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub news: Uuid,
    pub user: Option<i64>,
    pub name: String,
    pub email: String,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
    /// Username for attributed comments, otherwise the display name.
    pub user_name: String,
}

// -- Likes --

#[derive(Debug, Default, Deserialize)]
pub struct LikePayload {
    pub news: Option<Uuid>,
    pub is_liked: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub id: i64,
    pub user: i64,
    pub news: Uuid,
    pub is_liked: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggleResponse {
    pub liked: bool,
    pub likes_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_id_distinguishes_absent_from_null() {
        let absent: NewsPayload = serde_json::from_str(r#"{"title": "t"}"#).unwrap();
        assert_eq!(absent.category_id, None);

        let null: NewsPayload = serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(null.category_id, Some(None));

        let set: NewsPayload = serde_json::from_str(r#"{"category_id": 4}"#).unwrap();
        assert_eq!(set.category_id, Some(Some(4)));
    }

    #[test]
    fn breaking_flag_is_lenient() {
        let parse = |raw: &str| -> Option<bool> {
            serde_json::from_value::<NewsQuery>(serde_json::json!({ "is_breaking": raw }))
                .unwrap()
                .is_breaking
        };
        assert_eq!(parse(""), None);
        assert_eq!(parse("True"), Some(true));
        assert_eq!(parse("1"), Some(true));
        assert_eq!(parse("FALSE"), Some(false));
        assert_eq!(parse("0"), Some(false));

        let absent: NewsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.is_breaking, None);
        assert!(serde_json::from_str::<NewsQuery>(r#"{"is_breaking": "maybe"}"#).is_err());
    }

    #[test]
    fn token_kind_is_lowercase_on_the_wire() {
        let claims = Claims {
            sub: "7".into(),
            username: "alice".into(),
            kind: TokenKind::Refresh,
            exp: 0,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["kind"], "refresh");
        assert_eq!(claims.user_id(), Some(7));
    }
}
