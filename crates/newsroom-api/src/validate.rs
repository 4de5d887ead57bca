use crate::error::{ApiError, FieldErrors};

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

/// Collects field errors across a whole payload so that every problem is
/// reported at once. Accessors return an empty value for a rejected field;
/// callers must check [`Validator::finish`] before using anything.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    /// Required, non-blank, trimmed text of at most `max_len` characters.
    /// `max_len` of zero means unbounded.
    pub fn text(&mut self, field: &str, value: Option<String>, max_len: usize) -> String {
        let Some(value) = value else {
            self.error(field, REQUIRED);
            return String::new();
        };
        let value = value.trim();
        if value.is_empty() {
            self.error(field, BLANK);
            return String::new();
        }
        if max_len > 0 && value.chars().count() > max_len {
            self.error(
                field,
                format!("Ensure this field has no more than {max_len} characters."),
            );
            return String::new();
        }
        value.to_string()
    }

    pub fn slug(&mut self, field: &str, value: Option<String>, max_len: usize) -> String {
        let slug = self.text(field, value, max_len);
        if !slug.is_empty() && !is_valid_slug(&slug) {
            self.error(
                field,
                "Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens.",
            );
        }
        slug
    }

    pub fn email(&mut self, field: &str, value: Option<String>) -> String {
        let email = self.text(field, value, 254);
        if !email.is_empty() && !is_valid_email(&email) {
            self.error(field, "Enter a valid email address.");
        }
        email
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

/// `[-a-zA-Z0-9_]+`
pub fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `[\w.@+-]+`
pub fn is_valid_username(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

pub fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

/// Lowercase ASCII slug: runs of anything else collapse into one hyphen.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Breaking -- News  "), "breaking-news");
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slug_charset() {
        assert!(is_valid_slug("sports_2024-final"));
        assert!(!is_valid_slug("two words"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn username_charset() {
        assert!(is_valid_username("alice.b+news@home-1"));
        assert!(!is_valid_username("alice smith"));
        assert!(!is_valid_username("alice/bob"));
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@localhost"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("al ice@example.com"));
        assert!(!is_valid_email("alice@-example.com"));
    }

    #[test]
    fn validator_reports_every_field() {
        let mut v = Validator::new();
        v.text("title", None, 255);
        v.text("body", Some("   ".into()), 0);
        v.text("name", Some("x".repeat(101)), 100);
        let kept = v.text("image", Some(" cover.png ".into()), 100);
        assert_eq!(kept, "cover.png");

        match v.finish() {
            Err(ApiError::Validation(errors)) => {
                assert_eq!(errors.get("title"), Some(&[REQUIRED.to_string()][..]));
                assert_eq!(errors.get("body"), Some(&[BLANK.to_string()][..]));
                assert!(errors.get("name").is_some());
                assert!(errors.get("image").is_none());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
