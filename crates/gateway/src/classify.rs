//! Mapping of upstream HTTP failures onto the error taxonomy.

use serde::Deserialize;
use tyria_core::error::ApiError;

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    text: String,
}

/// Extract the `text` field of an error body, falling back to the raw body.
pub fn error_text(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.text.is_empty() => parsed.text,
        _ => body.trim().to_string(),
    }
}

fn is_inactive(text: &str) -> bool {
    text.to_ascii_lowercase().contains("api not active")
}

fn is_invalid_key(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("invalid key") || lower.contains("invalid access token")
}

/// Whether a status counts as success. The publisher answers 206 when
/// some of the requested ids do not exist.
pub fn is_success(status: u16) -> bool {
    status == 200 || status == 206
}

/// Classify a non-success response.
pub fn classify(status: u16, body: &str) -> ApiError {
    let text = error_text(body);
    match status {
        400 if is_invalid_key(&text) => ApiError::InvalidKey,
        400 => ApiError::BadRequest(text),
        403 if is_invalid_key(&text) => ApiError::InvalidKey,
        403 => ApiError::Forbidden(text),
        404 => ApiError::NotFound,
        429 => ApiError::RateLimited,
        503 if is_inactive(&text) => ApiError::Inactive,
        other => ApiError::Connection(format!("HTTP {other}: {text}")),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn invalid_key_on_400_and_403() {
        assert_eq!(classify(400, r#"{"text":"invalid key"}"#), ApiError::InvalidKey);
        assert_eq!(classify(403, r#"{"text":"Invalid Key"}"#), ApiError::InvalidKey);
        assert_eq!(
            classify(400, r#"{"text":"Invalid access token"}"#),
            ApiError::InvalidKey
        );
    }

    #[test]
    fn other_400_is_bad_request_with_text() {
        assert_eq!(
            classify(400, r#"{"text":"ErrBadData"}"#),
            ApiError::BadRequest("ErrBadData".into())
        );
    }

    #[test]
    fn other_403_is_forbidden() {
        assert_matches!(
            classify(403, r#"{"text":"requires scope guilds"}"#),
            ApiError::Forbidden(t) if t == "requires scope guilds"
        );
    }

    #[test]
    fn fixed_statuses() {
        assert_eq!(classify(404, "{}"), ApiError::NotFound);
        assert_eq!(classify(429, ""), ApiError::RateLimited);
        assert_eq!(classify(503, r#"{"text":"API not active"}"#), ApiError::Inactive);
    }

    #[test]
    fn inactive_tolerates_wording_around_the_phrase() {
        assert_eq!(classify(503, r#"{"text":"API not active."}"#), ApiError::Inactive);
        assert_eq!(
            classify(503, r#"{"text":"api Not Active for maintenance"}"#),
            ApiError::Inactive
        );
    }

    #[test]
    fn unrecognised_statuses_are_connection_errors() {
        assert_matches!(classify(503, r#"{"text":"overloaded"}"#), ApiError::Connection(_));
        assert_matches!(classify(500, "<html>"), ApiError::Connection(_));
        assert_matches!(classify(502, ""), ApiError::Connection(_));
    }

    #[test]
    fn non_json_bodies_fall_back_to_raw_text() {
        assert_eq!(error_text("  plain failure "), "plain failure");
        assert_eq!(error_text(r#"{"text":"x"}"#), "x");
    }

    #[test]
    fn partial_content_is_success() {
        assert!(is_success(200));
        assert!(is_success(206));
        assert!(!is_success(204));
    }
}
