use crate::permissions::{self, Permission};

/// Failure of a call to the game publisher's API.
///
/// The first seven variants classify upstream responses; `NoCredential`
/// and `MissingPermissions` are raised locally before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("invalid key")]
    InvalidKey,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found")]
    NotFound,

    #[error("rate limited")]
    RateLimited,

    #[error("API not active")]
    Inactive,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("no API key")]
    NoCredential,

    #[error("missing permissions: {}", permissions::join(.0))]
    MissingPermissions(Vec<Permission>),
}

/// Discriminant of [`ApiError`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    InvalidKey,
    BadRequest,
    Forbidden,
    NotFound,
    RateLimited,
    Inactive,
    ConnectionError,
    NoCredential,
    MissingPermissions,
}

impl ApiErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiErrorKind::InvalidKey => "InvalidKey",
            ApiErrorKind::BadRequest => "BadRequest",
            ApiErrorKind::Forbidden => "Forbidden",
            ApiErrorKind::NotFound => "NotFound",
            ApiErrorKind::RateLimited => "RateLimited",
            ApiErrorKind::Inactive => "Inactive",
            ApiErrorKind::ConnectionError => "ConnectionError",
            ApiErrorKind::NoCredential => "NoCredential",
            ApiErrorKind::MissingPermissions => "MissingPermissions",
        }
    }
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::InvalidKey => ApiErrorKind::InvalidKey,
            ApiError::BadRequest(_) => ApiErrorKind::BadRequest,
            ApiError::Forbidden(_) => ApiErrorKind::Forbidden,
            ApiError::NotFound => ApiErrorKind::NotFound,
            ApiError::RateLimited => ApiErrorKind::RateLimited,
            ApiError::Inactive => ApiErrorKind::Inactive,
            ApiError::Connection(_) => ApiErrorKind::ConnectionError,
            ApiError::NoCredential => ApiErrorKind::NoCredential,
            ApiError::MissingPermissions(_) => ApiErrorKind::MissingPermissions,
        }
    }

    /// Only `BadRequest` is retried: the publisher intermittently answers
    /// 400 while its backend is degraded. 429 is never retried.
    pub fn is_retriable(&self) -> bool {
        matches!(self, ApiError::BadRequest(_))
    }

    /// One-line message shown to the user who issued a command.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::InvalidKey => "Your API key is invalid! Remove it with `/key remove` \
                 and add a new one with `/key add`."
                .to_string(),
            ApiError::Inactive => {
                "The API is currently down. Try again later.".to_string()
            }
            ApiError::NoCredential => "You need to add an API key to use this command. \
                 Create one at https://account.arena.net/applications and use `/key add`."
                .to_string(),
            ApiError::MissingPermissions(missing) => format!(
                "Your API key is missing the following permissions: {}. \
                 Add a new key with these permissions using `/key add`.",
                permissions::join(missing)
            ),
            other => format!(
                "API has responded with the following error: {}",
                other.kind().as_str()
            ),
        }
    }
}

/// Domain-level failures unrelated to the upstream API.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found: {name}")]
    NotFound { entity: &'static str, name: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_bad_request_is_retriable() {
        assert!(ApiError::BadRequest("x".into()).is_retriable());
        for err in [
            ApiError::InvalidKey,
            ApiError::Forbidden(String::new()),
            ApiError::NotFound,
            ApiError::RateLimited,
            ApiError::Inactive,
            ApiError::Connection(String::new()),
            ApiError::NoCredential,
            ApiError::MissingPermissions(vec![]),
        ] {
            assert!(!err.is_retriable(), "{err:?} must not be retried");
        }
    }

    #[test]
    fn generic_message_names_the_kind() {
        assert_eq!(
            ApiError::RateLimited.user_message(),
            "API has responded with the following error: RateLimited"
        );
        assert_eq!(
            ApiError::Connection("reset".into()).user_message(),
            "API has responded with the following error: ConnectionError"
        );
    }

    #[test]
    fn missing_permissions_message_lists_scopes() {
        let msg = ApiError::MissingPermissions(vec![Permission::Wallet, Permission::Progression])
            .user_message();
        assert!(msg.contains("wallet, progression"));
    }

    #[test]
    fn invalid_key_and_inactive_have_remediation() {
        assert!(ApiError::InvalidKey.user_message().contains("/key add"));
        assert!(ApiError::Inactive.user_message().contains("Try again later"));
    }
}
