//! The gateway client.

use futures::future::try_join_all;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tyria_core::credentials::{Credential, KeyRing};
use tyria_core::error::ApiError;
use tyria_core::permissions::Permission;
use tyria_core::schema::{SchemaVersion, SCHEMA_HEADER};

use crate::classify::{classify, is_success};
use crate::retry::RetryPolicy;

/// Default publisher API base.
pub const DEFAULT_BASE_URL: &str = "https://api.guildwars2.com/v2/";

/// Default publisher news feed.
pub const DEFAULT_NEWS_FEED: &str = "https://www.guildwars2.com/en/feed/";

/// Relative endpoint built from raw path segments and query pairs, each
/// escaped so user input cannot change the path or add parameters.
pub fn endpoint(segments: &[&str], query: &[(&str, &str)]) -> String {
    let Ok(mut url) = Url::parse("http://endpoint.invalid/") else {
        return segments.join("/");
    };
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    match url.query() {
        Some(q) => format!("{}?{q}", url.path().trim_start_matches('/')),
        None => url.path().trim_start_matches('/').to_string(),
    }
}

/// Gateway settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub news_feed_url: String,
    /// Schema pinned when a call does not override it.
    pub schema: SchemaVersion,
    pub retry: RetryPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            news_feed_url: DEFAULT_NEWS_FEED.to_string(),
            schema: SchemaVersion::service_default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// How a call is authorised.
#[derive(Debug, Clone, Copy)]
pub enum Auth<'a> {
    /// Public endpoint, no credential.
    Anonymous,
    /// A raw token that has not been validated yet (key registration).
    Token(&'a str),
    /// A stored credential chosen by the caller.
    Bound(&'a Credential),
    /// A user's ring; the active credential is used.
    User(&'a KeyRing),
}

impl<'a> Auth<'a> {
    /// Pick the bearer token, checking `required` against the credential.
    pub fn resolve(self, required: &[Permission]) -> Result<Option<&'a str>, ApiError> {
        match self {
            Auth::Anonymous => Ok(None),
            Auth::Token(token) => Ok(Some(token)),
            Auth::Bound(credential) => {
                let missing = credential.missing(required);
                if missing.is_empty() {
                    Ok(Some(credential.token.as_str()))
                } else {
                    Err(ApiError::MissingPermissions(missing))
                }
            }
            Auth::User(ring) => ring.resolve(required).map(|c| Some(c.token.as_str())),
        }
    }
}

/// Shared outbound client. Cheap to clone; clones reuse connections.
#[derive(Debug, Clone)]
pub struct Gateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Absolute URL of an endpoint relative to the configured base.
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Fetch an endpoint.
    ///
    /// The credential is resolved first, so `NoCredential` and
    /// `MissingPermissions` never cost a request. `schema` overrides the
    /// configured pin for this call only.
    pub async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        auth: Auth<'_>,
        required: &[Permission],
        schema: Option<&SchemaVersion>,
    ) -> Result<T, ApiError> {
        let token = auth.resolve(required)?;
        let schema = schema.unwrap_or(&self.config.schema);
        self.fetch_with_retry(endpoint, token, schema).await
    }

    /// Fetch a public endpoint with the default schema.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.call(endpoint, Auth::Anonymous, &[], None).await
    }

    /// Fetch several endpoints concurrently under one credential.
    ///
    /// Results come back in input order. The first failure is returned and
    /// the remaining requests are dropped.
    pub async fn get_many<T: DeserializeOwned>(
        &self,
        endpoints: &[&str],
        auth: Auth<'_>,
        required: &[Permission],
    ) -> Result<Vec<T>, ApiError> {
        let token = auth.resolve(required)?;
        let schema = &self.config.schema;
        try_join_all(
            endpoints
                .iter()
                .map(|endpoint| self.fetch_with_retry::<T>(endpoint, token, schema)),
        )
        .await
    }

    async fn fetch_with_retry<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: Option<&str>,
        schema: &SchemaVersion,
    ) -> Result<T, ApiError> {
        let mut attempt = 0usize;
        loop {
            match self.fetch_once(endpoint, token, schema).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retriable() => match self.config.retry.delay_after(attempt) {
                    Some(delay) => {
                        tracing::debug!(
                            endpoint,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Upstream request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        tracing::warn!(endpoint, attempts = attempt + 1, error = %e, "Upstream request failed after all retries");
                        return Err(e);
                    }
                },
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: Option<&str>,
        schema: &SchemaVersion,
    ) -> Result<T, ApiError> {
        let mut request = self
            .client
            .get(self.url(endpoint))
            .header(ACCEPT, "application/json")
            .header(SCHEMA_HEADER, schema.header_value());
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Connection(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Connection(e.to_string()))?;

        if !is_success(status) {
            return Err(classify(status, &body));
        }
        serde_json::from_str(&body)
            .map_err(|e| ApiError::Connection(format!("undecodable response from {endpoint}: {e}")))
    }
}

/// Fixed user agent sent with every request.
pub fn user_agent() -> String {
    format!(
        "tyria/{} (guild wars 2 companion)",
        env!("CARGO_PKG_VERSION")
    )
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn credential(perms: &[Permission]) -> Credential {
        Credential {
            token: "TOKEN".into(),
            account_name: "Someone.1234".into(),
            label: String::new(),
            permissions: perms.to_vec(),
        }
    }

    #[test]
    fn endpoint_escapes_segments_and_query() {
        assert_eq!(endpoint(&["characters", "Zoja Swiftblade"], &[]), "characters/Zoja%20Swiftblade");
        assert_eq!(endpoint(&["characters", "a/b"], &[]), "characters/a%2Fb");
        assert_eq!(
            endpoint(&["guild", "search"], &[("name", "Lords & Ladies")]),
            "guild/search?name=Lords+%26+Ladies"
        );
    }

    #[test]
    fn url_joins_base_and_endpoint() {
        let gateway = Gateway::new(GatewayConfig::default()).unwrap();
        assert_eq!(
            gateway.url("account/raids"),
            "https://api.guildwars2.com/v2/account/raids"
        );
        assert_eq!(gateway.url("/build"), "https://api.guildwars2.com/v2/build");
    }

    #[test]
    fn bound_credential_is_rechecked() {
        let cred = credential(&[Permission::Account]);
        assert_eq!(
            Auth::Bound(&cred).resolve(&[Permission::Account]).unwrap(),
            Some("TOKEN")
        );
        assert_matches!(
            Auth::Bound(&cred).resolve(&[Permission::Account, Permission::Guilds]),
            Err(ApiError::MissingPermissions(m)) if m == vec![Permission::Guilds]
        );
    }

    #[test]
    fn empty_ring_has_no_credential() {
        let ring = KeyRing::default();
        assert_eq!(Auth::User(&ring).resolve(&[]), Err(ApiError::NoCredential));
    }

    #[test]
    fn anonymous_sends_no_token() {
        assert_eq!(Auth::Anonymous.resolve(&[Permission::Wallet]), Ok(None));
    }

    #[test]
    fn user_agent_names_the_service() {
        assert!(user_agent().starts_with("tyria/"));
    }
}
