use super::{AuthorityError, IdentityAuthority, VerifiedToken};
use crate::APP_USER_AGENT;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

pub struct AuthorityConfig {
    base_url: String,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl AuthorityConfig {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            api_key: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<SecretString>) -> Self {
        self.api_key = api_key;
        self
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout = Duration::from_millis(timeout_ms);
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for AuthorityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorityConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyIdTokenRequest<'a> {
    token: &'a str,
    check_revoked: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MintSessionRequest<'a> {
    id_token: &'a str,
    valid_duration_seconds: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifySessionRequest<'a> {
    session_credential: &'a str,
    check_revoked: bool,
}

#[derive(Serialize)]
struct LookupUserRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SetCustomClaimsRequest<'a> {
    custom_claims: &'a Map<String, Value>,
}

#[derive(Deserialize)]
struct ClaimsResponse {
    claims: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MintSessionResponse {
    session_credential: String,
}

#[derive(Deserialize)]
struct LookupUserResponse {
    uid: String,
}

/// Identity authority reached over its JSON REST API.
#[derive(Debug)]
pub struct HttpIdentityAuthority {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl HttpIdentityAuthority {
    /// Build a client with bounded request and connect timeouts.
    ///
    /// # Errors
    /// Returns an error if the base URL is not an absolute http(s) URL or the
    /// HTTP client cannot be built.
    pub fn new(config: AuthorityConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid identity authority URL: {}", config.base_url))?;

        match base_url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(anyhow!(
                    "Error parsing identity authority URL: unsupported scheme {scheme}"
                ))
            }
        }

        if base_url.cannot_be_a_base() {
            return Err(anyhow!(
                "Identity authority URL cannot be used as a base: {}",
                config.base_url
            ));
        }

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(MAX_CONNECT_TIMEOUT))
            .build()
            .context("Failed to build identity authority client")?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
        })
    }

    /// Scheme, host, and port of the base URL; never includes path or credentials.
    #[must_use]
    pub fn origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }

    /// Find the uid of the account registered with `email`.
    ///
    /// # Errors
    /// Returns [`AuthorityError`] if the lookup fails or the user does not exist.
    #[instrument(skip(self, email))]
    pub async fn lookup_user_by_email(&self, email: &str) -> Result<String, AuthorityError> {
        let url = self.endpoint(&["v1", "users:lookup"])?;
        let response: LookupUserResponse =
            self.post_json(url, &LookupUserRequest { email }).await?;

        if response.uid.trim().is_empty() {
            return Err(AuthorityError::InvalidResponse(
                "empty uid in lookup response".to_string(),
            ));
        }

        Ok(response.uid)
    }

    /// Replace the custom claims attached to `uid`.
    ///
    /// # Errors
    /// Returns [`AuthorityError`] if the authority refuses or cannot be reached.
    #[instrument(skip(self, claims))]
    pub async fn set_custom_claims(
        &self,
        uid: &str,
        claims: &Map<String, Value>,
    ) -> Result<(), AuthorityError> {
        let action = format!("{uid}:setCustomClaims");
        let url = self.endpoint(&["v1", "users", &action])?;
        self.post(
            url,
            &SetCustomClaimsRequest {
                custom_claims: claims,
            },
        )
        .await?;
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AuthorityError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AuthorityError::Unavailable("invalid base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<Response, AuthorityError> {
        debug!("identity authority request: {}", url.path());

        let mut request = self.client.post(url).json(body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthorityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status.is_client_error() {
            Err(AuthorityError::Rejected(status.as_u16()))
        } else {
            Err(AuthorityError::Unavailable(format!("status {status}")))
        }
    }

    async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<R, AuthorityError> {
        self.post(url, body)
            .await?
            .json::<R>()
            .await
            .map_err(|e| AuthorityError::InvalidResponse(e.to_string()))
    }

    async fn verify_claims<B: Serialize + ?Sized>(
        &self,
        action: &str,
        body: &B,
    ) -> Result<VerifiedToken, AuthorityError> {
        let url = self.endpoint(&["v1", action])?;
        let response: ClaimsResponse = self.post_json(url, body).await?;
        VerifiedToken::from_claims(&response.claims)
            .map_err(|e| AuthorityError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl IdentityAuthority for HttpIdentityAuthority {
    #[instrument(skip(self, id_token))]
    async fn verify_id_token(
        &self,
        id_token: &str,
        check_revoked: bool,
    ) -> Result<VerifiedToken, AuthorityError> {
        self.verify_claims(
            "id-tokens:verify",
            &VerifyIdTokenRequest {
                token: id_token,
                check_revoked,
            },
        )
        .await
    }

    #[instrument(skip(self, id_token))]
    async fn create_session_credential(
        &self,
        id_token: &str,
        max_age_seconds: u64,
    ) -> Result<String, AuthorityError> {
        let url = self.endpoint(&["v1", "session-credentials:mint"])?;
        let response: MintSessionResponse = self
            .post_json(
                url,
                &MintSessionRequest {
                    id_token,
                    valid_duration_seconds: max_age_seconds,
                },
            )
            .await?;

        if response.session_credential.is_empty() {
            return Err(AuthorityError::InvalidResponse(
                "empty session credential".to_string(),
            ));
        }

        Ok(response.session_credential)
    }

    #[instrument(skip(self, credential))]
    async fn verify_session_credential(
        &self,
        credential: &str,
        check_revoked: bool,
    ) -> Result<VerifiedToken, AuthorityError> {
        self.verify_claims(
            "session-credentials:verify",
            &VerifySessionRequest {
                session_credential: credential,
                check_revoked,
            },
        )
        .await
    }

    #[instrument(skip(self))]
    async fn revoke_refresh_tokens(&self, uid: &str) -> Result<(), AuthorityError> {
        let action = format!("{uid}:revokeTokens");
        let url = self.endpoint(&["v1", "users", &action])?;
        self.post(url, &json!({})).await?;
        Ok(())
    }
}
