use crate::client::{EsiConfig, DEFAULT_ESI_BASE_URL};
use crate::{GatewayError, Result};
use async_trait::async_trait;
use fcat_protocol::CharacterId;
use serde::Deserialize;
use std::fmt;

/// Bearer token plus the character it belongs to.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub character_id: CharacterId,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, character_id: CharacterId) -> Self {
        Self {
            access_token: access_token.into(),
            character_id,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("character_id", &self.character_id)
            .finish()
    }
}

/// Produces a credential for the authenticated gateway.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self) -> Result<Credential>;
}

/// Hands out a credential that is already fully known.
pub struct StaticAuthenticator {
    credential: Credential,
}

impl StaticAuthenticator {
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self) -> Result<Credential> {
        Ok(self.credential.clone())
    }
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(rename = "CharacterID")]
    character_id: CharacterId,
    #[serde(rename = "CharacterName", default)]
    character_name: Option<String>,
}

/// Resolves the owning character of an access token through `/verify/`.
pub struct TokenVerifier {
    http: reqwest::Client,
    verify_url: String,
    access_token: String,
}

impl TokenVerifier {
    pub fn new(config: &EsiConfig, access_token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|err| GatewayError::Client(err.to_string()))?;
        let base = if config.base_url.is_empty() {
            DEFAULT_ESI_BASE_URL
        } else {
            config.base_url.trim_end_matches('/')
        };
        Ok(Self {
            http,
            verify_url: format!("{base}/verify/"),
            access_token: access_token.into(),
        })
    }
}

#[async_trait]
impl Authenticator for TokenVerifier {
    async fn authenticate(&self) -> Result<Credential> {
        let response = self
            .http
            .get(&self.verify_url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        if let Some(err) = GatewayError::from_status(response.status(), &self.verify_url) {
            return Err(err);
        }
        let bytes = response.bytes().await?;
        let verified: VerifyResponse = serde_json::from_slice(&bytes)?;
        log::info!(
            "Verified token for {} ({})",
            verified.character_name.as_deref().unwrap_or("unknown pilot"),
            verified.character_id
        );
        Ok(Credential::new(self.access_token.clone(), verified.character_id))
    }
}
