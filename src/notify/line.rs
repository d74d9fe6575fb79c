//! LINE Messaging API integration
//!
//! Authentication uses a stateless channel access token: a short-lived JWT signed
//! with the channel's RSA assertion key is exchanged for an access token,
//! which then authorizes the push request.
//!
//! # Setup
//!
//! 1. Create a Messaging API channel and register an assertion signing key
//! 2. Note the channel id and the key id (`kid`)
//! 3. Store the private key as PEM and point `line.private_key_path` at it,
//!    or export it in `LINE_PRIVATE_KEY`

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::PushNotifier;
use crate::config::Config;
use crate::error::{LearningError, Result};

/// LINE API base URL
pub const LINE_API_BASE: &str = "https://api.line.me";

/// Lifetime of the signed client assertion
const ASSERTION_EXPIRY_MINUTES: i64 = 30;

/// Requested lifetime of the issued access token (30 days)
const TOKEN_LIFETIME_SECS: i64 = 60 * 60 * 24 * 30;

/// Runtime LINE configuration with the key material loaded
#[derive(Clone)]
pub struct LineConfig {
    pub channel_id: String,
    pub kid: String,
    /// RSA private key, PEM encoded
    pub private_key_pem: String,
    /// Default recipient (user id) for pushes
    pub recipient: Option<String>,
    pub api_base: String,
}

impl std::fmt::Debug for LineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineConfig")
            .field("channel_id", &self.channel_id)
            .field("kid", &self.kid)
            .field("private_key_pem", &"<redacted>")
            .field("recipient", &self.recipient)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl LineConfig {
    /// Build from the main config. Environment variables win over the file:
    /// `LINE_CHANNEL_ID`, `LINE_KID`, `LINE_PRIVATE_KEY`, `LINE_USER_ID`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = &config.line;

        let channel_id = std::env::var("LINE_CHANNEL_ID")
            .ok()
            .or_else(|| settings.channel_id.clone())
            .unwrap_or_default();

        let kid = std::env::var("LINE_KID")
            .ok()
            .or_else(|| settings.kid.clone())
            .unwrap_or_default();

        let private_key_pem = match std::env::var("LINE_PRIVATE_KEY") {
            Ok(pem) => pem,
            Err(_) => match &settings.private_key_path {
                Some(path) => std::fs::read_to_string(path)?,
                None => String::new(),
            },
        };

        let recipient = std::env::var("LINE_USER_ID")
            .ok()
            .or_else(|| settings.recipient.clone());

        Ok(Self {
            channel_id,
            kid,
            private_key_pem,
            recipient,
            api_base: settings.api_base.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.channel_id.is_empty() && !self.kid.is_empty() && !self.private_key_pem.is_empty()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }
}

/// Claims of the client assertion JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    /// Requested access token lifetime in seconds
    pub token_exp: i64,
}

impl AssertionClaims {
    pub fn for_channel(channel_id: &str) -> Self {
        Self {
            iss: channel_id.to_string(),
            sub: channel_id.to_string(),
            aud: format!("{}/", LINE_API_BASE),
            exp: (Utc::now() + Duration::minutes(ASSERTION_EXPIRY_MINUTES)).timestamp(),
            token_exp: TOKEN_LIFETIME_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// LINE push client
#[derive(Debug, Clone)]
pub struct LineClient {
    config: LineConfig,
    http_client: reqwest::Client,
}

impl LineClient {
    pub fn new(config: LineConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| LearningError::Notification(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http_client })
    }

    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    /// Sign the client assertion with the channel's RSA key
    pub fn build_assertion(&self) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.config.kid.clone());

        let key = EncodingKey::from_rsa_pem(self.config.private_key_pem.as_bytes())
            .map_err(|e| LearningError::Notification(format!("Invalid assertion signing key: {}", e)))?;

        encode(&header, &AssertionClaims::for_channel(&self.config.channel_id), &key)
            .map_err(|e| LearningError::Notification(format!("Failed to sign assertion: {}", e)))
    }

    /// Exchange a signed assertion for a channel access token
    pub async fn issue_access_token(&self) -> Result<String> {
        let assertion = self.build_assertion()?;

        let response = self
            .http_client
            .post(self.config.url("/oauth2/v3/token"))
            .form(&[
                ("grant_type", "client_credentials"),
                (
                    "client_assertion_type",
                    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer",
                ),
                ("client_assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| LearningError::Notification(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LearningError::Notification(format!(
                "Token acquisition failed: {} {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| LearningError::Notification(format!("Failed to parse token response: {}", e)))?;

        debug!("Issued LINE access token (expires in {:?}s)", token.expires_in);
        Ok(token.access_token)
    }
}

#[async_trait]
impl PushNotifier for LineClient {
    async fn push_text(&self, recipient: &str, text: &str) -> Result<()> {
        let access_token = self.issue_access_token().await?;

        let request = PushRequest {
            to: recipient,
            messages: vec![TextMessage { kind: "text", text }],
        };

        let response = self
            .http_client
            .post(self.config.url("/v2/bot/message/push"))
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| LearningError::Notification(format!("Push request failed: {}", e)))?;

        if response.status().is_success() {
            info!("LINE message sent to {}", recipient);
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("LINE message send failed: {} - {}", status, body);
            Err(LearningError::Notification(format!("Push rejected: {} {}", status, body)))
        }
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn name(&self) -> &'static str {
        "line"
    }
}
