//! Chat database API client
//!
//! The database service stores chat history and manages room PINs. The bot
//! only proxies a handful of its endpoints: health, statistics and the PIN
//! authentication flow.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Database API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseApiConfig {
    /// Base URL of the service
    pub url: String,
    /// Bearer token (usually supplied through `DATABASE_API_KEY`)
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for DatabaseApiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

/// Who is asking, for the PIN endpoints
#[derive(Debug, Clone, Serialize)]
pub struct RoomUser<'a> {
    /// Chat or room id
    pub room_id: &'a str,
    /// Display name of the requester
    pub user_name: &'a str,
    /// Platform name (`matrix`, `simplex`)
    pub platform: &'a str,
}

/// A freshly issued room PIN
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PinGrant {
    /// The PIN itself
    pub pin: String,
    /// Human-readable validity period
    #[serde(default)]
    pub validity: Option<String>,
}

/// Statistic that the service may report as a number or preformatted text
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    /// Integer count
    Count(u64),
    /// Fractional figure
    Number(f64),
    /// Preformatted text such as `12.4 MB`
    Text(String),
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// `/stats` response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatabaseStats {
    /// Stored messages
    pub total_messages: Option<StatValue>,
    /// Stored attachments
    pub total_media_files: Option<StatValue>,
    /// On-disk size
    pub database_size: Option<StatValue>,
}

/// Operations the auth and database plugins need
#[async_trait]
pub trait DatabaseApi: Send + Sync {
    /// Whether the service reports itself healthy
    ///
    /// # Errors
    ///
    /// Returns error if the service cannot be reached
    async fn health(&self) -> Result<bool>;

    /// Storage statistics
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is malformed
    async fn stats(&self) -> Result<DatabaseStats>;

    /// Issue a new PIN for a room
    ///
    /// # Errors
    ///
    /// Returns error if the service refuses or answers unexpectedly
    async fn request_pin(&self, who: &RoomUser<'_>) -> Result<PinGrant>;

    /// Check a PIN for a room
    ///
    /// # Errors
    ///
    /// Returns error if the service cannot be reached
    async fn verify_pin(&self, who: &RoomUser<'_>, pin: &str) -> Result<bool>;

    /// Whether the user already authenticated in the room
    ///
    /// # Errors
    ///
    /// Returns error if the service cannot be reached
    async fn check_auth(&self, who: &RoomUser<'_>) -> Result<bool>;
}

/// HTTP client for the database service
pub struct DatabaseApiClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl DatabaseApiClient {
    /// Create a client, or `None` without an API key
    #[must_use]
    pub fn from_config(config: &DatabaseApiConfig) -> Option<Self> {
        let key = config.api_key.as_ref().filter(|k| !k.is_empty())?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Some(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: SecretString::from(key.clone()),
        })
    }

    async fn get(&self, path: &str) -> Result<Response> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| Error::DatabaseApi(format!("request failed: {e}")))?;
        check_status(response).await
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<Response> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::DatabaseApi(format!("request failed: {e}")))?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::DatabaseApi(format!("API error: {status} - {body}")))
}

#[derive(Serialize)]
struct PinRequestBody<'a> {
    #[serde(flatten)]
    who: &'a RoomUser<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pin: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    valid: bool,
}

#[derive(Deserialize)]
struct CheckAuthResponse {
    #[serde(default)]
    authenticated: bool,
}

fn parse<'de, T: Deserialize<'de>>(body: &'de str, what: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| Error::parse("database-api", format!("invalid {what} response: {e}")))
}

/// Parse a `/health` body
///
/// # Errors
///
/// Returns [`Error::Parse`] if the body has no `status`
pub fn parse_health(body: &str) -> Result<bool> {
    Ok(parse::<HealthResponse>(body, "health")?.status == "healthy")
}

/// Parse a `/stats` body
///
/// # Errors
///
/// Returns [`Error::Parse`] if the body is not a stats object
pub fn parse_stats(body: &str) -> Result<DatabaseStats> {
    parse(body, "stats")
}

#[async_trait]
impl DatabaseApi for DatabaseApiClient {
    async fn health(&self) -> Result<bool> {
        let body = self.get("/health").await?.text().await?;
        parse_health(&body)
    }

    async fn stats(&self) -> Result<DatabaseStats> {
        let body = self.get("/stats").await?.text().await?;
        parse_stats(&body)
    }

    async fn request_pin(&self, who: &RoomUser<'_>) -> Result<PinGrant> {
        let body = PinRequestBody {
            who,
            pin: None,
            timestamp: Some(Utc::now().to_rfc3339()),
        };
        let text = self.post("/auth/request-pin", &body).await?.text().await?;
        parse(&text, "request-pin")
    }

    async fn verify_pin(&self, who: &RoomUser<'_>, pin: &str) -> Result<bool> {
        let body = PinRequestBody {
            who,
            pin: Some(pin),
            timestamp: Some(Utc::now().to_rfc3339()),
        };
        let text = self.post("/auth/verify-pin", &body).await?.text().await?;
        Ok(parse::<VerifyResponse>(&text, "verify-pin")?.valid)
    }

    async fn check_auth(&self, who: &RoomUser<'_>) -> Result<bool> {
        let body = PinRequestBody {
            who,
            pin: None,
            timestamp: None,
        };
        let text = self.post("/auth/check-auth", &body).await?.text().await?;
        Ok(parse::<CheckAuthResponse>(&text, "check-auth")?.authenticated)
    }
}
