//! Home Assistant REST API client

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{Entity, HomeAssistantConfig, TodoItem};
use crate::{Error, Result};

/// The slice of the Home Assistant API the plugin needs
#[async_trait]
pub trait HomeAssistantApi: Send + Sync {
    /// Snapshot of every entity
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is malformed
    async fn states(&self) -> Result<Vec<Entity>>;

    /// Current state of one entity
    ///
    /// # Errors
    ///
    /// Returns error if the entity is unknown or the response is malformed
    async fn state(&self, entity_id: &str) -> Result<Entity>;

    /// Call `domain.service` with `data`
    ///
    /// # Errors
    ///
    /// Returns error if Home Assistant rejects the call
    async fn call_service(&self, domain: &str, service: &str, data: Value) -> Result<()>;

    /// Items of the todo list `list_id`
    ///
    /// # Errors
    ///
    /// Returns error if the list does not exist or the response is malformed
    async fn todo_items(&self, list_id: &str) -> Result<Vec<TodoItem>>;
}

/// HTTP client for a Home Assistant instance
pub struct HomeAssistantClient {
    client: Client,
    base_url: String,
    token: SecretString,
}

impl HomeAssistantClient {
    /// Create a client, or `None` when no token is configured
    #[must_use]
    pub fn from_config(config: &HomeAssistantConfig) -> Option<Self> {
        let token = config.token.as_ref().filter(|t| !t.is_empty())?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Some(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: SecretString::from(token.clone()),
        })
    }

    async fn get(&self, path: &str) -> Result<Response> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| Error::HomeAssistant(format!("request failed: {e}")))?;

        check_status(response).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Response> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::HomeAssistant(format!("request failed: {e}")))?;

        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::HomeAssistant(format!("API error: {status} - {body}")))
}

#[async_trait]
impl HomeAssistantApi for HomeAssistantClient {
    async fn states(&self) -> Result<Vec<Entity>> {
        let body = self.get("/api/states").await?.text().await?;
        parse_states(&body)
    }

    async fn state(&self, entity_id: &str) -> Result<Entity> {
        let body = self
            .get(&format!("/api/states/{entity_id}"))
            .await?
            .text()
            .await?;
        parse_state(&body)
    }

    async fn call_service(&self, domain: &str, service: &str, data: Value) -> Result<()> {
        tracing::debug!(domain, service, "calling home assistant service");
        self.post(&format!("/api/services/{domain}/{service}"), &data)
            .await?;
        Ok(())
    }

    async fn todo_items(&self, list_id: &str) -> Result<Vec<TodoItem>> {
        let body = self
            .post(
                "/api/services/todo/get_items?return_response",
                &serde_json::json!({ "entity_id": list_id }),
            )
            .await?
            .text()
            .await?;

        parse_todo_items(&body, list_id)
    }
}

#[derive(Deserialize)]
struct RawState {
    entity_id: String,
    state: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

impl From<RawState> for Entity {
    fn from(raw: RawState) -> Self {
        let mut attributes = raw.attributes;
        let label = match attributes.remove("friendly_name") {
            Some(Value::String(name)) if !name.is_empty() => Some(name),
            _ => None,
        };

        Self {
            id: raw.entity_id,
            label,
            state: raw.state,
            attributes,
        }
    }
}

/// Parse a `/api/states` body
///
/// # Errors
///
/// Returns [`Error::Parse`] if the body is not a list of states
pub fn parse_states(body: &str) -> Result<Vec<Entity>> {
    let raw: Vec<RawState> = serde_json::from_str(body)
        .map_err(|e| Error::parse("homeassistant", format!("invalid states list: {e}")))?;
    Ok(raw.into_iter().map(Entity::from).collect())
}

/// Parse a `/api/states/<id>` body
///
/// # Errors
///
/// Returns [`Error::Parse`] if the body is not a single state
pub fn parse_state(body: &str) -> Result<Entity> {
    let raw: RawState = serde_json::from_str(body)
        .map_err(|e| Error::parse("homeassistant", format!("invalid state: {e}")))?;
    Ok(raw.into())
}

#[derive(Deserialize)]
struct ServiceResponse {
    service_response: HashMap<String, TodoItemsResponse>,
}

#[derive(Deserialize)]
struct TodoItemsResponse {
    items: Vec<TodoItem>,
}

/// Parse a `todo.get_items` service response for `list_id`
///
/// # Errors
///
/// Returns [`Error::Parse`] if the body has no item list for `list_id`
pub fn parse_todo_items(body: &str, list_id: &str) -> Result<Vec<TodoItem>> {
    let mut parsed: ServiceResponse = serde_json::from_str(body)
        .map_err(|e| Error::parse("homeassistant", format!("invalid todo response: {e}")))?;

    parsed
        .service_response
        .remove(list_id)
        .map(|r| r.items)
        .ok_or_else(|| Error::parse("homeassistant", format!("no items returned for {list_id}")))
}
