//! `OpenRouter` chat completion client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{ModelCaller, OpenRouterConfig};
use crate::{Error, Result};

/// Model caller backed by the `OpenRouter` HTTP API
pub struct OpenRouterClient {
    client: Client,
    api_url: String,
    api_key: SecretString,
    referer: String,
    title: String,
}

impl OpenRouterClient {
    /// Create a client, or `None` when no API key is configured
    #[must_use]
    pub fn from_config(config: &OpenRouterConfig) -> Option<Self> {
        let key = config.api_key.as_ref().filter(|k| !k.is_empty())?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Some(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: SecretString::from(key.clone()),
            referer: config.referer.clone(),
            title: config.title.clone(),
        })
    }
}

#[async_trait]
impl ModelCaller for OpenRouterClient {
    async fn call(
        &self,
        model: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let request = ChatCompletionRequest {
            model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ModelCall(format!("OpenRouter request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ModelCall(format!(
                "OpenRouter API error: {status} - {body}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ModelCall(format!("OpenRouter body read failed: {e}")))?;

        parse_completion(&body)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Extract the first choice's text from a chat completion body
///
/// # Errors
///
/// Returns [`Error::Parse`] when the body is not a chat completion or
/// carries no choices
pub fn parse_completion(body: &str) -> Result<String> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| Error::parse("openrouter", format!("not a chat completion: {e}")))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::parse("openrouter", "no choices in response"))?;

    Ok(choice.message.content.unwrap_or_default().trim().to_string())
}
