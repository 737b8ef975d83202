//! `SimpleX` chat CLI access over its WebSocket API
//!
//! The CLI accepts `{"corrId", "cmd"}` frames and answers with a frame that
//! carries the same `corrId` and a `resp` payload. Unsolicited event frames
//! have no `corrId` and are skipped.

mod response;

pub use response::{
    ChatResponse, Contact, Group, find_invitation_link, parse_response, unwrap_envelope,
};

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

use crate::{Error, Result};

/// `SimpleX` CLI connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplexConfig {
    /// WebSocket URL of the chat CLI (`simplex-chat -p <port>`)
    pub ws_url: String,
    /// Seconds to wait for a command response
    pub timeout_secs: u64,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:5225".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Command channel to a `SimpleX` chat CLI
#[async_trait]
pub trait SimplexCli: Send + Sync {
    /// Send a CLI command and return the raw `resp` value of its reply
    ///
    /// # Errors
    ///
    /// Returns [`Error::Simplex`] if the CLI is unreachable or does not
    /// answer in time
    async fn send_command(&self, cmd: &str) -> Result<Value>;

    /// Where the CLI is reached
    fn endpoint(&self) -> &str;
}

/// WebSocket client that opens one connection per command
pub struct SimplexClient {
    url: String,
    timeout: Duration,
    next_corr_id: AtomicU64,
}

impl SimplexClient {
    /// Create a client for `config`
    #[must_use]
    pub fn new(config: &SimplexConfig) -> Self {
        Self {
            url: config.ws_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            next_corr_id: AtomicU64::new(1),
        }
    }

    async fn exchange(&self, corr_id: &str, cmd: &str) -> Result<Value> {
        let (mut ws, _) = tokio_tungstenite::connect_async(&self.url)
            .await
            .map_err(|e| Error::Simplex(format!("WebSocket connect failed: {e}")))?;

        let frame = serde_json::json!({ "corrId": corr_id, "cmd": cmd });
        ws.send(Message::Text(frame.to_string().into()))
            .await
            .map_err(|e| Error::Simplex(format!("WebSocket send failed: {e}")))?;

        let result = loop {
            let Some(msg) = ws.next().await else {
                break Err(Error::Simplex("connection closed before reply".to_string()));
            };
            let msg = msg.map_err(|e| Error::Simplex(format!("WebSocket read error: {e}")))?;

            match msg {
                Message::Text(text) => {
                    let mut frame: Value = match serde_json::from_str(&text) {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::warn!(error = %e, "skipping unparsable SimpleX frame");
                            continue;
                        }
                    };
                    if frame.get("corrId").and_then(Value::as_str) == Some(corr_id) {
                        break Ok(frame
                            .get_mut("resp")
                            .map(Value::take)
                            .unwrap_or(Value::Null));
                    }
                }
                Message::Ping(data) => {
                    let _ = ws.send(Message::Pong(data)).await;
                }
                Message::Close(_) => {
                    break Err(Error::Simplex("connection closed before reply".to_string()));
                }
                _ => {}
            }
        };

        let _ = ws.close(None).await;
        result
    }
}

#[async_trait]
impl SimplexCli for SimplexClient {
    async fn send_command(&self, cmd: &str) -> Result<Value> {
        let corr_id = self.next_corr_id.fetch_add(1, Ordering::Relaxed).to_string();
        tracing::debug!(corr_id, cmd, "sending SimpleX command");

        tokio::time::timeout(self.timeout, self.exchange(&corr_id, cmd))
            .await
            .map_err(|_| {
                Error::Simplex(format!(
                    "no reply to {cmd} within {}s",
                    self.timeout.as_secs()
                ))
            })?
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
