//! Shared test utilities and mock capabilities
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use beacon_plugins::database::{DatabaseApi, DatabaseStats, PinGrant, RoomUser, StatValue};
use beacon_plugins::homeassistant::{Entity, HomeAssistantApi, TodoItem, TodoStatus};
use beacon_plugins::llm::ModelCaller;
use beacon_plugins::simplex::SimplexCli;
use beacon_plugins::youtube::{TranscriptSource, Video};
use beacon_plugins::{Error, Result};
use serde_json::{Map, Value, json};

/// One recorded model call
#[derive(Debug, Clone)]
pub struct ModelCall {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
}

/// Model caller with scripted failures that records every call
#[derive(Default)]
pub struct MockModelCaller {
    calls: Mutex<Vec<ModelCall>>,
    failing_models: Vec<String>,
    failing_prompts: Vec<String>,
    reply: Option<String>,
}

impl MockModelCaller {
    /// Answer every call with `reply`
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Self::default()
        }
    }

    /// Fail every call to `model`
    pub fn failing_model(mut self, model: &str) -> Self {
        self.failing_models.push(model.to_string());
        self
    }

    /// Fail every call whose prompt contains `needle`
    pub fn failing_prompt(mut self, needle: &str) -> Self {
        self.failing_prompts.push(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls made to `model`
    pub fn calls_to(&self, model: &str) -> Vec<ModelCall> {
        self.calls().into_iter().filter(|c| c.model == model).collect()
    }
}

#[async_trait]
impl ModelCaller for MockModelCaller {
    async fn call(
        &self,
        model: &str,
        prompt: &str,
        max_tokens: u32,
        _temperature: f32,
    ) -> Result<String> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(ModelCall {
                model: model.to_string(),
                prompt: prompt.to_string(),
                max_tokens,
            });
            calls.len()
        };

        if self.failing_models.iter().any(|m| m == model)
            || self.failing_prompts.iter().any(|p| prompt.contains(p.as_str()))
        {
            return Err(Error::ModelCall(format!("{model} unavailable")));
        }

        Ok(self
            .reply
            .clone()
            .unwrap_or_else(|| format!("{model} output #{index}")))
    }
}

/// Build an entity with a friendly name
pub fn entity(id: &str, label: &str, state: &str) -> Entity {
    Entity {
        id: id.to_string(),
        label: Some(label.to_string()),
        state: state.to_string(),
        attributes: Map::new(),
    }
}

/// Build an entity with extra attributes
pub fn entity_with(id: &str, label: &str, state: &str, attributes: Value) -> Entity {
    Entity {
        attributes: attributes.as_object().cloned().unwrap_or_default(),
        ..entity(id, label, state)
    }
}

pub fn todo_item(uid: &str, summary: &str, status: TodoStatus) -> TodoItem {
    TodoItem {
        uid: uid.to_string(),
        summary: summary.to_string(),
        status,
    }
}

/// One recorded service call
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub data: Value,
}

/// In-memory Home Assistant
#[derive(Default)]
pub struct MockHomeAssistant {
    pub entities: Vec<Entity>,
    pub todo: HashMap<String, Vec<TodoItem>>,
    calls: Mutex<Vec<ServiceCall>>,
}

impl MockHomeAssistant {
    pub fn with_entities(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            ..Self::default()
        }
    }

    pub fn with_todo(mut self, list_id: &str, items: Vec<TodoItem>) -> Self {
        self.todo.insert(list_id.to_string(), items);
        self
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HomeAssistantApi for MockHomeAssistant {
    async fn states(&self) -> Result<Vec<Entity>> {
        Ok(self.entities.clone())
    }

    async fn state(&self, entity_id: &str) -> Result<Entity> {
        self.entities
            .iter()
            .find(|e| e.id == entity_id)
            .cloned()
            .ok_or_else(|| Error::HomeAssistant(format!("HTTP 404 for {entity_id}")))
    }

    async fn call_service(&self, domain: &str, service: &str, data: Value) -> Result<()> {
        self.calls.lock().unwrap().push(ServiceCall {
            domain: domain.to_string(),
            service: service.to_string(),
            data,
        });
        Ok(())
    }

    async fn todo_items(&self, list_id: &str) -> Result<Vec<TodoItem>> {
        self.todo
            .get(list_id)
            .cloned()
            .ok_or_else(|| Error::HomeAssistant(format!("unknown list {list_id}")))
    }
}

/// Transcript source serving canned videos by URL
#[derive(Default)]
pub struct MockTranscriptSource {
    pub videos: HashMap<String, Video>,
    fetches: Mutex<Vec<String>>,
}

impl MockTranscriptSource {
    pub fn with_video(mut self, url: &str, title: &str, transcript: &str) -> Self {
        self.videos.insert(
            url.to_string(),
            Video {
                title: title.to_string(),
                transcript: transcript.to_string(),
            },
        );
        self
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptSource for MockTranscriptSource {
    async fn fetch(&self, url: &str) -> Result<Video> {
        self.fetches.lock().unwrap().push(url.to_string());
        self.videos
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Subtitle("no subtitles found for this video".to_string()))
    }
}

/// Database service with a fixed PIN and canned stats
pub struct MockDatabase {
    pub healthy: bool,
    pub pin: String,
    requests: Mutex<Vec<(String, String, String)>>,
    verified: Mutex<Vec<(String, String)>>,
}

impl MockDatabase {
    pub fn new(healthy: bool) -> Self {
        Self {
            healthy,
            pin: "4321".to_string(),
            requests: Mutex::new(Vec::new()),
            verified: Mutex::new(Vec::new()),
        }
    }

    /// `(room, user, platform)` of every PIN request
    pub fn requests(&self) -> Vec<(String, String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatabaseApi for MockDatabase {
    async fn health(&self) -> Result<bool> {
        Ok(self.healthy)
    }

    async fn stats(&self) -> Result<DatabaseStats> {
        Ok(DatabaseStats {
            total_messages: Some(StatValue::Count(1_204)),
            total_media_files: Some(StatValue::Count(37)),
            database_size: Some(StatValue::Text("12.4 MB".to_string())),
        })
    }

    async fn request_pin(&self, who: &RoomUser<'_>) -> Result<PinGrant> {
        self.requests.lock().unwrap().push((
            who.room_id.to_string(),
            who.user_name.to_string(),
            who.platform.to_string(),
        ));
        Ok(PinGrant {
            pin: self.pin.clone(),
            validity: None,
        })
    }

    async fn verify_pin(&self, who: &RoomUser<'_>, pin: &str) -> Result<bool> {
        let valid = pin == self.pin;
        if valid {
            self.verified
                .lock()
                .unwrap()
                .push((who.room_id.to_string(), who.user_name.to_string()));
        }
        Ok(valid)
    }

    async fn check_auth(&self, who: &RoomUser<'_>) -> Result<bool> {
        Ok(self
            .verified
            .lock()
            .unwrap()
            .iter()
            .any(|(room, user)| room == who.room_id && user == who.user_name))
    }
}

/// `SimpleX` CLI answering from a command table
#[derive(Default)]
pub struct MockSimplex {
    pub responses: BTreeMap<String, Value>,
    sent: Mutex<Vec<String>>,
}

impl MockSimplex {
    pub fn respond(mut self, cmd: &str, resp: Value) -> Self {
        self.responses.insert(cmd.to_string(), resp);
        self
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimplexCli for MockSimplex {
    async fn send_command(&self, cmd: &str) -> Result<Value> {
        self.sent.lock().unwrap().push(cmd.to_string());
        self.responses
            .get(cmd)
            .cloned()
            .ok_or_else(|| Error::Simplex(format!("no response to {cmd}")))
    }

    fn endpoint(&self) -> &str {
        "ws://mock:5225"
    }
}

/// A `Right` envelope around `resp`
pub fn right(resp: Value) -> Value {
    json!({ "Right": resp })
}
