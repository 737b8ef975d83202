//! Home Assistant integration
//!
//! REST client, entity model, alias resolution and todo-list reconciliation.

pub mod alias;
mod client;
mod config;
pub mod todo;

pub use alias::{Aliased, AliasResolver};
pub use client::{
    HomeAssistantApi, HomeAssistantClient, parse_state, parse_states, parse_todo_items,
};
pub use config::HomeAssistantConfig;
pub use todo::{TodoItem, TodoPlan, TodoStatus, reconcile};

use serde_json::{Map, Value};

/// A Home Assistant entity as returned by `/api/states`
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Entity id, e.g. `light.kitchen_lamp`
    pub id: String,
    /// `friendly_name` attribute, if set
    pub label: Option<String>,
    /// Current state string
    pub state: String,
    /// Remaining attributes
    pub attributes: Map<String, Value>,
}

impl Entity {
    /// Domain part of the id (`light` for `light.kitchen_lamp`)
    #[must_use]
    pub fn domain(&self) -> &str {
        self.id.split('.').next().unwrap_or_default()
    }

    /// Label if present, id otherwise
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    /// Attribute rendered as plain text (strings without quotes)
    #[must_use]
    pub fn attribute_text(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Whether the entity reports `on`
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state == "on"
    }
}

impl Aliased for Entity {
    fn alias_id(&self) -> &str {
        &self.id
    }

    fn alias_label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}
