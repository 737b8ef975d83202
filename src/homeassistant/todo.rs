//! Todo-list reconciliation
//!
//! Adding items to a Home Assistant todo list should not create duplicates
//! of what is already there. [`reconcile`] compares the requested items with
//! the list's current contents and returns what actually needs doing.

use serde::{Deserialize, Serialize};

use super::alias::Aliased;

/// Completion state of a todo item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    /// Still open
    NeedsAction,
    /// Checked off
    Completed,
}

/// One entry of a todo list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TodoItem {
    /// Item identifier assigned by Home Assistant
    pub uid: String,
    /// Item text
    pub summary: String,
    /// Completion state
    pub status: TodoStatus,
}

/// Items are matched on their summary only; uids are opaque
impl Aliased for TodoItem {
    fn alias_id(&self) -> &str {
        ""
    }

    fn alias_label(&self) -> Option<&str> {
        Some(&self.summary)
    }
}

/// Work needed to make a list contain the requested items
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TodoPlan {
    /// New items, in request order
    pub to_add: Vec<String>,
    /// Completed items that were requested again
    pub to_reopen: Vec<TodoItem>,
    /// Requested items that are already open
    pub already_open: Vec<String>,
}

impl TodoPlan {
    /// Whether the list already satisfies the request
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty() && self.to_reopen.is_empty()
    }
}

/// Compare summaries ignoring case and spacing
#[must_use]
pub fn normalize(summary: &str) -> String {
    summary
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Plan how to add `requested` to a list currently holding `existing`
///
/// Requested duplicates and blanks are dropped. An item that exists open is
/// left alone; one that exists completed is reopened rather than added
/// twice.
#[must_use]
pub fn reconcile(existing: &[TodoItem], requested: &[String]) -> TodoPlan {
    let mut plan = TodoPlan::default();
    let mut seen: Vec<String> = Vec::new();

    for item in requested {
        let key = normalize(item);
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key.clone());

        let matches: Vec<&TodoItem> = existing
            .iter()
            .filter(|e| normalize(&e.summary) == key)
            .collect();

        if matches.iter().any(|e| e.status == TodoStatus::NeedsAction) {
            plan.already_open.push(item.trim().to_string());
        } else if let Some(done) = matches.first() {
            plan.to_reopen.push((*done).clone());
        } else {
            plan.to_add.push(item.trim().to_string());
        }
    }

    plan
}

/// Split `milk, eggs,  bread` into trimmed item texts
#[must_use]
pub fn parse_item_list(input: &str) -> Vec<String> {
    input
        .split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
