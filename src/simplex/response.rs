//! Typed view of `SimpleX` chat CLI responses

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

static INVITATION_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https://simplex\.chat/invitation[^\s"]*"#).expect("valid regex")
});

/// Response payload, discriminated by its `type` field
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChatResponse {
    /// Reply to `/contacts`
    ContactsList {
        #[serde(default)]
        contacts: Vec<Contact>,
    },
    /// Reply to `/groups`
    GroupsList {
        #[serde(default)]
        groups: Vec<Group>,
    },
    /// Reply to `/contact <name>`
    ContactInfo { contact: Contact },
    /// Reply to `/group <name>`
    GroupInfo {
        #[serde(alias = "groupInfo")]
        group: Group,
    },
    /// A freshly created connection invitation
    Invitation {
        #[serde(default, rename = "connReqInvitation")]
        link: Option<String>,
    },
    /// The CLI rejected the command
    ChatCmdError {
        #[serde(default, rename = "chatError")]
        error: Value,
    },
    /// Anything the bot does not interpret
    #[serde(other)]
    Other,
}

/// A contact of the bot user
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default)]
    pub local_display_name: String,
    #[serde(default)]
    pub contact_status: Option<String>,
    #[serde(default)]
    pub active_conn: Option<Connection>,
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Contact {
    /// Connection status, `disconnected` without an active connection
    #[must_use]
    pub fn connection_status(&self) -> &str {
        match &self.active_conn {
            Some(conn) => conn.conn_status.as_deref().unwrap_or("unknown"),
            None => "disconnected",
        }
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Contact: {}, Connection: {})",
            self.local_display_name,
            self.contact_status.as_deref().unwrap_or("unknown"),
            self.connection_status()
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(default)]
    pub conn_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub display_name: String,
}

/// A group the bot user belongs to
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default, alias = "localDisplayName")]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub membership: Option<Membership>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Group {
    /// The bot user's role in the group
    #[must_use]
    pub fn role(&self) -> &str {
        self.membership
            .as_ref()
            .and_then(|m| m.member_role.as_deref())
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    #[serde(default)]
    pub member_role: Option<String>,
}

/// Strip the `Right`/`Left` envelope from a `resp` value
///
/// # Errors
///
/// Returns [`Error::Simplex`] for a `Left` (error) envelope
pub fn unwrap_envelope(resp: &Value) -> Result<&Value> {
    if let Some(right) = resp.get("Right") {
        return Ok(right);
    }
    if let Some(left) = resp.get("Left") {
        return Err(Error::Simplex(format!("CLI error response: {left}")));
    }
    Ok(resp)
}

/// Interpret a `resp` value
///
/// # Errors
///
/// Returns [`Error::Simplex`] for error envelopes and [`Error::Parse`] when a
/// known response type has an unexpected shape
pub fn parse_response(resp: &Value) -> Result<ChatResponse> {
    let inner = unwrap_envelope(resp)?;
    ChatResponse::deserialize(inner)
        .map_err(|e| Error::parse("simplex", format!("unexpected response: {e}")))
}

/// First invitation link anywhere in a response
#[must_use]
pub fn find_invitation_link(resp: &Value) -> Option<String> {
    match resp {
        Value::String(s) => INVITATION_LINK.find(s).map(|m| m.as_str().to_string()),
        Value::Array(items) => items.iter().find_map(find_invitation_link),
        Value::Object(map) => map.values().find_map(find_invitation_link),
        _ => None,
    }
}
