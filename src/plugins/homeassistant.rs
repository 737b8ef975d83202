//! Home Assistant control: lights, switches, sensors, climate, automations
//! and todo lists

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::bot::{CommandContext, Plugin};
use crate::homeassistant::{
    AliasResolver, Entity, HomeAssistantApi, HomeAssistantConfig, TodoItem, TodoStatus, reconcile,
    todo::parse_item_list,
};
use crate::{Error, Result};

/// Two-state entity kinds controlled with `on`/`off`
#[derive(Debug, Clone, Copy)]
struct Toggle {
    domain: &'static str,
    singular: &'static str,
    plural: &'static str,
    header: &'static str,
    on_icon: &'static str,
    off_icon: &'static str,
}

const LIGHTS: Toggle = Toggle {
    domain: "light",
    singular: "Light",
    plural: "lights",
    header: "💡 **Lights:**",
    on_icon: "🟡",
    off_icon: "⚫",
};

const SWITCHES: Toggle = Toggle {
    domain: "switch",
    singular: "Switch",
    plural: "switches",
    header: "🔌 **Switches:**",
    on_icon: "🟢",
    off_icon: "🔴",
};

const TODO_ACTIONS: [&str; 3] = ["add", "done", "remove"];

/// Outcome of looking an entity up by name
enum Lookup<T> {
    Found(T),
    Missing,
    Ambiguous(Vec<T>),
}

/// Home Assistant commands
pub struct HomeAssistantPlugin {
    api: Option<Arc<dyn HomeAssistantApi>>,
    resolver: AliasResolver,
    max_entities: usize,
    default_todo_list: Option<String>,
}

impl HomeAssistantPlugin {
    /// Create the plugin; without an API every command reports the missing
    /// connection
    #[must_use]
    pub fn new(api: Option<Arc<dyn HomeAssistantApi>>, config: &HomeAssistantConfig) -> Self {
        let resolver = if config.stop_words.is_empty() {
            AliasResolver::new()
        } else {
            AliasResolver::with_stop_words(&config.stop_words)
        };

        Self {
            api,
            resolver,
            max_entities: config.max_entities_per_response.max(1),
            default_todo_list: config.default_todo_list.clone(),
        }
    }

    async fn run(&self, api: &dyn HomeAssistantApi, sub: &str, rest: &[String]) -> Result<String> {
        match sub {
            "status" => self.status(api).await,
            "state" => self.state(api, rest).await,
            "lights" | "light" => self.toggle(api, LIGHTS, rest).await,
            "switches" | "switch" => self.toggle(api, SWITCHES, rest).await,
            "sensors" | "sensor" => self.sensors(api).await,
            "climate" => self.climate(api, rest).await,
            "automation" | "automations" => self.automation(api, rest).await,
            "entities" => self.entities(api).await,
            "todo" => self.todo(api, rest).await,
            "help" => Ok(help_text()),
            other => Ok(format!("❌ Unknown subcommand: {other}\n\n{}", help_text())),
        }
    }

    async fn of_domain(api: &dyn HomeAssistantApi, domain: &str) -> Result<Vec<Entity>> {
        Ok(api
            .states()
            .await?
            .into_iter()
            .filter(|e| e.domain() == domain)
            .collect())
    }

    fn lookup<'a>(&self, entities: &'a [Entity], name: &str) -> Lookup<&'a Entity> {
        let mut matches = self.resolver.resolve(entities, name);
        match matches.len() {
            0 => Lookup::Missing,
            1 => Lookup::Found(matches.remove(0)),
            _ => Lookup::Ambiguous(matches),
        }
    }

    fn ambiguous(&self, what: &str, name: &str, candidates: &[&Entity]) -> String {
        let mut text = format!("❓ Several {what} match '{name}':\n");
        for entity in candidates.iter().take(self.max_entities) {
            let _ = writeln!(text, "• {} (`{}`)", entity.display_name(), entity.id);
        }
        text.push_str("\nPlease be more specific.");
        text
    }

    fn overflow(&self, text: &mut String, total: usize, what: &str) {
        if total > self.max_entities {
            let _ = write!(text, "\n... and {} more {what}", total - self.max_entities);
        }
    }

    async fn status(&self, api: &dyn HomeAssistantApi) -> Result<String> {
        let states = api.states().await?;
        let domains = by_domain(&states);

        let mut text = format!(
            "🏠 **Home Assistant Status**\n\n**Total Entities:** {}\n\n**Entity Breakdown:**\n",
            states.len()
        );
        for (domain, entities) in domains.iter().take(10) {
            let _ = writeln!(text, "• {domain}: {}", entities.len());
        }
        if domains.len() > 10 {
            let _ = writeln!(text, "• ... and {} more domains", domains.len() - 10);
        }
        Ok(text)
    }

    async fn state(&self, api: &dyn HomeAssistantApi, rest: &[String]) -> Result<String> {
        let Some(entity_id) = rest.first() else {
            return Ok("❌ Usage: `!ha state <entity_id>`".to_string());
        };
        let entity = api.state(entity_id).await?;

        let mut text = format!(
            "🔎 **{}** (`{}`)\n**State:** {}",
            entity.display_name(),
            entity.id,
            entity.state
        );
        let shown = entity
            .attributes
            .keys()
            .filter(|key| key.as_str() != "friendly_name")
            .filter_map(|key| Some((key, entity.attribute_text(key)?)));
        for (key, value) in shown.take(self.max_entities) {
            let _ = write!(text, "\n• {key}: {value}");
        }
        Ok(text)
    }

    async fn toggle(
        &self,
        api: &dyn HomeAssistantApi,
        kind: Toggle,
        rest: &[String],
    ) -> Result<String> {
        let entities = Self::of_domain(api, kind.domain).await?;

        let Some((action, name_words)) = rest.split_last() else {
            if entities.is_empty() {
                return Ok(format!("{} No {} found", icon_of(kind.header), kind.plural));
            }
            let mut text = format!("{}\n\n", kind.header);
            for entity in entities.iter().take(self.max_entities) {
                let icon = if entity.is_on() { kind.on_icon } else { kind.off_icon };
                let _ = writeln!(text, "{icon} {} ({})", entity.display_name(), entity.state);
            }
            self.overflow(&mut text, entities.len(), kind.plural);
            let _ = write!(
                text,
                "\n\n**Usage:** `!ha {} <name> on/off`",
                kind.domain
            );
            return Ok(text);
        };

        if name_words.is_empty() {
            return Ok("❌ Please specify 'on' or 'off'".to_string());
        }
        let action = action.to_lowercase();
        let service = match action.as_str() {
            "on" => "turn_on",
            "off" => "turn_off",
            _ => return Ok("❌ Action must be 'on' or 'off'".to_string()),
        };

        let name = name_words.join(" ");
        let entity = match self.lookup(&entities, &name) {
            Lookup::Found(entity) => entity,
            Lookup::Missing => return Ok(format!("❌ {} '{name}' not found", kind.singular)),
            Lookup::Ambiguous(candidates) => {
                return Ok(self.ambiguous(kind.plural, &name, &candidates));
            }
        };

        api.call_service(kind.domain, service, json!({ "entity_id": entity.id }))
            .await?;

        let icon = if action == "on" { kind.on_icon } else { kind.off_icon };
        Ok(format!("{icon} {} turned {action}", entity.display_name()))
    }

    async fn sensors(&self, api: &dyn HomeAssistantApi) -> Result<String> {
        let sensors = Self::of_domain(api, "sensor").await?;
        if sensors.is_empty() {
            return Ok("📊 No sensors found".to_string());
        }

        let mut text = "📊 **Sensors:**\n\n".to_string();
        for sensor in sensors.iter().take(self.max_entities) {
            match sensor.attribute_text("unit_of_measurement") {
                Some(unit) if !unit.is_empty() => {
                    let _ = writeln!(text, "📈 {}: {} {unit}", sensor.display_name(), sensor.state);
                }
                _ => {
                    let _ = writeln!(text, "📈 {}: {}", sensor.display_name(), sensor.state);
                }
            }
        }
        self.overflow(&mut text, sensors.len(), "sensors");
        Ok(text)
    }

    async fn climate(&self, api: &dyn HomeAssistantApi, rest: &[String]) -> Result<String> {
        let devices = Self::of_domain(api, "climate").await?;

        let Some((temperature, name_words)) = rest.split_last() else {
            if devices.is_empty() {
                return Ok("🌡️ No climate devices found".to_string());
            }
            let mut text = "🌡️ **Climate Devices:**\n\n".to_string();
            for device in devices.iter().take(self.max_entities) {
                let current = device
                    .attribute_text("current_temperature")
                    .unwrap_or_else(|| "Unknown".to_string());
                let target = device
                    .attribute_text("temperature")
                    .unwrap_or_else(|| "Unknown".to_string());
                let _ = write!(
                    text,
                    "🌡️ {}:\n   Current: {current}°\n   Target: {target}°\n   Mode: {}\n\n",
                    device.display_name(),
                    device.state
                );
            }
            text.push_str("**Usage:** `!ha climate <name> <temperature>`");
            return Ok(text);
        };

        if name_words.is_empty() {
            return Ok("❌ Please specify temperature".to_string());
        }
        let Ok(value) = temperature.parse::<f64>() else {
            return Ok("❌ Invalid temperature value".to_string());
        };
        if !value.is_finite() {
            return Ok("❌ Invalid temperature value".to_string());
        }

        let name = name_words.join(" ");
        let device = match self.lookup(&devices, &name) {
            Lookup::Found(device) => device,
            Lookup::Missing => return Ok(format!("❌ Climate device '{name}' not found")),
            Lookup::Ambiguous(candidates) => {
                return Ok(self.ambiguous("climate devices", &name, &candidates));
            }
        };

        api.call_service(
            "climate",
            "set_temperature",
            json!({ "entity_id": device.id, "temperature": value }),
        )
        .await?;

        Ok(format!(
            "🌡️ {} temperature set to {value}°",
            device.display_name()
        ))
    }

    async fn automation(&self, api: &dyn HomeAssistantApi, rest: &[String]) -> Result<String> {
        let automations = Self::of_domain(api, "automation").await?;

        if rest.is_empty() {
            if automations.is_empty() {
                return Ok("🤖 No automations found".to_string());
            }
            let mut text = "🤖 **Automations:**\n\n".to_string();
            for automation in automations.iter().take(self.max_entities) {
                let icon = if automation.is_on() { "✅" } else { "❌" };
                let _ = writeln!(text, "{icon} {}", automation.display_name());
            }
            self.overflow(&mut text, automations.len(), "automations");
            text.push_str("\n\n**Usage:** `!ha automation <name>`");
            return Ok(text);
        }

        let name = rest.join(" ");
        let automation = match self.lookup(&automations, &name) {
            Lookup::Found(automation) => automation,
            Lookup::Missing => return Ok(format!("❌ Automation '{name}' not found")),
            Lookup::Ambiguous(candidates) => {
                return Ok(self.ambiguous("automations", &name, &candidates));
            }
        };

        api.call_service("automation", "trigger", json!({ "entity_id": automation.id }))
            .await?;
        Ok(format!("🤖 Triggered automation: {}", automation.display_name()))
    }

    async fn entities(&self, api: &dyn HomeAssistantApi) -> Result<String> {
        let states = api.states().await?;
        if states.is_empty() {
            return Ok("❌ No entities found".to_string());
        }
        let domains = by_domain(&states);

        let mut text = "🏠 **All Entities by Domain:**\n\n".to_string();
        for (domain, entities) in domains.iter().take(10) {
            let _ = writeln!(text, "**{}** ({}):", title_case(domain), entities.len());
            for entity in entities.iter().take(5) {
                let _ = writeln!(text, "  • {}: {}", entity.display_name(), entity.state);
            }
            if entities.len() > 5 {
                let _ = writeln!(text, "  ... and {} more", entities.len() - 5);
            }
            text.push('\n');
        }
        if domains.len() > 10 {
            let _ = writeln!(text, "... and {} more domains", domains.len() - 10);
        }
        let _ = write!(
            text,
            "\n**Total:** {} entities across {} domains",
            states.len(),
            domains.len()
        );
        Ok(text)
    }

    async fn todo(&self, api: &dyn HomeAssistantApi, rest: &[String]) -> Result<String> {
        let lists = Self::of_domain(api, "todo").await?;

        let action_at = rest
            .iter()
            .position(|w| TODO_ACTIONS.contains(&w.to_lowercase().as_str()));
        let (list_words, action) = match action_at {
            Some(i) => (&rest[..i], Some((rest[i].to_lowercase(), rest[i + 1..].join(" ")))),
            None => (rest, None),
        };

        let list_name = if list_words.is_empty() {
            match (&self.default_todo_list, &action) {
                (Some(default), _) => default.clone(),
                (None, None) => return Ok(list_todo_lists(&lists)),
                (None, Some(_)) => {
                    return Ok("❌ Please name a todo list: `!ha todo <list> add <items>`".to_string());
                }
            }
        } else {
            list_words.join(" ")
        };

        let list = match self.lookup(&lists, &list_name) {
            Lookup::Found(list) => list,
            Lookup::Missing => return Ok(format!("❌ Todo list '{list_name}' not found")),
            Lookup::Ambiguous(candidates) => {
                return Ok(self.ambiguous("todo lists", &list_name, &candidates));
            }
        };
        let items = api.todo_items(&list.id).await?;

        let Some((action, argument)) = action else {
            return Ok(render_todo(list, &items));
        };
        if argument.trim().is_empty() {
            return Ok(format!("❌ Usage: `!ha todo {list_name} {action} <items>`"));
        }

        match action.as_str() {
            "add" => self.todo_add(api, list, &items, &argument).await,
            "done" => self.todo_update(api, list, &items, &argument, TodoUpdate::Complete).await,
            _ => self.todo_update(api, list, &items, &argument, TodoUpdate::Remove).await,
        }
    }

    async fn todo_add(
        &self,
        api: &dyn HomeAssistantApi,
        list: &Entity,
        items: &[TodoItem],
        argument: &str,
    ) -> Result<String> {
        let plan = reconcile(items, &parse_item_list(argument));
        let name = list.display_name();

        if plan.is_noop() {
            return Ok(format!("ℹ️ Everything is already on **{name}**"));
        }

        for summary in &plan.to_add {
            api.call_service("todo", "add_item", json!({ "entity_id": list.id, "item": summary }))
                .await?;
        }
        for item in &plan.to_reopen {
            api.call_service(
                "todo",
                "update_item",
                json!({ "entity_id": list.id, "item": item.uid, "status": "needs_action" }),
            )
            .await?;
        }

        tracing::info!(
            list = %list.id,
            added = plan.to_add.len(),
            reopened = plan.to_reopen.len(),
            "todo list updated"
        );

        let mut text = format!("📝 **{name}**\n");
        if !plan.to_add.is_empty() {
            let _ = write!(text, "\n✅ Added: {}", plan.to_add.join(", "));
        }
        if !plan.to_reopen.is_empty() {
            let reopened: Vec<&str> = plan.to_reopen.iter().map(|i| i.summary.as_str()).collect();
            let _ = write!(text, "\n🔄 Reopened: {}", reopened.join(", "));
        }
        if !plan.already_open.is_empty() {
            let _ = write!(text, "\nℹ️ Already on the list: {}", plan.already_open.join(", "));
        }
        Ok(text)
    }

    async fn todo_update(
        &self,
        api: &dyn HomeAssistantApi,
        list: &Entity,
        items: &[TodoItem],
        argument: &str,
        update: TodoUpdate,
    ) -> Result<String> {
        let candidates: Vec<TodoItem> = match update {
            TodoUpdate::Complete => items
                .iter()
                .filter(|i| i.status == TodoStatus::NeedsAction)
                .cloned()
                .collect(),
            TodoUpdate::Remove => items.to_vec(),
        };

        let mut matches = self.resolver.resolve(&candidates, argument);
        let item = match matches.len() {
            0 => {
                return Ok(format!(
                    "❌ '{}' not found on {}",
                    argument.trim(),
                    list.display_name()
                ));
            }
            1 => matches.remove(0),
            _ => {
                let names: Vec<&str> = matches.iter().map(|i| i.summary.as_str()).collect();
                return Ok(format!(
                    "❓ Several items match '{}': {}\n\nPlease be more specific.",
                    argument.trim(),
                    names.join(", ")
                ));
            }
        };

        match update {
            TodoUpdate::Complete => {
                api.call_service(
                    "todo",
                    "update_item",
                    json!({ "entity_id": list.id, "item": item.uid, "status": "completed" }),
                )
                .await?;
                Ok(format!("✅ Checked off '{}' on {}", item.summary, list.display_name()))
            }
            TodoUpdate::Remove => {
                api.call_service(
                    "todo",
                    "remove_item",
                    json!({ "entity_id": list.id, "item": item.uid }),
                )
                .await?;
                Ok(format!("🗑️ Removed '{}' from {}", item.summary, list.display_name()))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TodoUpdate {
    Complete,
    Remove,
}

/// Entities grouped by domain, largest group first
fn by_domain(states: &[Entity]) -> Vec<(&str, Vec<&Entity>)> {
    let mut grouped: BTreeMap<&str, Vec<&Entity>> = BTreeMap::new();
    for entity in states {
        grouped.entry(entity.domain()).or_default().push(entity);
    }
    let mut domains: Vec<_> = grouped.into_iter().collect();
    domains.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    domains
}

fn list_todo_lists(lists: &[Entity]) -> String {
    if lists.is_empty() {
        return "📝 No todo lists found".to_string();
    }
    let mut text = "📝 **Todo Lists:**\n\n".to_string();
    for list in lists {
        let _ = writeln!(text, "• {} ({} open)", list.display_name(), list.state);
    }
    text.push_str("\n**Usage:** `!ha todo <list> [add|done|remove <items>]`");
    text
}

fn render_todo(list: &Entity, items: &[TodoItem]) -> String {
    if items.is_empty() {
        return format!("📝 **{}** is empty", list.display_name());
    }
    let mut text = format!("📝 **{}**\n\n", list.display_name());
    for item in items {
        let icon = match item.status {
            TodoStatus::NeedsAction => "⬜",
            TodoStatus::Completed => "✅",
        };
        let _ = writeln!(text, "{icon} {}", item.summary);
    }
    text
}

fn icon_of(header: &str) -> &str {
    header.split_whitespace().next().unwrap_or_default()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn help_text() -> String {
    "🏠 **Home Assistant Commands:**\n\n\
     **Status & Info:**\n\
     • `!ha status` - Get HA status and entity counts\n\
     • `!ha entities` - List all entities by domain\n\
     • `!ha state <entity_id>` - Show one entity and its attributes\n\n\
     **Lights:**\n\
     • `!ha lights` - List all lights\n\
     • `!ha light <name> on/off` - Control specific light\n\n\
     **Switches:**\n\
     • `!ha switches` - List all switches\n\
     • `!ha switch <name> on/off` - Control specific switch\n\n\
     **Sensors:**\n\
     • `!ha sensors` - Show sensor readings\n\n\
     **Climate:**\n\
     • `!ha climate` - List climate devices\n\
     • `!ha climate <name> <temp>` - Set temperature\n\n\
     **Automations:**\n\
     • `!ha automation` - List automations\n\
     • `!ha automation <name>` - Trigger automation\n\n\
     **Todo Lists:**\n\
     • `!ha todo` - List todo lists\n\
     • `!ha todo <list>` - Show items\n\
     • `!ha todo <list> add <a, b, c>` - Add items without duplicates\n\
     • `!ha todo <list> done <item>` - Check an item off\n\
     • `!ha todo <list> remove <item>` - Remove an item\n\n\
     **Direct Commands:**\n\
     • `!lights`, `!switches`, `!sensors` - Quick access\n\
     • `!climate`, `!automation`, `!entities`, `!todo` - Quick access"
        .to_string()
}

#[async_trait]
impl Plugin for HomeAssistantPlugin {
    fn name(&self) -> &'static str {
        "homeassistant"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn description(&self) -> &'static str {
        "Home Assistant integration for controlling smart home devices"
    }

    fn commands(&self) -> &'static [&'static str] {
        &[
            "ha", "homeassistant", "lights", "switches", "sensors", "climate", "automation",
            "entities", "todo",
        ]
    }

    async fn initialize(&self) -> Result<()> {
        let Some(api) = &self.api else {
            tracing::warn!("Home Assistant token not configured, plugin inactive");
            return Ok(());
        };

        match api.states().await {
            Ok(states) => tracing::info!(entities = states.len(), "connected to Home Assistant"),
            Err(e) => tracing::warn!(error = %e, "Home Assistant not reachable yet"),
        }
        Ok(())
    }

    async fn handle(&self, ctx: &CommandContext) -> Result<Option<String>> {
        let Some(api) = &self.api else {
            return Ok(Some("❌ Home Assistant not connected".to_string()));
        };

        let (sub, rest) = match ctx.command.as_str() {
            "ha" | "homeassistant" => match ctx.args.split_first() {
                Some((sub, rest)) => (sub.to_lowercase(), rest),
                None => return Ok(Some(help_text())),
            },
            direct => (direct.to_string(), ctx.args.as_slice()),
        };

        let reply = match self.run(api.as_ref(), &sub, rest).await {
            Ok(reply) => reply,
            Err(Error::HomeAssistant(message)) => format!("❌ Home Assistant error: {message}"),
            Err(e) => {
                tracing::error!(subcommand = %sub, error = %e, "Home Assistant command failed");
                format!("❌ Error: {e}")
            }
        };
        Ok(Some(reply))
    }
}
