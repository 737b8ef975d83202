//! Bot administrators and their command permissions

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// Permission entry granting every command
pub const ALL_COMMANDS: &str = "*";

/// What a user may run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permissions {
    pub is_admin: bool,
    /// Admin commands granted, `*` for all
    pub admin_commands: Vec<String>,
    /// Commands open to everybody
    pub public_commands: Vec<String>,
}

/// Admin names mapped to the commands they may run
#[derive(Debug, Default)]
pub struct AdminList {
    admins: RwLock<BTreeMap<String, Vec<String>>>,
    public_commands: Vec<String>,
}

impl AdminList {
    /// Seed the list from configuration
    #[must_use]
    pub fn new(admins: BTreeMap<String, Vec<String>>, public_commands: Vec<String>) -> Self {
        Self {
            admins: RwLock::new(admins),
            public_commands,
        }
    }

    #[must_use]
    pub fn is_admin(&self, user: &str) -> bool {
        self.admins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(user)
    }

    /// Whether `user` may run the admin command `command`
    #[must_use]
    pub fn can_run(&self, user: &str, command: &str) -> bool {
        self.admins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user)
            .is_some_and(|cmds| cmds.iter().any(|c| c == ALL_COMMANDS || c == command))
    }

    /// Snapshot of all admins
    #[must_use]
    pub fn list(&self) -> BTreeMap<String, Vec<String>> {
        self.admins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.admins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grant `user` every command, returning false for a blank name
    pub fn add(&self, user: &str) -> bool {
        let user = user.trim();
        if user.is_empty() {
            return false;
        }
        self.admins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.to_string(), vec![ALL_COMMANDS.to_string()]);
        tracing::info!(user, "admin added");
        true
    }

    /// Revoke `user`, returning false if they were not an admin
    pub fn remove(&self, user: &str) -> bool {
        let removed = self
            .admins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user)
            .is_some();
        if removed {
            tracing::info!(user, "admin removed");
        }
        removed
    }

    #[must_use]
    pub fn permissions(&self, user: &str) -> Permissions {
        let admin_commands = self
            .admins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user)
            .cloned();

        Permissions {
            is_admin: admin_commands.is_some(),
            admin_commands: admin_commands.unwrap_or_default(),
            public_commands: self.public_commands.clone(),
        }
    }
}

/// Render a permission list, `all commands` for the wildcard
#[must_use]
pub fn describe_commands(commands: &[String]) -> String {
    if commands.iter().any(|c| c == ALL_COMMANDS) {
        "all commands".to_string()
    } else {
        commands.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admins() -> AdminList {
        AdminList::new(
            BTreeMap::from([
                ("root".to_string(), vec!["*".to_string()]),
                ("ops".to_string(), vec!["stats".to_string(), "debug".to_string()]),
            ]),
            vec!["help".to_string(), "ping".to_string()],
        )
    }

    #[test]
    fn test_permissions() {
        let list = admins();

        assert!(list.is_admin("root"));
        assert!(list.can_run("root", "anything"));
        assert!(list.can_run("ops", "stats"));
        assert!(!list.can_run("ops", "admin"));
        assert!(!list.can_run("guest", "help"));

        let perms = list.permissions("guest");
        assert!(!perms.is_admin);
        assert_eq!(perms.public_commands, vec!["help", "ping"]);
        assert_eq!(describe_commands(&list.permissions("ops").admin_commands), "stats, debug");
        assert_eq!(describe_commands(&list.permissions("root").admin_commands), "all commands");
    }

    #[test]
    fn test_add_remove() {
        let list = admins();

        assert!(list.add("alice"));
        assert!(list.can_run("alice", "stats"));
        assert!(!list.add("  "));
        assert_eq!(list.len(), 3);

        assert!(list.remove("alice"));
        assert!(!list.remove("alice"));
        assert!(!list.is_admin("alice"));
    }
}
