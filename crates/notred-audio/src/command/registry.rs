//! Command registry: four keyed, insertion-ordered command tables
//!
//! Each table owns its own lock. A change callback fires after every
//! structural mutation (add/remove, or a load) so editors can resync; nothing
//! in the engine depends on it being set.

use std::sync::RwLock;

use super::action::TriggerAction;
use super::ordered::OrderedMap;
use super::{CommandId, CommandType};
use crate::registry::{read_lock, write_lock};

/// Ordered list of actions executed by `PostTrigger`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerCommand {
    pub debug_name: String,
    pub actions: Vec<TriggerAction>,
}

impl TriggerCommand {
    pub fn new(debug_name: impl Into<String>) -> Self {
        Self {
            debug_name: debug_name.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: TriggerAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn id(&self) -> CommandId {
        CommandId::from_name(&self.debug_name)
    }
}

/// Switch, State and Parameter commands: a name and nothing else yet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedCommand {
    pub debug_name: String,
}

type ChangeCallback = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct CommandRegistry {
    triggers: RwLock<OrderedMap<CommandId, TriggerCommand>>,
    switches: RwLock<OrderedMap<CommandId, NamedCommand>>,
    states: RwLock<OrderedMap<CommandId, NamedCommand>>,
    parameters: RwLock<OrderedMap<CommandId, NamedCommand>>,
    on_change: RwLock<Option<ChangeCallback>>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("triggers", &self.count(CommandType::Trigger))
            .field("switches", &self.count(CommandType::Switch))
            .field("states", &self.count(CommandType::State))
            .field("parameters", &self.count(CommandType::Parameter))
            .finish()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn named_table(&self, kind: CommandType) -> Option<&RwLock<OrderedMap<CommandId, NamedCommand>>> {
        match kind {
            CommandType::Trigger => None,
            CommandType::Switch => Some(&self.switches),
            CommandType::State => Some(&self.states),
            CommandType::Parameter => Some(&self.parameters),
        }
    }

    /// Register the change-notification hook
    pub fn set_on_change(&self, callback: impl Fn() + Send + Sync + 'static) {
        *write_lock(&self.on_change) = Some(Box::new(callback));
    }

    pub fn clear_on_change(&self) {
        *write_lock(&self.on_change) = None;
    }

    pub(crate) fn notify_changed(&self) {
        if let Some(callback) = read_lock(&self.on_change).as_ref() {
            callback();
        }
    }

    /// Create an empty command of `kind` named `name`
    ///
    /// Returns false if that kind already has a command with this ID.
    pub fn add_new_command(&self, kind: CommandType, name: &str) -> bool {
        let id = CommandId::from_name(name);
        let added = match self.named_table(kind) {
            None => {
                let mut triggers = write_lock(&self.triggers);
                if triggers.contains_key(&id) {
                    false
                } else {
                    triggers.insert(id, TriggerCommand::new(name));
                    true
                }
            }
            Some(table) => {
                let mut table = write_lock(table);
                if table.contains_key(&id) {
                    false
                } else {
                    table.insert(
                        id,
                        NamedCommand {
                            debug_name: name.to_string(),
                        },
                    );
                    true
                }
            }
        };
        if added {
            self.notify_changed();
        }
        added
    }

    /// Add or replace a trigger, keyed by the hash of its debug name
    pub fn insert_trigger(&self, trigger: TriggerCommand) -> CommandId {
        let id = self.insert_trigger_silent(trigger);
        self.notify_changed();
        id
    }

    /// Insert without firing the change callback (bulk loads notify once)
    pub(crate) fn insert_trigger_silent(&self, trigger: TriggerCommand) -> CommandId {
        let id = trigger.id();
        write_lock(&self.triggers).insert(id, trigger);
        id
    }

    /// Replace the action list of an existing trigger
    pub fn set_trigger_actions(&self, id: CommandId, actions: Vec<TriggerAction>) -> bool {
        let updated = match write_lock(&self.triggers).get_mut(&id) {
            Some(trigger) => {
                trigger.actions = actions;
                true
            }
            None => false,
        };
        if updated {
            self.notify_changed();
        }
        updated
    }

    pub fn does_command_exist(&self, kind: CommandType, id: CommandId) -> bool {
        match self.named_table(kind) {
            None => read_lock(&self.triggers).contains_key(&id),
            Some(table) => read_lock(table).contains_key(&id),
        }
    }

    pub fn remove_command(&self, kind: CommandType, id: CommandId) -> bool {
        let removed = match self.named_table(kind) {
            None => write_lock(&self.triggers).remove(&id).is_some(),
            Some(table) => write_lock(table).remove(&id).is_some(),
        };
        if removed {
            self.notify_changed();
        }
        removed
    }

    pub fn get_trigger(&self, id: CommandId) -> Option<TriggerCommand> {
        read_lock(&self.triggers).get(&id).cloned()
    }

    /// Debug name of a command of any kind
    pub fn command_name(&self, kind: CommandType, id: CommandId) -> Option<String> {
        match self.named_table(kind) {
            None => read_lock(&self.triggers).get(&id).map(|t| t.debug_name.clone()),
            Some(table) => read_lock(table).get(&id).map(|c| c.debug_name.clone()),
        }
    }

    /// (ID, name) of every command of `kind`, in insertion order
    pub fn commands(&self, kind: CommandType) -> Vec<(CommandId, String)> {
        match self.named_table(kind) {
            None => read_lock(&self.triggers)
                .iter()
                .map(|(id, t)| (*id, t.debug_name.clone()))
                .collect(),
            Some(table) => read_lock(table)
                .iter()
                .map(|(id, c)| (*id, c.debug_name.clone()))
                .collect(),
        }
    }

    /// Every trigger in insertion order
    pub fn triggers(&self) -> Vec<TriggerCommand> {
        read_lock(&self.triggers).iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn count(&self, kind: CommandType) -> usize {
        match self.named_table(kind) {
            None => read_lock(&self.triggers).len(),
            Some(table) => read_lock(table).len(),
        }
    }

    /// Drop every command of every kind
    pub fn clear(&self) {
        write_lock(&self.triggers).clear();
        for kind in [CommandType::Switch, CommandType::State, CommandType::Parameter] {
            if let Some(table) = self.named_table(kind) {
                write_lock(table).clear();
            }
        }
        self.notify_changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ActionType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_add_new_command_rejects_duplicates() {
        let registry = CommandRegistry::new();
        assert!(registry.add_new_command(CommandType::Trigger, "Jump"));
        assert!(!registry.add_new_command(CommandType::Trigger, "Jump"));
        // Kinds are independent
        assert!(registry.add_new_command(CommandType::Switch, "Jump"));

        let id = CommandId::from_name("Jump");
        assert!(registry.does_command_exist(CommandType::Trigger, id));
        assert!(registry.does_command_exist(CommandType::Switch, id));
        assert!(!registry.does_command_exist(CommandType::State, id));
    }

    #[test]
    fn test_remove_command() {
        let registry = CommandRegistry::new();
        registry.add_new_command(CommandType::Parameter, "Speed");
        let id = CommandId::from_name("Speed");
        assert!(registry.remove_command(CommandType::Parameter, id));
        assert!(!registry.remove_command(CommandType::Parameter, id));
        assert_eq!(registry.count(CommandType::Parameter), 0);
    }

    #[test]
    fn test_trigger_actions() {
        let registry = CommandRegistry::new();
        let id = registry.insert_trigger(TriggerCommand::new("Door").with_action(TriggerAction::play(5)));
        let trigger = registry.get_trigger(id).unwrap();
        assert_eq!(trigger.actions.len(), 1);
        assert_eq!(trigger.actions[0].action_type, ActionType::Play);

        assert!(registry.set_trigger_actions(id, Vec::new()));
        assert!(registry.get_trigger(id).unwrap().actions.is_empty());
        assert!(!registry.set_trigger_actions(CommandId::from_name("Nope"), Vec::new()));
    }

    #[test]
    fn test_change_callback_fires_on_structural_changes() {
        let registry = CommandRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        registry.set_on_change(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.add_new_command(CommandType::Trigger, "A");
        registry.add_new_command(CommandType::Trigger, "A");
        registry.remove_command(CommandType::Trigger, CommandId::from_name("A"));
        assert_eq!(fired.load(Ordering::SeqCst), 2);

        registry.clear_on_change();
        registry.add_new_command(CommandType::Trigger, "B");
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_commands_listed_in_insertion_order() {
        let registry = CommandRegistry::new();
        for name in ["Zeta", "Alpha", "Mid"] {
            registry.add_new_command(CommandType::State, name);
        }
        let names: Vec<_> = registry
            .commands(CommandType::State)
            .into_iter()
            .map(|(_, name)| name)
            .collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }
}
