//! YAML persistence for trigger commands
//!
//! IDs are not stored: they are re-derived from each `DebugName`, so a
//! document reloads to identical CommandIDs. Loading merges into the
//! registry entry by entry; a bad entry aborts the rest of the document but
//! keeps what was already read.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::action::TriggerAction;
use super::error::{CommandError, CommandResult};
use super::registry::{CommandRegistry, TriggerCommand};

#[derive(Debug, Serialize, Deserialize)]
struct TriggerDocument {
    #[serde(rename = "Triggers")]
    triggers: Vec<TriggerEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TriggerEntry {
    debug_name: String,
    #[serde(default)]
    actions: Vec<ActionEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ActionEntry {
    #[serde(rename = "Type")]
    action_type: String,
    #[serde(default)]
    target: u64,
    #[serde(default = "default_context")]
    context: String,
}

fn default_context() -> String {
    "GameObject".to_string()
}

impl From<&TriggerAction> for ActionEntry {
    fn from(action: &TriggerAction) -> Self {
        Self {
            action_type: action.action_type.as_str().to_string(),
            target: action.target,
            context: action.context.as_str().to_string(),
        }
    }
}

impl TryFrom<&ActionEntry> for TriggerAction {
    type Error = CommandError;

    fn try_from(entry: &ActionEntry) -> Result<Self, Self::Error> {
        Ok(TriggerAction::new(
            entry.action_type.parse()?,
            entry.target,
            entry.context.parse()?,
        ))
    }
}

fn parse_entry(index: usize, value: serde_yaml::Value) -> CommandResult<TriggerEntry> {
    serde_yaml::from_value(value).map_err(|e| CommandError::MalformedEntry {
        index,
        reason: e.to_string(),
    })
}

fn entry_to_trigger(index: usize, entry: &TriggerEntry) -> CommandResult<TriggerCommand> {
    let actions = entry
        .actions
        .iter()
        .map(TriggerAction::try_from)
        .collect::<CommandResult<Vec<_>>>()
        .map_err(|e| CommandError::MalformedEntry {
            index,
            reason: e.to_string(),
        })?;
    Ok(TriggerCommand {
        debug_name: entry.debug_name.clone(),
        actions,
    })
}

impl CommandRegistry {
    /// Serialize every trigger, in insertion order
    pub fn to_yaml(&self) -> CommandResult<String> {
        let document = TriggerDocument {
            triggers: self
                .triggers()
                .iter()
                .map(|trigger| TriggerEntry {
                    debug_name: trigger.debug_name.clone(),
                    actions: trigger.actions.iter().map(ActionEntry::from).collect(),
                })
                .collect(),
        };
        Ok(serde_yaml::to_string(&document)?)
    }

    /// Merge the triggers of a YAML document into the registry
    ///
    /// Returns how many triggers were loaded. Entries with an empty
    /// `DebugName` are skipped.
    pub fn load_yaml(&self, yaml: &str) -> CommandResult<usize> {
        let root: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(|e| {
            log::error!("Command document is not valid YAML: {}", e);
            CommandError::Parse(e)
        })?;

        let Some(entries) = root.get("Triggers").and_then(|t| t.as_sequence()).cloned() else {
            log::error!("Command document is corrupted: no 'Triggers' sequence");
            return Err(CommandError::MissingTriggers);
        };

        let mut loaded = 0;
        let mut failure = None;
        for (index, value) in entries.into_iter().enumerate() {
            let trigger = parse_entry(index, value).and_then(|entry| entry_to_trigger(index, &entry));
            match trigger {
                Ok(trigger) if trigger.debug_name.is_empty() => {
                    log::warn!("Skipping trigger entry {} with an empty DebugName", index);
                }
                Ok(trigger) => {
                    self.insert_trigger_silent(trigger);
                    loaded += 1;
                }
                Err(e) => {
                    log::error!("Stopped loading command document: {}", e);
                    failure = Some(e);
                    break;
                }
            }
        }

        if loaded > 0 {
            self.notify_changed();
        }
        match failure {
            Some(e) => Err(e),
            None => {
                log::info!("Loaded {} trigger commands", loaded);
                Ok(loaded)
            }
        }
    }

    /// Write the triggers to a YAML file, creating parent directories
    pub fn save(&self, path: &Path) -> CommandResult<()> {
        let io_error = |source| CommandError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml).map_err(io_error)?;
        log::info!("Saved command registry to {:?}", path);
        Ok(())
    }

    /// Merge the triggers of a YAML file into the registry
    pub fn load(&self, path: &Path) -> CommandResult<usize> {
        let yaml = std::fs::read_to_string(path).map_err(|source| CommandError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_yaml(&yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ActionContext, ActionType, CommandId, CommandType};

    fn populated() -> CommandRegistry {
        let registry = CommandRegistry::new();
        registry.insert_trigger(
            TriggerCommand::new("ExplosionTrigger")
                .with_action(TriggerAction::play(1001))
                .with_action(TriggerAction::play(1002)),
        );
        registry.insert_trigger(
            TriggerCommand::new("Silence")
                .with_action(TriggerAction::new(ActionType::StopAll, 0, ActionContext::Global))
                .with_action(TriggerAction::new(ActionType::Seek, 1001, ActionContext::GameObject)),
        );
        registry.insert_trigger(TriggerCommand::new("Alarm").with_action(TriggerAction::new(
            ActionType::PostTrigger,
            CommandId::from_name("Silence").0 as u64,
            ActionContext::GameObject,
        )));
        registry
    }

    #[test]
    fn test_yaml_roundtrip_preserves_ids_and_order() {
        let original = populated();
        let yaml = original.to_yaml().unwrap();

        let reloaded = CommandRegistry::new();
        assert_eq!(reloaded.load_yaml(&yaml).unwrap(), 3);

        assert_eq!(
            original.commands(CommandType::Trigger),
            reloaded.commands(CommandType::Trigger)
        );
        assert_eq!(original.triggers(), reloaded.triggers());
    }

    #[test]
    fn test_document_format() {
        let yaml = populated().to_yaml().unwrap();
        assert!(yaml.starts_with("Triggers:"));
        assert!(yaml.contains("DebugName: ExplosionTrigger"));
        assert!(yaml.contains("Type: StopAll"));
        assert!(yaml.contains("Context: Global"));
        assert!(yaml.contains("Target: 1001"));
    }

    #[test]
    fn test_missing_triggers_is_corruption() {
        let registry = populated();
        let result = registry.load_yaml("Commands: []\n");
        assert!(matches!(result, Err(CommandError::MissingTriggers)));
        assert_eq!(registry.count(CommandType::Trigger), 3);
    }

    #[test]
    fn test_partial_load_keeps_parsed_entries() {
        let yaml = r#"
Triggers:
  - DebugName: First
    Actions:
      - Type: Play
        Target: 1
        Context: GameObject
  - DebugName: Broken
    Actions:
      - Type: Explode
        Target: 2
        Context: GameObject
  - DebugName: Never
    Actions: []
"#;
        let registry = CommandRegistry::new();
        let result = registry.load_yaml(yaml);

        assert!(matches!(result, Err(CommandError::MalformedEntry { index: 1, .. })));
        assert!(registry.does_command_exist(CommandType::Trigger, CommandId::from_name("First")));
        assert!(!registry.does_command_exist(CommandType::Trigger, CommandId::from_name("Never")));
    }

    #[test]
    fn test_empty_debug_name_skipped() {
        let yaml = "Triggers:\n  - DebugName: ''\n    Actions: []\n  - DebugName: Kept\n";
        let registry = CommandRegistry::new();
        assert_eq!(registry.load_yaml(yaml).unwrap(), 1);
        assert_eq!(registry.count(CommandType::Trigger), 1);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio").join("commands.yaml");

        populated().save(&path).unwrap();
        let reloaded = CommandRegistry::new();
        assert_eq!(reloaded.load(&path).unwrap(), 3);
        assert_eq!(reloaded.triggers(), populated().triggers());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let registry = CommandRegistry::new();
        let result = registry.load(Path::new("/nonexistent/commands.yaml"));
        assert!(matches!(result, Err(CommandError::Io { .. })));
    }
}
