//! Declarative command/trigger system
//!
//! Commands are addressed by a [`CommandId`], the 32-bit hash of a stable
//! name. Four independent registries hold the four command kinds; only
//! triggers carry behavior (an ordered list of [`TriggerAction`]s), the other
//! kinds are inert extension points.
//!
//! Triggers persist to YAML:
//! ```yaml
//! Triggers:
//!   - DebugName: ExplosionTrigger
//!     Actions:
//!       - Type: Play
//!         Target: 1001
//!         Context: GameObject
//! ```

pub mod action;
pub mod error;
pub mod ordered;
pub mod persist;
pub mod registry;

pub use action::{ActionContext, ActionType, TriggerAction};
pub use error::{CommandError, CommandResult};
pub use registry::{CommandRegistry, NamedCommand, TriggerCommand};

use xxhash_rust::xxh32::xxh32;

/// Seed for command name hashing; changing it invalidates persisted IDs
const COMMAND_ID_SEED: u32 = 0;

/// Hash of a command's stable name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub u32);

impl CommandId {
    /// Hash a name into its ID
    pub fn from_name(name: &str) -> Self {
        Self(xxh32(name.as_bytes(), COMMAND_ID_SEED))
    }

    /// The ID of the empty name, used as "no command"
    pub fn invalid() -> Self {
        Self::from_name("")
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::invalid()
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::invalid()
    }
}

impl From<&str> for CommandId {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// The four command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    Trigger,
    Switch,
    State,
    Parameter,
}

impl CommandType {
    pub const ALL: [CommandType; 4] = [
        CommandType::Trigger,
        CommandType::Switch,
        CommandType::State,
        CommandType::Parameter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Trigger => "Trigger",
            CommandType::Switch => "Switch",
            CommandType::State => "State",
            CommandType::Parameter => "Parameter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_id_is_stable() {
        assert_eq!(CommandId::from_name("Explosion"), CommandId::from_name("Explosion"));
        assert_ne!(CommandId::from_name("Explosion"), CommandId::from_name("explosion"));
        assert_eq!(CommandId::from("Jump"), CommandId::from_name("Jump"));
    }

    #[test]
    fn test_invalid_id() {
        assert!(!CommandId::default().is_valid());
        assert!(CommandId::from_name("Anything").is_valid());
    }
}
