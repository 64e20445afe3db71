//! Trigger actions

use std::str::FromStr;

use super::error::CommandError;
use crate::types::AssetHandle;

/// What an action does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    Play,
    Stop,
    StopAll,
    Pause,
    PauseAll,
    Resume,
    ResumeAll,
    /// Let a looping voice finish its current pass
    Break,
    /// Rewind to the start of the stream
    Seek,
    SeekAll,
    /// Post another trigger (target holds its CommandID)
    PostTrigger,
}

impl ActionType {
    pub const ALL: [ActionType; 11] = [
        ActionType::Play,
        ActionType::Stop,
        ActionType::StopAll,
        ActionType::Pause,
        ActionType::PauseAll,
        ActionType::Resume,
        ActionType::ResumeAll,
        ActionType::Break,
        ActionType::Seek,
        ActionType::SeekAll,
        ActionType::PostTrigger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Play => "Play",
            ActionType::Stop => "Stop",
            ActionType::StopAll => "StopAll",
            ActionType::Pause => "Pause",
            ActionType::PauseAll => "PauseAll",
            ActionType::Resume => "Resume",
            ActionType::ResumeAll => "ResumeAll",
            ActionType::Break => "Break",
            ActionType::Seek => "Seek",
            ActionType::SeekAll => "SeekAll",
            ActionType::PostTrigger => "PostTrigger",
        }
    }

    /// Only meaningful on the invoking object; tooling locks the context
    pub fn is_object_only(&self) -> bool {
        matches!(self, ActionType::Play | ActionType::PostTrigger)
    }

    /// The `…All` variants ignore the action target
    pub fn targets_all(&self) -> bool {
        matches!(
            self,
            ActionType::StopAll | ActionType::PauseAll | ActionType::ResumeAll | ActionType::SeekAll
        )
    }
}

impl FromStr for ActionType {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CommandError::UnknownActionType(s.to_string()))
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which voices an action reaches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ActionContext {
    /// Only the invoking object's voices
    #[default]
    GameObject,
    /// Every active voice in the pool
    Global,
}

impl ActionContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionContext::GameObject => "GameObject",
            ActionContext::Global => "Global",
        }
    }
}

impl FromStr for ActionContext {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GameObject" => Ok(ActionContext::GameObject),
            "Global" => Ok(ActionContext::Global),
            other => Err(CommandError::UnknownActionContext(other.to_string())),
        }
    }
}

impl std::fmt::Display for ActionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerAction {
    pub action_type: ActionType,
    /// Sound config handle, or a CommandID for `PostTrigger`; 0 = none
    pub target: AssetHandle,
    pub context: ActionContext,
    /// Set by tooling once the action has been reviewed
    pub handled: bool,
}

impl TriggerAction {
    pub fn new(action_type: ActionType, target: AssetHandle, context: ActionContext) -> Self {
        Self {
            action_type,
            target,
            context,
            handled: false,
        }
    }

    /// `Play` of `target` on the invoking object
    pub fn play(target: AssetHandle) -> Self {
        Self::new(ActionType::Play, target, ActionContext::GameObject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_strings_roundtrip() {
        for action in ActionType::ALL {
            assert_eq!(action.as_str().parse::<ActionType>().unwrap(), action);
        }
        assert!("Explode".parse::<ActionType>().is_err());
    }

    #[test]
    fn test_context_strings() {
        assert_eq!("Global".parse::<ActionContext>().unwrap(), ActionContext::Global);
        assert_eq!(ActionContext::GameObject.to_string(), "GameObject");
        assert!("Local".parse::<ActionContext>().is_err());
    }

    #[test]
    fn test_object_only_actions() {
        assert!(ActionType::Play.is_object_only());
        assert!(ActionType::PostTrigger.is_object_only());
        assert!(!ActionType::StopAll.is_object_only());
    }
}
