//! Standard locations for NotRed audio files

use std::path::PathBuf;

/// Directory holding NotRed configuration
///
/// Returns: `~/.config/notred` (platform config dir), or `./notred` when the
/// platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notred")
}

/// Engine config file: `~/.config/notred/audio.yaml`
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("audio.yaml")
}

/// Persisted trigger commands: `~/.config/notred/commands.yaml`
pub fn default_command_registry_path() -> PathBuf {
    default_config_dir().join("commands.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_layout() {
        let path = default_config_path();
        assert!(path.ends_with("notred/audio.yaml"));
        assert!(default_command_registry_path().ends_with("notred/commands.yaml"));
    }
}
