//! Audio backend error types

use thiserror::Error;

/// Errors that can occur while opening or running an output stream
#[derive(Error, Debug)]
pub enum AudioError {
    /// No default output device on the host
    #[error("Failed to get default audio device: {0}")]
    NoDefaultDevice(String),

    /// Failed to query or match a device configuration
    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    /// Device cannot run at the engine's sample rate
    #[error("Device does not support {0}Hz output")]
    UnsupportedSampleRate(u32),

    /// Failed to build audio stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    /// Failed to start/play stream
    #[error("Failed to start audio stream: {0}")]
    StreamPlayError(String),
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AudioError::UnsupportedSampleRate(96000).to_string(),
            "Device does not support 96000Hz output"
        );
        assert_eq!(
            AudioError::StreamPlayError("busy".into()).to_string(),
            "Failed to start audio stream: busy"
        );
    }
}
