//! Error types for the sound radar core

use thiserror::Error;

/// Main error type for the crate
///
/// Only stream-open failures and fatal configuration violations ever reach
/// this type from a running capture loop; transient read errors are absorbed
/// and logged by the loop itself.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Capture thread error: {0}")]
    Thread(String),
}

/// Audio stream errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    #[error("Stream unavailable: {0}")]
    Unavailable(String),

    #[error("Device disconnected: {0}")]
    Disconnected(String),

    #[error("Input overrun: {dropped} samples dropped")]
    Overrun { dropped: usize },

    #[error("Read timed out")]
    Timeout,

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

impl StreamError {
    /// Whether a running capture loop should recover from this error
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StreamError::Disconnected(_)
                | StreamError::Overrun { .. }
                | StreamError::Timeout
                | StreamError::Read(_)
        )
    }

    /// Whether the stream handle must be dropped and reopened
    pub fn requires_reopen(&self) -> bool {
        matches!(self, StreamError::Disconnected(_))
    }
}

/// Configuration and precondition errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unsupported channel count: {0} (expected 2, 6 or 8)")]
    UnsupportedChannelCount(u16),

    #[error("Frame of {len} samples is not aligned to {channels} channels")]
    MisalignedFrame { len: usize, channels: u16 },

    #[error("Frame has {actual} channels, layout expects {expected}")]
    ChannelMismatch { expected: u16, actual: u16 },

    #[error("Invalid sensitivity: {0}")]
    InvalidSensitivity(String),

    #[error("Invalid display geometry: {0}")]
    InvalidDisplay(String),

    #[error("Invalid stream settings: {0}")]
    InvalidStream(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StreamError::Timeout.is_transient());
        assert!(StreamError::Overrun { dropped: 12 }.is_transient());
        assert!(StreamError::Read("glitch".into()).is_transient());
        assert!(StreamError::Disconnected("unplugged".into()).is_transient());
        assert!(!StreamError::Unavailable("missing".into()).is_transient());
        assert!(!StreamError::UnsupportedFormat("u8".into()).is_transient());
    }

    #[test]
    fn test_only_disconnect_requires_reopen() {
        assert!(StreamError::Disconnected("gone".into()).requires_reopen());
        assert!(!StreamError::Read("glitch".into()).requires_reopen());
        assert!(!StreamError::Timeout.requires_reopen());
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = ConfigError::UnsupportedChannelCount(3).into();
        assert!(matches!(err, Error::Config(ConfigError::UnsupportedChannelCount(3))));
        assert!(err.to_string().contains("Unsupported channel count: 3"));
    }
}
